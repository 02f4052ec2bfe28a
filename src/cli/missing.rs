use std::path::PathBuf;

use tabled::Table;

use crate::{
    cli::session::{Overrides, Session},
    error,
    fetch::BatchRequest,
    info,
    library::{MissingSet, Selection},
    management::{STATE_TYPE_MISSING, StateManager},
    success,
    types::{LyricFileTableRow, LyricState},
    warning,
};

/// Finds tracks without any lyric file and remembers them for
/// `missing download`. An empty selection scans the whole library.
pub async fn missing_scan(selection: Selection, overrides: Overrides) {
    let mut session = Session::open(&overrides).await;

    let selection = if selection.is_empty() {
        match session.index.list_artists() {
            Ok(artists) => Selection {
                artists,
                ..Selection::default()
            },
            Err(e) => error!("Cannot list library. Err: {}", e),
        }
    } else {
        selection
    };

    let missing = match MissingSet::scan(&session.index, &selection) {
        Ok(m) => m,
        Err(e) => error!("Cannot scan for missing lyrics. Err: {}", e),
    };
    session.save_scanned().await;

    let mut state = StateManager::new(STATE_TYPE_MISSING);
    state.replace(missing.to_strings());
    if let Err(e) = state.persist().await {
        error!("Failed to persist missing tracks. Err: {}", e);
    }

    if missing.is_empty() {
        success!("Every selected track has lyrics.");
        return;
    }

    let root = session.index.root().map(|r| r.to_path_buf());
    let rows: Vec<LyricFileTableRow> = missing
        .targets()
        .iter()
        .map(|media| LyricFileTableRow {
            state: LyricState::None.icon().to_string(),
            path: match &root {
                Some(root) => media
                    .strip_prefix(root)
                    .unwrap_or(media.as_path())
                    .display()
                    .to_string(),
                None => media.display().to_string(),
            },
        })
        .collect();

    println!("{}", Table::new(rows));
    info!(
        "{} tracks without lyrics. Run `lyricsync missing download` to fetch them.",
        missing.len()
    );
}

/// Downloads lyrics for the tracks found by the last `missing scan`.
/// Tracks still without lyrics afterwards stay in the list.
pub async fn missing_download(overrides: Overrides) {
    let mut state = StateManager::new(STATE_TYPE_MISSING);
    if let Err(e) = state.load().await {
        error!("Cannot load missing tracks. Err: {}", e);
    }

    let missing = MissingSet::restore(state.get_state().iter().map(PathBuf::from));
    if missing.is_empty() {
        warning!("No missing tracks recorded. Run `lyricsync missing scan` first.");
        if let Err(e) = state.clear().await {
            warning!("Failed to clear missing tracks. Err: {}", e);
        }
        return;
    }

    let mut session = Session::open(&overrides).await;
    info!("Downloading lyrics for {} tracks", missing.len());
    let request = BatchRequest::new(missing.into_targets(), session.options());
    session.run(request).await;

    let remaining = MissingSet::restore(state.get_state().iter().map(PathBuf::from));
    let result = if remaining.is_empty() {
        state.clear().await
    } else {
        state.replace(remaining.to_strings());
        state.persist().await
    };
    if let Err(e) = result {
        warning!("Failed to update missing tracks. Err: {}", e);
    }
}

pub async fn missing_clear() {
    let mut state = StateManager::new(STATE_TYPE_MISSING);
    match state.clear().await {
        Ok(()) => success!("Cleared missing tracks."),
        Err(e) => error!("Failed to clear missing tracks. Err: {}", e),
    }
}
