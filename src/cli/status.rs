use tabled::Table;

use crate::{
    cli::session::{Overrides, Session},
    error, info,
    library::Mtime,
    types::{CompletenessResult, FolderTableRow, Scope},
    utils, warning,
};

/// Shows lyric completeness per artist, or per album of one artist.
///
/// Without `--all` only artists touched by a scan or download are listed.
/// Asking for one artist scans it.
pub async fn status(artist: Option<String>, all: bool, overrides: Overrides) {
    let mut session = Session::open(&overrides).await;
    let root = match session.index.require_root() {
        Ok(r) => r.to_path_buf(),
        Err(e) => error!("{}", e),
    };

    if let Some(artist) = artist {
        let albums = match session.index.list_albums(&artist) {
            Ok(a) => a,
            Err(e) => error!("Cannot list albums of {}. Err: {}", artist, e),
        };

        let artist_dir = root.join(&artist);
        let mut rows: Vec<FolderTableRow> = albums
            .into_iter()
            .map(|album| {
                let entry = session
                    .index
                    .scan_folder_entry(&artist_dir.join(&album), Scope::Album);
                folder_row(album, entry.result, entry.newest)
            })
            .collect();

        let entry = session.index.scan_folder_entry(&artist_dir, Scope::Artist);
        rows.push(folder_row(
            format!("{} (all)", artist),
            entry.result,
            entry.newest,
        ));

        session.index.mark_scanned(&artist);
        session.save_scanned().await;
        println!("{}", Table::new(rows));
        return;
    }

    let artists = match session.index.list_artists() {
        Ok(a) => a,
        Err(e) => error!("Cannot list library. Err: {}", e),
    };

    let (shown, hidden): (Vec<String>, Vec<String>) = artists
        .into_iter()
        .partition(|a| all || session.index.is_scanned(a));

    if shown.is_empty() {
        warning!("No artist scanned yet. Run `lyricsync missing scan` or pass --all.");
        return;
    }

    let rows: Vec<FolderTableRow> = shown
        .into_iter()
        .map(|artist| {
            let entry = session
                .index
                .scan_folder_entry(&root.join(&artist), Scope::Artist);
            folder_row(artist, entry.result, entry.newest)
        })
        .collect();

    println!("{}", Table::new(rows));
    if !hidden.is_empty() {
        info!("{} artists not scanned yet, use --all to include them", hidden.len());
    }
}

fn folder_row(name: String, result: CompletenessResult, newest: Mtime) -> FolderTableRow {
    FolderTableRow {
        status: result.completeness().icon().to_string(),
        name,
        lyrics: format!("{}/{}", result.have, result.total),
        updated: utils::format_mtime(newest),
    }
}
