use crate::{
    cli::session::{Overrides, Session},
    error,
    fetch::BatchRequest,
    info,
    library::Selection,
    warning,
};

/// Downloads lyrics for the selected tracks.
///
/// Existing synced lyrics are kept, plain lyrics are upgraded according to
/// the upgrade policy and everything else is searched.
pub async fn download(selection: Selection, overrides: Overrides) {
    let mut session = Session::open(&overrides).await;

    if selection.is_empty() {
        warning!("Nothing selected. Pass paths or --artist/--album/--track.");
        return;
    }

    let targets = match selection.resolve(&session.index) {
        Ok(t) => t,
        Err(e) => error!("Cannot resolve selection. Err: {}", e),
    };

    if targets.is_empty() {
        warning!("No media files found for the selection.");
        return;
    }

    info!("Processing {} tracks", targets.len());
    let request = BatchRequest::new(targets, session.options());
    session.run(request).await;
}
