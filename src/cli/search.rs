use std::path::PathBuf;

use crate::{
    cli::session::{Overrides, Session},
    error,
    fetch::BatchRequest,
    info, utils,
};

pub struct SearchOptions {
    pub query: Option<String>,
    pub dedup_artist: bool,
    pub strip_punctuation: bool,
}

/// Searches lyrics for one track with a hand-written query.
///
/// Existing synced lyrics of the track are replaced.
pub async fn search(track: PathBuf, options: SearchOptions, overrides: Overrides) {
    let mut session = Session::open(&overrides).await;

    if !track.is_file() || !utils::is_media_file(&track) {
        error!("Not a media file: {}", track.display());
    }

    let root = session.index.root().map(|r| r.to_path_buf());
    let mut query = options
        .query
        .unwrap_or_else(|| utils::default_custom_query(&track, root.as_deref()));
    if options.dedup_artist {
        let artist = utils::infer_artist(&track, root.as_deref());
        query = utils::dedup_artist(&query, &artist);
    }
    if options.strip_punctuation {
        query = utils::strip_punctuation(&query);
    }

    if query.trim().is_empty() {
        error!("Search query is empty.");
    }

    info!("Searching with query: {}", query);
    let request = BatchRequest::custom(track, query, session.options());
    session.run(request).await;
}
