use std::path::PathBuf;

use tabled::Table;

use crate::{lyrics::classify_file, types::LyricFileTableRow, utils, warning};

/// Prints the quality state of lyric files. Media files are resolved to
/// their `.lrc` sibling, falling back to `.txt`.
pub async fn classify(files: Vec<PathBuf>) {
    let mut rows: Vec<LyricFileTableRow> = Vec::new();

    for file in files {
        let path = if utils::is_media_file(&file) {
            let lrc = utils::lyric_path(&file);
            let txt = utils::plain_path(&file);
            if !lrc.is_file() && txt.is_file() { txt } else { lrc }
        } else {
            file
        };

        if !path.is_file() {
            warning!("No lyric file at {}", path.display());
        }

        let state = classify_file(&path).await;
        rows.push(LyricFileTableRow {
            state: format!("{} {}", state.icon(), state),
            path: path.display().to_string(),
        });
    }

    if !rows.is_empty() {
        println!("{}", Table::new(rows));
    }
}
