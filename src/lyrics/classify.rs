use std::{path::Path, sync::LazyLock};

use regex::Regex;

use crate::types::LyricState;

static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[\d{1,2}:\d{2}(?:\.\d{1,3})?\]").unwrap());

pub const METADATA_TAGS: [&str; 7] = [
    "[ar:", "[ti:", "[al:", "[by:", "[offset:", "[re:", "[ve:",
];

/// Fewer lyric lines than this means the file is truncated or an error page.
pub const MIN_LYRIC_LINES: usize = 6;
pub const MIN_TIMESTAMP_LINES: usize = 3;

pub fn is_metadata_line(line: &str) -> bool {
    let line = line.trim_start();
    METADATA_TAGS.iter().any(|tag| line.starts_with(tag))
}

pub fn has_timestamp(line: &str) -> bool {
    TIMESTAMP_RE.is_match(line)
}

/// Judges the quality of a lyric file's text; `None` input means no file.
pub fn classify(text: Option<&str>) -> LyricState {
    let Some(text) = text else {
        return LyricState::None;
    };

    let lyric_lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_metadata_line(line))
        .collect();

    if lyric_lines.len() < MIN_LYRIC_LINES {
        return LyricState::Incomplete;
    }

    let timestamped = lyric_lines.iter().filter(|l| has_timestamp(l)).count();
    if timestamped >= MIN_TIMESTAMP_LINES {
        LyricState::Synced
    } else {
        LyricState::Plain
    }
}

/// Reads and classifies a lyric file. Missing or unreadable files are `None`.
pub async fn classify_file(path: &Path) -> LyricState {
    match async_fs::read(path).await {
        Ok(bytes) => classify(Some(&String::from_utf8_lossy(&bytes))),
        Err(_) => LyricState::None,
    }
}
