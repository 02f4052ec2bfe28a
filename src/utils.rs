use std::{
    collections::HashSet,
    ffi::OsString,
    path::{Component, Path, PathBuf},
};

use chrono::{DateTime, Local};

pub const MEDIA_EXTENSIONS: [&str; 6] = ["mp3", "flac", "m4a", "ogg", "opus", "wav"];
pub const LYRIC_EXTENSION: &str = "lrc";
pub const PLAIN_EXTENSION: &str = "txt";

fn has_extension(path: &Path, wanted: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| wanted.iter().any(|w| e.eq_ignore_ascii_case(w)))
        .unwrap_or(false)
}

pub fn is_media_file(path: &Path) -> bool {
    has_extension(path, &MEDIA_EXTENSIONS)
}

pub fn is_lyric_file(path: &Path) -> bool {
    has_extension(path, &[LYRIC_EXTENSION, PLAIN_EXTENSION])
}

pub fn lyric_path(media: &Path) -> PathBuf {
    media.with_extension(LYRIC_EXTENSION)
}

pub fn plain_path(media: &Path) -> PathBuf {
    media.with_extension(PLAIN_EXTENSION)
}

/// Scratch file used while trying to replace plain lyrics with a synced version.
pub fn temp_lyric_path(media: &Path) -> PathBuf {
    let mut name: OsString = lyric_path(media).into_os_string();
    name.push(".temp");
    PathBuf::from(name)
}

/// Cleans a file stem into a searchable title.
///
/// A leading track number ("03 Song") is dropped, underscores become spaces,
/// `! ? : ;` are removed, apostrophe variants collapse to `'` and runs of
/// whitespace collapse to a single space.
pub fn normalize_title(stem: &str) -> String {
    let mut title = stem;
    if let Some((first, rest)) = stem.split_once(' ')
        && !first.is_empty()
        && first.chars().all(|c| c.is_ascii_digit())
    {
        title = rest;
    }

    let cleaned: String = title
        .chars()
        .filter_map(|c| match c {
            '_' => Some(' '),
            '\u{2018}' | '\u{2019}' | '\u{02bc}' | '`' | '\u{00b4}' => Some('\''),
            '!' | '?' | ':' | ';' => None,
            other => Some(other),
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn components_below_root(path: &Path, root: Option<&Path>) -> Vec<String> {
    let Some(root) = root else {
        return Vec::new();
    };
    if root.as_os_str().is_empty() {
        return Vec::new();
    }
    let Ok(rel) = path.strip_prefix(root) else {
        return Vec::new();
    };

    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// The first folder below the library root is the artist.
pub fn infer_artist(path: &Path, root: Option<&Path>) -> String {
    let parts = components_below_root(path, root);
    if parts.len() >= 2 {
        parts[0].clone()
    } else {
        String::new()
    }
}

pub fn infer_album(path: &Path, root: Option<&Path>) -> String {
    let parts = components_below_root(path, root);
    if parts.len() >= 3 {
        parts[1].clone()
    } else {
        String::new()
    }
}

pub fn build_query(title: &str, artist: &str) -> String {
    format!("{} {}", title, artist).trim().to_string()
}

/// Starting point offered for a manual search: "Artist: Album - Title".
pub fn default_custom_query(media: &Path, root: Option<&Path>) -> String {
    let title = media
        .file_stem()
        .map(|s| normalize_title(&s.to_string_lossy()))
        .unwrap_or_default();
    let artist = infer_artist(media, root);
    let album = infer_album(media, root);

    let query = if album.is_empty() {
        format!("{}: {}", artist, title)
    } else {
        format!("{}: {} - {}", artist, album, title)
    };

    query.trim_start_matches(": ").trim().to_string()
}

/// Drops repeated " - "-separated segments that start with the artist name,
/// keeping only the first one.
pub fn dedup_artist(query: &str, artist: &str) -> String {
    let artist_lower = artist.trim().to_lowercase();
    if artist_lower.is_empty() {
        return query.to_string();
    }

    let mut artist_seen = false;
    let mut cleaned: Vec<&str> = Vec::new();

    for part in query.split(" - ") {
        let part = part.trim();
        let part_lower = part.to_lowercase();
        let is_artist_variant = part_lower
            .strip_prefix(&artist_lower)
            .map(|after| after.is_empty() || after.starts_with([' ', ':', ',']))
            .unwrap_or(false);

        if is_artist_variant {
            if artist_seen {
                continue;
            }
            artist_seen = true;
        }
        cleaned.push(part);
    }

    cleaned.join(" - ")
}

/// Keeps letters, digits, whitespace, hyphens and colons.
pub fn strip_punctuation(query: &str) -> String {
    let kept: String = query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == ':')
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn remove_duplicate_strings(items: &mut Vec<String>) {
    let mut seen = HashSet::new();
    items.retain(|item| !item.is_empty() && seen.insert(item.clone()));
}

pub fn format_mtime(nanos: u128) -> String {
    if nanos == 0 {
        return "-".to_string();
    }

    let secs = (nanos / 1_000_000_000) as i64;
    match DateTime::from_timestamp(secs, 0) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "-".to_string(),
    }
}
