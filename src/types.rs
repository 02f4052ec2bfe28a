use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::utils;

/// Quality of a lyric file as judged by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LyricState {
    None,
    Incomplete,
    Plain,
    Synced,
}

impl LyricState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LyricState::None => "none",
            LyricState::Incomplete => "incomplete",
            LyricState::Plain => "plain",
            LyricState::Synced => "synced",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            LyricState::Synced => "✅",
            LyricState::Plain => "📄",
            LyricState::Incomplete => "⚠️",
            LyricState::None => "❌",
        }
    }
}

impl fmt::Display for LyricState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lyric search backend understood by the external search tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Provider {
    Lrclib,
    Musixmatch,
    Megalobiz,
    NetEase,
    Genius,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::Lrclib,
        Provider::Musixmatch,
        Provider::Megalobiz,
        Provider::NetEase,
        Provider::Genius,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Lrclib => "Lrclib",
            Provider::Musixmatch => "Musixmatch",
            Provider::Megalobiz => "Megalobiz",
            Provider::NetEase => "NetEase",
            Provider::Genius => "Genius",
        }
    }

    /// Genius only ever returns plain text, so it never takes part in a synced pass.
    pub fn is_plain_only(&self) -> bool {
        matches!(self, Provider::Genius)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown provider '{}'", wanted))
    }
}

/// Which kind of transcript a provider attempt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    Synced,
    Plain,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Synced => f.write_str("synced"),
            FetchMode::Plain => f.write_str("plain"),
        }
    }
}

/// What to do when a track already has plain lyrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradePolicy {
    /// Leave plain lyrics alone
    Off,
    /// Look for a synced version without asking
    Auto,
    /// Ask before looking for a synced version
    Ask,
}

impl FromStr for UpgradePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" | "false" | "no" => Ok(UpgradePolicy::Off),
            "auto" => Ok(UpgradePolicy::Auto),
            "ask" | "true" | "yes" => Ok(UpgradePolicy::Ask),
            other => Err(format!("unknown upgrade policy '{}'", other)),
        }
    }
}

/// Granularity of a completeness computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Artist,
    Album,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletenessResult {
    pub have: usize,
    pub total: usize,
}

impl CompletenessResult {
    pub fn completeness(&self) -> Completeness {
        if self.total == 0 || self.have == 0 {
            Completeness::None
        } else if self.have >= self.total {
            Completeness::Complete
        } else {
            Completeness::Partial
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    None,
    Partial,
    Complete,
}

impl Completeness {
    pub fn icon(&self) -> &'static str {
        match self {
            Completeness::None => "⬜",
            Completeness::Partial => "🟨",
            Completeness::Complete => "✅",
        }
    }
}

impl fmt::Display for Completeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completeness::None => f.write_str("none"),
            Completeness::Partial => f.write_str("partial"),
            Completeness::Complete => f.write_str("complete"),
        }
    }
}

/// A media file as discovered under the library root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
}

impl MediaFile {
    pub fn new(path: &Path, root: Option<&Path>) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path: path.to_path_buf(),
            title: utils::normalize_title(&stem),
            artist: utils::infer_artist(path, root),
        }
    }

    pub fn query(&self) -> String {
        utils::build_query(&self.title, &self.artist)
    }

    pub fn lyric_path(&self) -> PathBuf {
        utils::lyric_path(&self.path)
    }

    pub fn plain_path(&self) -> PathBuf {
        utils::plain_path(&self.path)
    }
}

#[derive(Tabled)]
pub struct FolderTableRow {
    pub status: String,
    pub name: String,
    pub lyrics: String,
    pub updated: String,
}

#[derive(Tabled)]
pub struct LyricFileTableRow {
    pub state: String,
    pub path: String,
}
