use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

use crate::{
    error::Result,
    lyrics::{classify_file, is_metadata_line},
    types::LyricState,
    utils,
};

static CJK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\u{3040}-\u{30ff}\u{3400}-\u{4dbf}\u{4e00}-\u{9fff}\u{ac00}-\u{d7af}]").unwrap()
});

pub const DEFAULT_REJECT_RATIO: f64 = 0.15;
pub const MIN_REJECT_RATIO: f64 = 0.05;
pub const MAX_REJECT_RATIO: f64 = 0.50;

pub fn clamp_reject_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        return DEFAULT_REJECT_RATIO;
    }
    ratio.clamp(MIN_REJECT_RATIO, MAX_REJECT_RATIO)
}

/// Returns the text with CJK lyric lines removed, or `None` when nothing matched.
///
/// Metadata header lines are always kept. For timestamped lines only the text
/// after the last `]` is inspected.
pub fn strip_cjk_text(text: &str) -> Option<String> {
    let mut changed = false;
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| {
            if is_metadata_line(line) {
                return true;
            }
            let lyric = match line.rsplit_once(']') {
                Some((_, after)) => after.trim(),
                None => line.trim(),
            };
            if !lyric.is_empty() && CJK_RE.is_match(lyric) {
                changed = true;
                return false;
            }
            true
        })
        .collect();

    if !changed {
        return None;
    }
    Some(format!("{}\n", kept.join("\n").trim()))
}

pub fn non_ascii_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let non_ascii = text.chars().filter(|c| (*c as u32) > 127).count();
    non_ascii as f64 / total as f64
}

/// Rewrites the file without CJK lines. Returns whether anything was removed.
pub async fn strip_cjk_lines(path: &Path) -> Result<bool> {
    let bytes = async_fs::read(path).await?;
    match strip_cjk_text(&String::from_utf8_lossy(&bytes)) {
        Some(stripped) => {
            async_fs::write(path, stripped).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Deletes the file when its share of non-ASCII characters exceeds `threshold`.
pub async fn reject_if_mostly_non_ascii(path: &Path, threshold: f64) -> Result<bool> {
    let bytes = async_fs::read(path).await?;
    let ratio = non_ascii_ratio(&String::from_utf8_lossy(&bytes));
    if ratio > threshold {
        remove_if_exists(path).await?;
        return Ok(true);
    }
    Ok(false)
}

/// Moves plain lyrics from `.lrc` to `.txt`, replacing any existing `.txt`.
/// Returns the path the lyrics live at afterwards.
pub async fn rename_plain(lrc_path: &Path) -> Result<PathBuf> {
    if classify_file(lrc_path).await != LyricState::Plain {
        return Ok(lrc_path.to_path_buf());
    }

    let txt_path = utils::plain_path(lrc_path);
    remove_if_exists(&txt_path).await?;
    async_fs::rename(lrc_path, &txt_path).await?;
    Ok(txt_path)
}

pub async fn remove_if_exists(path: &Path) -> Result<()> {
    match async_fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validators {
    pub strip_cjk: bool,
    /// Rejection threshold; `None` disables the check.
    pub reject_ratio: Option<f64>,
    pub rename_plain: bool,
}

impl Default for Validators {
    fn default() -> Self {
        Self {
            strip_cjk: true,
            reject_ratio: Some(DEFAULT_REJECT_RATIO),
            rename_plain: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub stripped: bool,
    pub rejected: bool,
    pub path: PathBuf,
}

impl Validators {
    /// Runs strip, then reject, then rename on a freshly saved file.
    /// Rejection sees the stripped content; a rejected file is never renamed.
    pub async fn run(&self, path: &Path) -> Result<Validation> {
        let stripped = if self.strip_cjk {
            strip_cjk_lines(path).await?
        } else {
            false
        };

        if let Some(ratio) = self.reject_ratio
            && reject_if_mostly_non_ascii(path, clamp_reject_ratio(ratio)).await?
        {
            return Ok(Validation {
                stripped,
                rejected: true,
                path: path.to_path_buf(),
            });
        }

        let path = if self.rename_plain {
            rename_plain(path).await?
        } else {
            path.to_path_buf()
        };

        Ok(Validation {
            stripped,
            rejected: false,
            path,
        })
    }
}
