use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LyricsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("A batch is already running")]
    BatchInProgress,

    #[error("No library folder configured. Set LYRICSYNC_MUSIC_DIR or pass --music-dir")]
    NoLibraryRoot,

    #[error("Library folder does not exist: {}", .0.display())]
    MissingLibraryRoot(PathBuf),

    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: String, reason: String },

    #[error("Provider call failed: {0}")]
    Provider(String),

    #[error("Batch worker stopped unexpectedly: {0}")]
    Worker(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LyricsError>;
