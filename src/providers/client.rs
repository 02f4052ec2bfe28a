use std::{path::Path, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::{
    error::{LyricsError, Result},
    lyrics::validate::remove_if_exists,
    types::{FetchMode, Provider},
};

/// Output files at or below this size are error pages or empty answers.
pub const MIN_ARTIFACT_BYTES: u64 = 50;

pub const DEFAULT_SYNCEDLYRICS_BIN: &str = "syncedlyrics";

#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub query: &'a str,
    pub provider: Provider,
    pub output: &'a Path,
    pub lang: Option<&'a str>,
    pub mode: FetchMode,
}

/// An external lyric search capability.
///
/// Implementations write the result to `request.output`, clearing any stale
/// file first, and must tolerate being called repeatedly with different
/// output paths. The returned flag is advisory: callers still check the file.
#[async_trait]
pub trait LyricsProviderClient: Send + Sync {
    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<bool>;
}

/// True when `path` exists and is large enough to be a real transcript.
pub async fn artifact_accepted(path: &Path) -> bool {
    match async_fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > MIN_ARTIFACT_BYTES,
        Err(_) => false,
    }
}

/// Runs the `syncedlyrics` command line tool.
#[derive(Debug, Clone)]
pub struct SyncedLyricsCli {
    program: String,
}

impl Default for SyncedLyricsCli {
    fn default() -> Self {
        Self::new(DEFAULT_SYNCEDLYRICS_BIN)
    }
}

impl SyncedLyricsCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, request: &FetchRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(request.query)
            .arg("-p")
            .arg(request.provider.as_str())
            .arg("-o")
            .arg(request.output);

        match request.mode {
            FetchMode::Synced => cmd.arg("--synced-only"),
            FetchMode::Plain => cmd.arg("--plain-only"),
        };

        if let Some(lang) = request.lang.filter(|l| !l.is_empty()) {
            cmd.arg("--lang").arg(lang);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl LyricsProviderClient for SyncedLyricsCli {
    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<bool> {
        remove_if_exists(request.output).await?;

        // exit status is ignored; the tool exits 0 even when nothing was found
        self.command(request).status().await.map_err(|e| {
            LyricsError::Provider(format!("cannot run {}: {}", self.program, e))
        })?;

        Ok(artifact_accepted(request.output).await)
    }
}
