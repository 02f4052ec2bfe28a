#![allow(dead_code)]

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use lyricsync::{
    providers::{FetchRequest, LyricsProviderClient},
    types::{FetchMode, Provider},
};

pub fn synced_lyrics() -> String {
    let mut text = String::from("[ar: Muse]\n[ti: Dead Inside]\n");
    for i in 0..8 {
        text.push_str(&format!("[00:{:02}.00] Revenge is sweet line number {}\n", i * 5, i));
    }
    text
}

pub fn plain_lyrics() -> String {
    (0..8)
        .map(|i| format!("Revenge is sweet line number {}\n", i))
        .collect()
}

/// Creates an empty media file (and its folders) below `root`.
pub fn add_track(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, b"not really audio").unwrap();
    path
}

pub fn write(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
}

/// Moves the modification time of `path` into the future so a cache sees
/// a change even on filesystems with coarse timestamps.
pub fn bump_mtime(path: &Path, secs: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(secs))
        .unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub query: String,
    pub provider: Provider,
    pub mode: FetchMode,
    pub output: PathBuf,
    pub lang: Option<String>,
}

type Script = dyn Fn(&FetchRequest<'_>) -> Option<String> + Send + Sync;

/// A provider client that answers from a script and records every call.
///
/// `Some(body)` writes `body` to the requested output, `None` writes nothing.
pub struct FakeClient {
    script: Box<Script>,
    calls: Mutex<Vec<Call>>,
}

impl FakeClient {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&FetchRequest<'_>) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn providers(&self) -> Vec<Provider> {
        self.calls().into_iter().map(|c| c.provider).collect()
    }
}

#[async_trait]
impl LyricsProviderClient for FakeClient {
    async fn fetch(&self, request: &FetchRequest<'_>) -> lyricsync::error::Result<bool> {
        self.calls.lock().unwrap().push(Call {
            query: request.query.to_string(),
            provider: request.provider,
            mode: request.mode,
            output: request.output.to_path_buf(),
            lang: request.lang.map(str::to_string),
        });

        let _ = fs::remove_file(request.output);
        match (self.script)(request) {
            Some(body) => {
                fs::write(request.output, body)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
