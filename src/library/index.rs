use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::UNIX_EPOCH,
};

use walkdir::WalkDir;

use crate::{
    error::{LyricsError, Result},
    types::{CompletenessResult, Scope},
    utils,
};

/// Nanoseconds since the Unix epoch.
pub type Mtime = u128;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheKey {
    pub folder: PathBuf,
    pub scope: Scope,
}

/// A completeness result together with the newest mtime it was computed at.
/// An entry whose mtime differs from the folder's current one is a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    pub newest: Mtime,
    pub result: CompletenessResult,
}

fn mtime_of(path: &Path) -> Option<Mtime> {
    let modified = path.metadata().ok()?.modified().ok()?;
    Some(modified.duration_since(UNIX_EPOCH).ok()?.as_nanos())
}

/// Newest modification time among media and lyric files below `folder`.
/// Empty or unreadable trees yield 0.
pub fn newest_mtime(folder: &Path) -> Mtime {
    WalkDir::new(folder)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| utils::is_media_file(e.path()) || utils::is_lyric_file(e.path()))
        .filter_map(|e| mtime_of(e.path()))
        .max()
        .unwrap_or(0)
}

/// Counts media files below `folder` and how many of them have a `.lrc` sibling.
pub fn count_completeness(folder: &Path) -> CompletenessResult {
    let mut result = CompletenessResult::default();
    for entry in WalkDir::new(folder).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || !utils::is_media_file(path) {
            continue;
        }
        result.total += 1;
        if utils::lyric_path(path).exists() {
            result.have += 1;
        }
    }
    result
}

/// Media files below `folder`, in a stable (sorted) walk order.
pub fn media_files_under(folder: &Path) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && utils::is_media_file(e.path()))
        .map(|e| e.into_path())
        .collect()
}

fn sorted_subfolders(folder: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(folder)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort_by_key(|name| name.to_lowercase());
    Ok(names)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scans the library tree and caches per-folder completeness.
///
/// Entries are replaced wholesale, so a reader racing an invalidation sees
/// either the old entry or a miss and recomputes.
pub struct LibraryIndex {
    root: Option<PathBuf>,
    cache: Mutex<BTreeMap<CacheKey, CacheEntry>>,
    scanned: Mutex<BTreeSet<String>>,
    computations: AtomicUsize,
}

impl LibraryIndex {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root: root.filter(|r| !r.as_os_str().is_empty()),
            cache: Mutex::new(BTreeMap::new()),
            scanned: Mutex::new(BTreeSet::new()),
            computations: AtomicUsize::new(0),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn require_root(&self) -> Result<&Path> {
        let root = self.root().ok_or(LyricsError::NoLibraryRoot)?;
        if !root.is_dir() {
            return Err(LyricsError::MissingLibraryRoot(root.to_path_buf()));
        }
        Ok(root)
    }

    pub fn artist_folder(&self, artist: &str) -> Option<PathBuf> {
        if artist.is_empty() {
            return None;
        }
        self.root().map(|root| root.join(artist))
    }

    pub fn newest_mtime(&self, folder: &Path) -> Mtime {
        newest_mtime(folder)
    }

    pub fn scan_folder(&self, folder: &Path, scope: Scope) -> CompletenessResult {
        self.scan_folder_entry(folder, scope).result
    }

    pub fn scan_folder_entry(&self, folder: &Path, scope: Scope) -> CacheEntry {
        let newest = newest_mtime(folder);
        let key = CacheKey {
            folder: folder.to_path_buf(),
            scope,
        };

        if let Some(entry) = lock(&self.cache).get(&key)
            && entry.newest == newest
        {
            return *entry;
        }

        let entry = CacheEntry {
            newest,
            result: count_completeness(folder),
        };
        self.computations.fetch_add(1, Ordering::Relaxed);
        lock(&self.cache).insert(key, entry);
        entry
    }

    /// Drops every cached entry for `prefix` and all folders nested below it.
    pub fn invalidate(&self, prefix: &Path) -> usize {
        let mut cache = lock(&self.cache);
        let start = CacheKey {
            folder: prefix.to_path_buf(),
            scope: Scope::Artist,
        };
        let doomed: Vec<CacheKey> = cache
            .range(start..)
            .take_while(|(key, _)| key.folder.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            cache.remove(key);
        }
        doomed.len()
    }

    pub fn invalidate_artist(&self, artist: &str) -> usize {
        match self.artist_folder(artist) {
            Some(folder) => self.invalidate(&folder),
            None => 0,
        }
    }

    pub fn cached(&self, folder: &Path, scope: Scope) -> Option<CacheEntry> {
        let key = CacheKey {
            folder: folder.to_path_buf(),
            scope,
        };
        lock(&self.cache).get(&key).copied()
    }

    /// Number of completeness walks performed (cache misses).
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    pub fn mark_scanned(&self, artist: &str) {
        if !artist.is_empty() {
            lock(&self.scanned).insert(artist.to_string());
        }
    }

    pub fn is_scanned(&self, artist: &str) -> bool {
        lock(&self.scanned).contains(artist)
    }

    pub fn scanned_artists(&self) -> Vec<String> {
        lock(&self.scanned).iter().cloned().collect()
    }

    pub fn restore_scanned<I>(&self, artists: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut scanned = lock(&self.scanned);
        scanned.extend(artists.into_iter().filter(|a| !a.is_empty()));
    }

    pub fn list_artists(&self) -> Result<Vec<String>> {
        sorted_subfolders(self.require_root()?)
    }

    pub fn list_albums(&self, artist: &str) -> Result<Vec<String>> {
        let root = self.require_root()?;
        sorted_subfolders(&root.join(artist))
    }
}
