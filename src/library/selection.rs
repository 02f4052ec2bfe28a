use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::{
    error::Result,
    library::{LibraryIndex, index::media_files_under},
    utils,
};

/// An ordered, de-duplicated list of media files to process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetList {
    paths: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl TargetList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path` unless it is already present. Returns whether it was added.
    pub fn push(&mut self, path: PathBuf) -> bool {
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.paths.push(path);
        true
    }

    pub fn extend<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for path in paths {
            self.push(path);
        }
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Path) -> bool,
    {
        let seen = &mut self.seen;
        self.paths.retain(|p| {
            let keep_it = keep(p.as_path());
            if !keep_it {
                seen.remove(p);
            }
            keep_it
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.paths
    }
}

impl FromIterator<PathBuf> for TargetList {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut list = TargetList::new();
        list.extend(iter);
        list
    }
}

/// What the user picked: artist folders, album folders of a single artist,
/// individual tracks, or arbitrary paths.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub artists: Vec<String>,
    pub albums: Vec<String>,
    pub tracks: Vec<PathBuf>,
    pub paths: Vec<PathBuf>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty() && self.tracks.is_empty() && self.paths.is_empty()
    }

    /// Expands the selection into media files below the library root.
    ///
    /// Several artists select everything they contain. With one artist, the
    /// tracks win over albums and albums win over the whole artist folder.
    pub fn resolve(&self, index: &LibraryIndex) -> Result<TargetList> {
        let mut targets = TargetList::new();

        for path in &self.paths {
            if path.is_dir() {
                targets.extend(media_files_under(path));
            } else if path.is_file() && utils::is_media_file(path) {
                targets.push(path.clone());
            }
        }

        if self.artists.is_empty() {
            for track in &self.tracks {
                if track.is_file() && utils::is_media_file(track) {
                    targets.push(track.clone());
                }
            }
            return Ok(targets);
        }

        let root = index.require_root()?;

        if self.artists.len() > 1 {
            for artist in &self.artists {
                targets.extend(media_files_under(&root.join(artist)));
            }
            return Ok(targets);
        }

        let artist_dir = root.join(&self.artists[0]);
        if !self.tracks.is_empty() {
            for track in &self.tracks {
                let path = resolve_track(&artist_dir, &self.albums, track);
                if path.is_file() && utils::is_media_file(&path) {
                    targets.push(path);
                }
            }
        } else if !self.albums.is_empty() {
            for album in &self.albums {
                targets.extend(media_files_under(&artist_dir.join(album)));
            }
        } else {
            targets.extend(media_files_under(&artist_dir));
        }

        Ok(targets)
    }
}

/// Tracks may be given as a full path, relative to the artist folder
/// ("Album/03 Song.mp3") or relative to the first selected album. A relative
/// path only falls back to the working directory when the library has no match.
fn resolve_track(artist_dir: &Path, albums: &[String], track: &Path) -> PathBuf {
    if track.is_absolute() {
        return track.to_path_buf();
    }

    let under_artist = artist_dir.join(track);
    if under_artist.is_file() {
        return under_artist;
    }

    if let Some(album) = albums.first() {
        let under_album = artist_dir.join(album).join(track);
        if under_album.is_file() {
            return under_album;
        }
    }

    track.to_path_buf()
}

/// A media file has a lyric artifact when a `.lrc` or `.txt` sibling exists.
pub fn has_lyric_artifact(media: &Path) -> bool {
    utils::lyric_path(media).exists() || utils::plain_path(media).exists()
}

/// Media files of a selection that have no lyric artifact yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingSet {
    targets: TargetList,
}

impl MissingSet {
    /// Walks the selection, keeps files without lyrics, and marks the
    /// touched artists as scanned with their cache entries purged.
    pub fn scan(index: &LibraryIndex, selection: &Selection) -> Result<Self> {
        let mut targets = selection.resolve(index)?;
        targets.retain(|media| !has_lyric_artifact(media));

        let mut artists: Vec<String> = selection.artists.clone();
        artists.extend(
            targets
                .iter()
                .map(|media| utils::infer_artist(media, index.root())),
        );
        utils::remove_duplicate_strings(&mut artists);

        for artist in &artists {
            index.mark_scanned(artist);
            index.invalidate_artist(artist);
        }

        Ok(Self { targets })
    }

    /// Rebuilds a previously computed set, dropping files that gained lyrics
    /// or disappeared in the meantime.
    pub fn restore<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut targets: TargetList = paths.into_iter().collect();
        targets.retain(|media| media.is_file() && !has_lyric_artifact(media));
        Self { targets }
    }

    pub fn targets(&self) -> &TargetList {
        &self.targets
    }

    pub fn into_targets(self) -> TargetList {
        self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.targets
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    }
}
