//! Library scanning.
//!
//! The library root follows an artist-per-top-level-folder convention with
//! album folders below it. [`LibraryIndex`] owns the completeness cache and
//! the set of artists whose status may be shown; [`Selection`] and
//! [`MissingSet`] turn a user's pick into an ordered target list.

pub mod index;
mod selection;

pub use index::{CacheEntry, CacheKey, LibraryIndex, Mtime, media_files_under, newest_mtime};
pub use selection::{MissingSet, Selection, TargetList, has_lyric_artifact};
