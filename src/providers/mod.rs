//! # Lyric Providers
//!
//! Lyric search itself is delegated to an external capability behind the
//! [`LyricsProviderClient`] trait; the shipped implementation drives the
//! `syncedlyrics` command line tool. [`ProviderResolver`] decides which
//! backends are tried, and in which order, for the synced and plain passes.
//!
//! An attempt only counts when its output file exists and is larger than
//! [`MIN_ARTIFACT_BYTES`], whatever the client itself reports.

mod client;
mod resolver;

pub use client::{
    DEFAULT_SYNCEDLYRICS_BIN, FetchRequest, LyricsProviderClient, MIN_ARTIFACT_BYTES,
    SyncedLyricsCli, artifact_accepted,
};
pub use resolver::{DEFAULT_PROVIDER, ProviderResolver};
