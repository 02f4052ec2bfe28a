//! # CLI Module
//!
//! This module provides the command-line interface layer for lyricsync. It
//! implements all user-facing commands and coordinates between the library
//! index, the download orchestrator and user interaction.
//!
//! ## Command Categories
//!
//! ### Downloads
//!
//! - [`download`] - Fetches lyrics for a selection of artists, albums, tracks or paths
//! - [`search`] - Searches one track with a hand-written query
//!
//! ### Missing Lyrics
//!
//! - [`missing_scan`] - Records every selected track without a lyric file
//! - [`missing_download`] - Downloads lyrics for the recorded tracks
//! - [`missing_clear`] - Forgets the recorded tracks
//!
//! ### Information Commands
//!
//! - [`status`] - Completeness table per artist or album
//! - [`classify`] - Quality state of individual lyric files
//!
//! ## Architecture Design
//!
//! ```text
//! CLI Layer (User Interface, progress, prompts)
//!     ↓
//! Fetch Layer (batch worker, events, cancellation)
//!     ↓
//! Library / Lyrics Layer (index, cache, classifier, validators)
//!     ↓
//! Provider Layer (external search tool)
//! ```
//!
//! A batch runs on its own task. The foreground renders its events with a
//! progress bar, answers upgrade questions from stdin and turns Ctrl-C into a
//! cooperative cancel.
//!
//! ## Usage Patterns
//!
//! ```bash
//! lyricsync missing scan                       # Find tracks without lyrics
//! lyricsync missing download                   # Fetch them
//! lyricsync download --artist Muse --album Drones --upgrade auto
//! lyricsync search ~/Music/Muse/Drones/01\ Dead\ Inside.flac --strip-punctuation
//! lyricsync status --all
//! ```

mod classify;
mod download;
mod missing;
mod search;
mod session;
mod status;

pub use classify::classify;
pub use download::download;
pub use missing::missing_clear;
pub use missing::missing_download;
pub use missing::missing_scan;
pub use search::SearchOptions;
pub use search::search;
pub use session::Overrides;
pub use session::Session;
pub use session::drive;
pub use status::status;
