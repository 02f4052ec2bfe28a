//! # Download Batches
//!
//! A batch walks an ordered target list on a background task. For every
//! media file it classifies the existing lyrics, then either skips, upgrades
//! plain lyrics to synced ones, or searches the configured providers.
//!
//! Progress is reported through [`BatchEvent`]s. The only question a batch
//! ever asks is whether to upgrade plain lyrics; it is answered through
//! [`UpgradePrompt::answer`]. Cancellation is cooperative: the target in
//! flight finishes and no further target starts.

mod events;
mod orchestrator;

pub use events::{BatchEvent, BatchSummary, Outcome, Phase, Saved, UpgradePrompt};
pub use orchestrator::{BatchHandle, BatchOptions, BatchRequest, FetchOrchestrator};
