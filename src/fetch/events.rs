use std::{fmt, path::PathBuf};

use tokio::sync::oneshot;

use crate::types::{FetchMode, LyricState, Provider};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Saved {
    /// New lyrics were downloaded.
    Fetched {
        provider: Provider,
        mode: FetchMode,
        path: PathBuf,
    },
    /// Plain lyrics were replaced with a synced version.
    Upgraded { provider: Provider, path: PathBuf },
    /// No synced version was found; the plain lyrics stay as they were.
    KeptPlain { path: PathBuf },
}

/// Terminal state of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    SkipExisting(LyricState),
    Saved(Saved),
    Rejected { provider: Provider, mode: FetchMode },
    NotFound,
    Failed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Saved(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::Rejected { .. } | Outcome::NotFound | Outcome::Failed(_)
        )
    }

    /// Anything but a skip may have created, replaced or deleted files.
    pub fn touches_disk(&self) -> bool {
        !matches!(self, Outcome::SkipExisting(_))
    }
}

/// Where a target is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Classified(LyricState),
    Upgrading,
    Searching,
}

/// A yes/no question for the foreground: search a synced replacement for
/// existing plain lyrics?
#[derive(Debug)]
pub struct UpgradePrompt {
    pub path: PathBuf,
    pub title: String,
    reply: oneshot::Sender<bool>,
}

impl UpgradePrompt {
    pub(crate) fn new(path: PathBuf, title: String) -> (Self, oneshot::Receiver<bool>) {
        let (reply, answer) = oneshot::channel();
        (Self { path, title, reply }, answer)
    }

    pub fn answer(self, upgrade: bool) {
        // the worker may already be gone after a cancel
        let _ = self.reply.send(upgrade);
    }
}

#[derive(Debug)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    TargetStarted {
        index: usize,
        total: usize,
        path: PathBuf,
        title: String,
    },
    Phase {
        index: usize,
        phase: Phase,
    },
    Attempt {
        index: usize,
        provider: Provider,
        mode: FetchMode,
    },
    AttemptError {
        index: usize,
        provider: Provider,
        message: String,
    },
    Stripped {
        index: usize,
    },
    ConfirmUpgrade(UpgradePrompt),
    TargetFinished {
        index: usize,
        path: PathBuf,
        outcome: Outcome,
    },
    Finished(BatchSummary),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &Outcome) {
        self.processed += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else if outcome.is_failure() {
            self.failed += 1;
        } else {
            self.skipped += 1;
        }
    }

    pub fn is_partial(&self) -> bool {
        self.cancelled
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cancelled {
            write!(
                f,
                "Cancelled after {}/{} tracks. Downloaded: {} ({} failed, {} skipped)",
                self.processed, self.total, self.succeeded, self.failed, self.skipped
            )
        } else {
            write!(
                f,
                "Done. Downloaded: {}/{} ({} failed, {} skipped)",
                self.succeeded, self.total, self.failed, self.skipped
            )
        }
    }
}
