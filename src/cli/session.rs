use std::{path::PathBuf, sync::Arc};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    config::Settings,
    error,
    fetch::{
        BatchEvent, BatchHandle, BatchOptions, BatchRequest, BatchSummary, FetchOrchestrator,
        Outcome, Phase, Saved, UpgradePrompt,
    },
    info,
    library::LibraryIndex,
    management::{STATE_TYPE_SCANNED, StateManager},
    providers::SyncedLyricsCli,
    success,
    types::{Provider, UpgradePolicy},
    warning,
};

/// Per-run adjustments from the command line, applied on top of the settings.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub music_dir: Option<PathBuf>,
    pub providers: Vec<Provider>,
    pub allow_plain: bool,
    pub upgrade: Option<UpgradePolicy>,
    pub rename_plain: bool,
    pub no_strip_cjk: bool,
    pub no_reject: bool,
    pub reject_ratio: Option<f64>,
    pub lang: Option<String>,
}

impl Overrides {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(dir) = &self.music_dir {
            settings.music_dir = Some(dir.clone());
        }
        if !self.providers.is_empty() {
            settings.providers_order = self.providers.clone();
            settings.providers_enabled = self.providers.clone();
        }
        if self.allow_plain {
            settings.allow_plain_fallback = true;
        }
        if let Some(upgrade) = self.upgrade {
            settings.upgrade_plain = upgrade;
        }
        if self.rename_plain {
            settings.rename_plain = true;
        }
        if self.no_strip_cjk {
            settings.strip_cjk = false;
        }
        if self.no_reject {
            settings.reject_non_ascii = false;
        }
        if let Some(ratio) = self.reject_ratio {
            settings.reject_non_ascii_ratio = ratio;
        }
        if let Some(lang) = &self.lang {
            settings.lang = (!lang.is_empty()).then(|| lang.clone());
        }
    }
}

/// Everything a command needs: settings, the library index and the
/// persisted set of scanned artists.
pub struct Session {
    pub settings: Settings,
    pub index: Arc<LibraryIndex>,
    scanned: StateManager,
}

impl Session {
    pub async fn open(overrides: &Overrides) -> Self {
        let mut settings = match Settings::from_env() {
            Ok(s) => s,
            Err(e) => error!("Invalid configuration. Err: {}", e),
        };
        overrides.apply(&mut settings);

        let index = Arc::new(LibraryIndex::new(settings.music_dir.clone()));

        let mut scanned = StateManager::new(STATE_TYPE_SCANNED);
        if let Err(e) = scanned.load().await {
            warning!("Cannot load scanned artists, starting empty. Err: {}", e);
        }
        index.restore_scanned(scanned.get_state().iter().cloned());

        Self {
            settings,
            index,
            scanned,
        }
    }

    pub fn options(&self) -> BatchOptions {
        self.settings.batch_options()
    }

    pub fn orchestrator(&self) -> FetchOrchestrator {
        let client = Arc::new(SyncedLyricsCli::new(self.settings.syncedlyrics_bin.clone()));
        FetchOrchestrator::new(client, self.index.clone())
    }

    /// Runs a batch in the foreground until it finishes or is cancelled,
    /// then saves the scanned artists.
    pub async fn run(&mut self, request: BatchRequest) -> BatchSummary {
        let handle = match self.orchestrator().start(request) {
            Ok(h) => h,
            Err(e) => error!("Cannot start download. Err: {}", e),
        };
        let summary = drive(handle).await;
        self.save_scanned().await;
        summary
    }

    pub async fn save_scanned(&mut self) {
        self.scanned.replace(self.index.scanned_artists());
        if let Err(e) = self.scanned.persist().await {
            warning!("Failed to persist scanned artists. Err: {}", e);
        }
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

fn report(title: &str, outcome: &Outcome) {
    match outcome {
        Outcome::SkipExisting(state) => info!("{} {}: already {}", state.icon(), title, state),
        Outcome::Saved(Saved::Fetched { provider, mode, .. }) => {
            success!("{}: {} lyrics from {}", title, mode, provider)
        }
        Outcome::Saved(Saved::Upgraded { provider, .. }) => {
            success!("{}: upgraded to synced lyrics from {}", title, provider)
        }
        Outcome::Saved(Saved::KeptPlain { .. }) => {
            info!("{}: no synced lyrics found, kept plain lyrics", title)
        }
        Outcome::Rejected { provider, .. } => {
            warning!("{}: lyrics from {} rejected by validation", title, provider)
        }
        Outcome::NotFound => warning!("{}: no lyrics found", title),
        Outcome::Failed(e) => warning!("{}: failed. Err: {}", title, e),
    }
}

/// Renders batch events until the worker is done.
///
/// Ctrl-C cancels the batch; the track in flight still finishes.
pub async fn drive(mut handle: BatchHandle) -> BatchSummary {
    let cancel = handle.cancel_token();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut pb = ProgressBar::hidden();
    let mut title = String::new();

    loop {
        let event = tokio::select! {
            event = handle.next_event() => event,
            _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                cancel.cancel();
                pb.suspend(|| warning!("Cancelling after the current track..."));
                continue
            }
        };

        let Some(event) = event else { break };

        match event {
            BatchEvent::Started { total } => pb = progress_bar(total),
            BatchEvent::TargetStarted { title: t, .. } => {
                title = t;
                pb.set_message(title.clone());
            }
            BatchEvent::Phase { phase, .. } => match phase {
                Phase::Classified(state) => {
                    pb.set_message(format!("{} {}", state.icon(), title))
                }
                Phase::Upgrading => pb.set_message(format!("Upgrading {}...", title)),
                Phase::Searching => pb.set_message(format!("Searching {}...", title)),
            },
            BatchEvent::Attempt { provider, mode, .. } => {
                pb.set_message(format!("{}: trying {} ({})", title, provider, mode))
            }
            BatchEvent::AttemptError {
                provider, message, ..
            } => pb.suspend(|| warning!("{} failed for {}. Err: {}", provider, title, message)),
            BatchEvent::Stripped { .. } => {
                pb.suspend(|| info!("Removed CJK lines from {}", title))
            }
            BatchEvent::ConfirmUpgrade(prompt) => {
                ask_upgrade(prompt, &pb, &mut stdin, &cancel).await;
            }
            BatchEvent::TargetFinished { outcome, .. } => {
                pb.inc(1);
                pb.suspend(|| report(&title, &outcome));
            }
            BatchEvent::Finished(summary) => {
                pb.finish_and_clear();
                if summary.is_partial() {
                    warning!("{}", summary);
                } else {
                    success!("{}", summary);
                }
            }
        }
    }

    match handle.wait().await {
        Ok(summary) => summary,
        Err(e) => error!("Download worker failed. Err: {}", e),
    }
}

async fn ask_upgrade<R>(
    prompt: UpgradePrompt,
    pb: &ProgressBar,
    stdin: &mut tokio::io::Lines<R>,
    cancel: &tokio_util::sync::CancellationToken,
) where
    R: tokio::io::AsyncBufRead + Unpin,
{
    pb.suspend(|| {
        info!(
            "{} has plain lyrics. Search for synced lyrics? [y/N]",
            prompt.title
        )
    });

    tokio::select! {
        line = stdin.next_line() => {
            let yes = matches!(
                line.ok().flatten().as_deref().map(str::trim),
                Some("y" | "Y" | "yes" | "Yes")
            );
            prompt.answer(yes);
        }
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            pb.suspend(|| warning!("Cancelling..."));
        }
    }
}
