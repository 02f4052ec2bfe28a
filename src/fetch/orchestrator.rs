use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{LyricsError, Result},
    fetch::events::{BatchEvent, BatchSummary, Outcome, Phase, Saved, UpgradePrompt},
    library::{LibraryIndex, TargetList},
    lyrics::{Validators, classify_file, validate::remove_if_exists},
    providers::{FetchRequest, LyricsProviderClient, ProviderResolver, artifact_accepted},
    types::{FetchMode, LyricState, MediaFile, Provider, UpgradePolicy},
    utils,
};

/// Settings snapshot taken when a batch starts.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    pub resolver: ProviderResolver,
    pub lang: Option<String>,
    pub allow_plain_fallback: bool,
    pub upgrade: UpgradePolicy,
    pub validators: Validators,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            resolver: ProviderResolver::default(),
            lang: Some("en".to_string()),
            allow_plain_fallback: false,
            upgrade: UpgradePolicy::Ask,
            validators: Validators::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub targets: TargetList,
    pub options: BatchOptions,
    /// Replaces the derived query for every target. Existing lyrics are
    /// discarded before searching.
    pub query: Option<String>,
    pub cancel: CancellationToken,
}

impl BatchRequest {
    pub fn new(targets: TargetList, options: BatchOptions) -> Self {
        Self {
            targets,
            options,
            query: None,
            cancel: CancellationToken::new(),
        }
    }

    /// A one-track batch searched with a user supplied query.
    pub fn custom(track: PathBuf, query: String, options: BatchOptions) -> Self {
        let mut targets = TargetList::new();
        targets.push(track);
        Self {
            query: Some(query),
            ..Self::new(targets, options)
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// A running batch.
///
/// Events arrive in order and end with [`BatchEvent::Finished`]. Dropping the
/// receiving side declines every pending upgrade question.
pub struct BatchHandle {
    events: mpsc::UnboundedReceiver<BatchEvent>,
    cancel: CancellationToken,
    task: JoinHandle<BatchSummary>,
}

impl BatchHandle {
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Stops the batch after the target in flight.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn wait(self) -> Result<BatchSummary> {
        let BatchHandle { task, .. } = self;
        task.await.map_err(|e| LyricsError::Worker(e.to_string()))
    }
}

/// Runs download batches against a provider client, one at a time.
#[derive(Clone)]
pub struct FetchOrchestrator {
    client: Arc<dyn LyricsProviderClient>,
    index: Arc<LibraryIndex>,
    busy: Arc<Mutex<()>>,
}

impl FetchOrchestrator {
    pub fn new(client: Arc<dyn LyricsProviderClient>, index: Arc<LibraryIndex>) -> Self {
        Self {
            client,
            index,
            busy: Arc::new(Mutex::new(())),
        }
    }

    pub fn index(&self) -> &Arc<LibraryIndex> {
        &self.index
    }

    pub fn is_busy(&self) -> bool {
        self.busy.try_lock().is_err()
    }

    /// Starts a batch on a background task.
    ///
    /// Fails with [`LyricsError::BatchInProgress`] while another batch of this
    /// orchestrator (or any clone of it) is still running.
    pub fn start(&self, request: BatchRequest) -> Result<BatchHandle> {
        let guard = self
            .busy
            .clone()
            .try_lock_owned()
            .map_err(|_| LyricsError::BatchInProgress)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = request.cancel.clone();
        let worker = BatchWorker {
            client: self.client.clone(),
            index: self.index.clone(),
            options: request.options,
            query: request.query,
            events: tx,
            cancel: request.cancel,
        };
        let targets = request.targets;

        let task = tokio::spawn(async move {
            let summary = worker.run(targets).await;
            drop(guard);
            summary
        });

        Ok(BatchHandle {
            events: rx,
            cancel,
            task,
        })
    }
}

struct BatchWorker {
    client: Arc<dyn LyricsProviderClient>,
    index: Arc<LibraryIndex>,
    options: BatchOptions,
    query: Option<String>,
    events: mpsc::UnboundedSender<BatchEvent>,
    cancel: CancellationToken,
}

impl BatchWorker {
    fn emit(&self, event: BatchEvent) {
        let _ = self.events.send(event);
    }

    async fn run(self, targets: TargetList) -> BatchSummary {
        let total = targets.len();
        let mut summary = BatchSummary::new(total);
        let mut artists: Vec<String> = Vec::new();

        self.emit(BatchEvent::Started { total });

        for (i, media) in targets.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }

            let index = i + 1;
            let file = MediaFile::new(media, self.index.root());
            self.emit(BatchEvent::TargetStarted {
                index,
                total,
                path: media.clone(),
                title: file.title.clone(),
            });

            let outcome = match self.process(index, &file).await {
                Ok(Some(outcome)) => outcome,
                // cancelled while waiting for an upgrade answer
                Ok(None) => break,
                Err(e) => Outcome::Failed(e.to_string()),
            };

            summary.record(&outcome);
            if outcome.touches_disk() {
                self.invalidate(&file);
            }
            if !file.artist.is_empty() {
                artists.push(file.artist.clone());
            }

            self.emit(BatchEvent::TargetFinished {
                index,
                path: media.clone(),
                outcome,
            });
        }

        utils::remove_duplicate_strings(&mut artists);
        for artist in &artists {
            self.index.mark_scanned(artist);
        }

        summary.cancelled = summary.processed < total && self.cancel.is_cancelled();
        self.emit(BatchEvent::Finished(summary));
        summary
    }

    fn invalidate(&self, file: &MediaFile) {
        let folder = self
            .index
            .artist_folder(&file.artist)
            .or_else(|| file.path.parent().map(Path::to_path_buf));
        if let Some(folder) = folder {
            self.index.invalidate(&folder);
        }
    }

    /// `Ok(None)` means the batch was cancelled before this target got an outcome.
    async fn process(&self, index: usize, file: &MediaFile) -> Result<Option<Outcome>> {
        let lrc = file.lyric_path();

        let txt = file.plain_path();

        if let Some(query) = &self.query {
            remove_if_exists(&lrc).await?;
            self.emit(BatchEvent::Phase {
                index,
                phase: Phase::Searching,
            });
            let outcome = self.search(index, &lrc, query).await?;
            // the new lyrics supersede a plain `.txt` from before
            if let Outcome::Saved(Saved::Fetched { path, .. }) = &outcome
                && *path != txt
            {
                remove_if_exists(&txt).await?;
            }
            return Ok(Some(outcome));
        }

        let existing = if lrc.is_file() {
            Some(lrc.clone())
        } else if txt.is_file() {
            Some(txt)
        } else {
            None
        };

        let state = match &existing {
            Some(path) => classify_file(path).await,
            None => LyricState::None,
        };
        self.emit(BatchEvent::Phase {
            index,
            phase: Phase::Classified(state),
        });

        match (state, existing) {
            (LyricState::None, None) => {
                self.emit(BatchEvent::Phase {
                    index,
                    phase: Phase::Searching,
                });
                self.search(index, &lrc, &file.query()).await.map(Some)
            }
            (LyricState::Plain, Some(existing)) => self.upgrade(index, file, &existing).await,
            // unreadable files are left alone
            (state, _) => Ok(Some(Outcome::SkipExisting(state))),
        }
    }

    async fn upgrade(
        &self,
        index: usize,
        file: &MediaFile,
        existing: &Path,
    ) -> Result<Option<Outcome>> {
        match self.options.upgrade {
            UpgradePolicy::Off => return Ok(Some(Outcome::SkipExisting(LyricState::Plain))),
            UpgradePolicy::Auto => {}
            UpgradePolicy::Ask => match self.confirm_upgrade(file).await {
                None => return Ok(None),
                Some(false) => return Ok(Some(Outcome::SkipExisting(LyricState::Plain))),
                Some(true) => {}
            },
        }

        self.emit(BatchEvent::Phase {
            index,
            phase: Phase::Upgrading,
        });

        let query = file.query();
        let temp = utils::temp_lyric_path(&file.path);

        for provider in self.options.resolver.synced_order() {
            if self.cancel.is_cancelled() {
                break;
            }

            let fetched = self
                .attempt(index, &query, provider, &temp, FetchMode::Synced)
                .await;
            if fetched && classify_file(&temp).await == LyricState::Synced {
                let lrc = file.lyric_path();
                if let Err(e) = replace_artifact(existing, &temp, &lrc).await {
                    let _ = remove_if_exists(&temp).await;
                    return Err(e);
                }
                return Ok(Some(Outcome::Saved(Saved::Upgraded {
                    provider,
                    path: lrc,
                })));
            }
            remove_if_exists(&temp).await?;
        }

        remove_if_exists(&temp).await?;
        Ok(Some(Outcome::Saved(Saved::KeptPlain {
            path: existing.to_path_buf(),
        })))
    }

    async fn search(&self, index: usize, lrc: &Path, query: &str) -> Result<Outcome> {
        let mut found = self.first_success(index, query, lrc, FetchMode::Synced).await?;

        if found.is_none() && self.options.allow_plain_fallback && !self.cancel.is_cancelled() {
            found = self.first_success(index, query, lrc, FetchMode::Plain).await?;
        }

        let Some((provider, mode)) = found else {
            return Ok(Outcome::NotFound);
        };

        let validation = self.options.validators.run(lrc).await?;
        if validation.stripped {
            self.emit(BatchEvent::Stripped { index });
        }
        if validation.rejected {
            return Ok(Outcome::Rejected { provider, mode });
        }

        // stripping can leave nothing worth keeping
        if !artifact_accepted(&validation.path).await
            || classify_file(&validation.path).await == LyricState::Incomplete
        {
            remove_if_exists(&validation.path).await?;
            return Ok(Outcome::Rejected { provider, mode });
        }

        Ok(Outcome::Saved(Saved::Fetched {
            provider,
            mode,
            path: validation.path,
        }))
    }

    async fn first_success(
        &self,
        index: usize,
        query: &str,
        output: &Path,
        mode: FetchMode,
    ) -> Result<Option<(Provider, FetchMode)>> {
        for provider in self.options.resolver.ordered_enabled(mode) {
            if self.cancel.is_cancelled() {
                break;
            }
            if self.attempt(index, query, provider, output, mode).await {
                return Ok(Some((provider, mode)));
            }
            // a rejected answer must not shadow the next provider
            remove_if_exists(output).await?;
        }
        Ok(None)
    }

    /// One provider call. Only the file on disk decides success.
    async fn attempt(
        &self,
        index: usize,
        query: &str,
        provider: Provider,
        output: &Path,
        mode: FetchMode,
    ) -> bool {
        self.emit(BatchEvent::Attempt {
            index,
            provider,
            mode,
        });

        let request = FetchRequest {
            query,
            provider,
            output,
            lang: self.options.lang.as_deref(),
            mode,
        };
        if let Err(e) = self.client.fetch(&request).await {
            self.emit(BatchEvent::AttemptError {
                index,
                provider,
                message: e.to_string(),
            });
        }

        artifact_accepted(output).await
    }

    async fn confirm_upgrade(&self, file: &MediaFile) -> Option<bool> {
        let (prompt, answer) = UpgradePrompt::new(file.path.clone(), file.title.clone());
        self.emit(BatchEvent::ConfirmUpgrade(prompt));

        tokio::select! {
            reply = answer => Some(reply.unwrap_or(false)),
            _ = self.cancel.cancelled() => None,
        }
    }
}

/// Moves the upgraded file into place, then drops a plain `.txt` original.
async fn replace_artifact(existing: &Path, temp: &Path, lrc: &Path) -> Result<()> {
    async_fs::rename(temp, lrc).await?;
    if existing != lrc {
        remove_if_exists(existing).await?;
    }
    Ok(())
}
