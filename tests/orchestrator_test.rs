mod common;

use std::{fs, path::Path, sync::Arc};

use common::{FakeClient, add_track, plain_lyrics, synced_lyrics, write};
use lyricsync::{
    LyricsError,
    fetch::{
        BatchEvent, BatchHandle, BatchOptions, BatchRequest, BatchSummary, FetchOrchestrator,
        Outcome, Saved,
    },
    library::{LibraryIndex, TargetList},
    lyrics::classify_file,
    providers::ProviderResolver,
    types::{FetchMode, LyricState, Provider, Scope, UpgradePolicy},
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn library() -> (TempDir, Arc<LibraryIndex>) {
    let dir = tempfile::tempdir().unwrap();
    let index = Arc::new(LibraryIndex::new(Some(dir.path().to_path_buf())));
    (dir, index)
}

fn options(providers: &[Provider]) -> BatchOptions {
    BatchOptions {
        resolver: ProviderResolver::new(providers.to_vec(), providers.iter().copied()),
        lang: None,
        upgrade: UpgradePolicy::Auto,
        ..BatchOptions::default()
    }
}

fn targets(paths: &[&Path]) -> TargetList {
    paths.iter().map(|p| p.to_path_buf()).collect()
}

struct Run {
    summary: BatchSummary,
    outcomes: Vec<Outcome>,
    events: Vec<BatchEvent>,
    prompts: usize,
}

/// Drains a batch, answering every upgrade question with `answer`.
async fn drain(mut handle: BatchHandle, answer: bool) -> Run {
    let mut events = Vec::new();
    let mut outcomes = Vec::new();
    let mut prompts = 0;

    while let Some(event) = handle.next_event().await {
        match event {
            BatchEvent::ConfirmUpgrade(prompt) => {
                prompts += 1;
                prompt.answer(answer);
            }
            BatchEvent::TargetFinished { ref outcome, .. } => {
                outcomes.push(outcome.clone());
                events.push(event);
            }
            other => events.push(other),
        }
    }

    Run {
        summary: handle.wait().await.unwrap(),
        outcomes,
        events,
        prompts,
    }
}

#[tokio::test]
async fn test_fallback_stops_at_first_success() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");

    let client = Arc::new(FakeClient::new(|req| match req.provider {
        Provider::Musixmatch | Provider::NetEase => Some(synced_lyrics()),
        _ => None,
    }));
    let orchestrator = FetchOrchestrator::new(client.clone(), index);

    let request = BatchRequest::new(
        targets(&[&track]),
        options(&[Provider::Lrclib, Provider::Musixmatch, Provider::NetEase]),
    );
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    // Should try A, then B, and never reach C
    assert_eq!(
        client.providers(),
        vec![Provider::Lrclib, Provider::Musixmatch]
    );
    assert!(client.calls().iter().all(|c| c.mode == FetchMode::Synced));
    assert_eq!(client.calls()[0].query, "Dead Inside Muse");

    let lrc = track.with_extension("lrc");
    assert_eq!(
        run.outcomes,
        vec![Outcome::Saved(Saved::Fetched {
            provider: Provider::Musixmatch,
            mode: FetchMode::Synced,
            path: lrc.clone(),
        })]
    );
    assert_eq!(classify_file(&lrc).await, LyricState::Synced);
    assert_eq!(run.summary.succeeded, 1);
    assert!(!run.summary.cancelled);
}

#[tokio::test]
async fn test_tiny_artifact_counts_as_failure() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");

    let client = Arc::new(FakeClient::new(|req| match req.provider {
        Provider::Lrclib => Some("not found".to_string()),
        _ => Some(synced_lyrics()),
    }));
    let orchestrator = FetchOrchestrator::new(client.clone(), index);

    let request = BatchRequest::new(
        targets(&[&track]),
        options(&[Provider::Lrclib, Provider::NetEase]),
    );
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    // Should ignore the 9 byte answer and move on
    assert_eq!(client.providers(), vec![Provider::Lrclib, Provider::NetEase]);
    assert!(matches!(
        run.outcomes[0],
        Outcome::Saved(Saved::Fetched {
            provider: Provider::NetEase,
            ..
        })
    ));
}

#[tokio::test]
async fn test_saved_download_invalidates_artist_cache() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");
    let artist_dir = dir.path().join("Muse");
    let album_dir = artist_dir.join("Drones");

    // Warm the cache for the artist and the album
    assert_eq!(index.scan_folder(&artist_dir, Scope::Artist).have, 0);
    assert_eq!(index.scan_folder(&album_dir, Scope::Album).have, 0);
    assert!(index.cached(&artist_dir, Scope::Artist).is_some());
    assert!(!index.is_scanned("Muse"));

    let client = Arc::new(FakeClient::new(|_| Some(synced_lyrics())));
    let orchestrator = FetchOrchestrator::new(client, index.clone());
    let request = BatchRequest::new(targets(&[&track]), options(&[Provider::Lrclib]));
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    assert!(run.outcomes[0].is_success());
    assert!(index.cached(&artist_dir, Scope::Artist).is_none());
    assert!(index.cached(&album_dir, Scope::Album).is_none());
    assert!(index.is_scanned("Muse"));

    // Should recompute with the new lyric file
    let result = index.scan_folder(&album_dir, Scope::Album);
    assert_eq!((result.have, result.total), (1, 1));
}

#[tokio::test]
async fn test_plain_fallback_only_when_allowed() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");
    let lrc = track.with_extension("lrc");

    let script = |req: &lyricsync::providers::FetchRequest<'_>| match req.mode {
        FetchMode::Plain => Some(plain_lyrics()),
        FetchMode::Synced => None,
    };

    let client = Arc::new(FakeClient::new(script));
    let orchestrator = FetchOrchestrator::new(client.clone(), index.clone());
    let request = BatchRequest::new(targets(&[&track]), options(&[Provider::Lrclib]));
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    assert_eq!(run.outcomes, vec![Outcome::NotFound]);
    assert_eq!(run.summary.failed, 1);
    assert!(!lrc.exists());
    assert_eq!(client.calls().len(), 1);

    let client = Arc::new(FakeClient::new(script));
    let orchestrator = FetchOrchestrator::new(client.clone(), index);
    let mut opts = options(&[Provider::Lrclib, Provider::Genius]);
    opts.allow_plain_fallback = true;
    let request = BatchRequest::new(targets(&[&track]), opts);
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    // Genius is skipped in the synced pass but tried in the plain pass
    let calls: Vec<(Provider, FetchMode)> = client
        .calls()
        .into_iter()
        .map(|c| (c.provider, c.mode))
        .collect();
    assert_eq!(
        calls,
        vec![
            (Provider::Lrclib, FetchMode::Synced),
            (Provider::Lrclib, FetchMode::Plain),
        ]
    );
    assert_eq!(
        run.outcomes,
        vec![Outcome::Saved(Saved::Fetched {
            provider: Provider::Lrclib,
            mode: FetchMode::Plain,
            path: lrc.clone(),
        })]
    );
    assert_eq!(classify_file(&lrc).await, LyricState::Plain);
}

#[tokio::test]
async fn test_rename_plain_moves_lyrics_to_txt() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");

    let client = Arc::new(FakeClient::new(|req| match req.mode {
        FetchMode::Plain => Some(plain_lyrics()),
        FetchMode::Synced => None,
    }));
    let orchestrator = FetchOrchestrator::new(client, index);
    let mut opts = options(&[Provider::Lrclib]);
    opts.allow_plain_fallback = true;
    opts.validators.rename_plain = true;
    let request = BatchRequest::new(targets(&[&track]), opts);
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    let txt = track.with_extension("txt");
    assert!(!track.with_extension("lrc").exists());
    assert_eq!(fs::read_to_string(&txt).unwrap(), plain_lyrics());
    assert!(matches!(
        &run.outcomes[0],
        Outcome::Saved(Saved::Fetched { path, .. }) if *path == txt
    ));
}

#[tokio::test]
async fn test_upgrade_keeps_plain_when_no_synced_found() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");
    let lrc = track.with_extension("lrc");
    write(&lrc, &plain_lyrics());

    // Every provider answers, but only with plain text
    let client = Arc::new(FakeClient::new(|_| Some(plain_lyrics())));
    let orchestrator = FetchOrchestrator::new(client.clone(), index);
    let request = BatchRequest::new(
        targets(&[&track]),
        options(&[Provider::Lrclib, Provider::NetEase]),
    );
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    assert_eq!(
        run.outcomes,
        vec![Outcome::Saved(Saved::KeptPlain { path: lrc.clone() })]
    );
    assert_eq!(client.providers(), vec![Provider::Lrclib, Provider::NetEase]);
    assert!(
        client
            .calls()
            .iter()
            .all(|c| c.output.to_string_lossy().ends_with(".lrc.temp"))
    );

    // Original untouched, no scratch file left behind
    assert_eq!(fs::read_to_string(&lrc).unwrap(), plain_lyrics());
    assert!(!dir.path().join("Muse/Drones/01 Dead Inside.lrc.temp").exists());
    assert_eq!(run.summary.succeeded, 1);
}

#[tokio::test]
async fn test_upgrade_replaces_plain_txt_with_synced() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");
    let txt = track.with_extension("txt");
    let lrc = track.with_extension("lrc");
    write(&txt, &plain_lyrics());

    let client = Arc::new(FakeClient::new(|_| Some(synced_lyrics())));
    let orchestrator = FetchOrchestrator::new(client, index);
    let request = BatchRequest::new(targets(&[&track]), options(&[Provider::Lrclib]));
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    assert_eq!(
        run.outcomes,
        vec![Outcome::Saved(Saved::Upgraded {
            provider: Provider::Lrclib,
            path: lrc.clone(),
        })]
    );
    assert_eq!(classify_file(&lrc).await, LyricState::Synced);
    assert!(!txt.exists());
    assert!(!dir.path().join("Muse/Drones/01 Dead Inside.lrc.temp").exists());
}

#[tokio::test]
async fn test_upgrade_policy_off_skips_plain() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");
    write(&track.with_extension("lrc"), &plain_lyrics());

    let client = Arc::new(FakeClient::new(|_| Some(synced_lyrics())));
    let orchestrator = FetchOrchestrator::new(client.clone(), index);
    let mut opts = options(&[Provider::Lrclib]);
    opts.upgrade = UpgradePolicy::Off;
    let request = BatchRequest::new(targets(&[&track]), opts);
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    assert_eq!(
        run.outcomes,
        vec![Outcome::SkipExisting(LyricState::Plain)]
    );
    assert!(client.calls().is_empty());
    assert_eq!(run.prompts, 0);
    assert_eq!(run.summary.skipped, 1);
}

#[tokio::test]
async fn test_upgrade_ask_follows_the_answer() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");
    let lrc = track.with_extension("lrc");
    write(&lrc, &plain_lyrics());

    let client = Arc::new(FakeClient::new(|_| Some(synced_lyrics())));
    let orchestrator = FetchOrchestrator::new(client.clone(), index);
    let mut opts = options(&[Provider::Lrclib]);
    opts.upgrade = UpgradePolicy::Ask;

    let request = BatchRequest::new(targets(&[&track]), opts.clone());
    let run = drain(orchestrator.start(request).unwrap(), false).await;
    assert_eq!(run.prompts, 1);
    assert_eq!(
        run.outcomes,
        vec![Outcome::SkipExisting(LyricState::Plain)]
    );
    assert!(client.calls().is_empty());

    let request = BatchRequest::new(targets(&[&track]), opts);
    let run = drain(orchestrator.start(request).unwrap(), true).await;
    assert_eq!(run.prompts, 1);
    assert!(matches!(
        run.outcomes[0],
        Outcome::Saved(Saved::Upgraded { .. })
    ));
    assert_eq!(classify_file(&lrc).await, LyricState::Synced);
}

#[tokio::test]
async fn test_existing_lyrics_are_skipped() {
    let (dir, index) = library();
    let synced = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");
    let broken = add_track(dir.path(), "Muse/Drones/02 Psycho.flac");
    write(&synced.with_extension("lrc"), &synced_lyrics());
    write(&broken.with_extension("lrc"), "[00:01.00] Love");

    let client = Arc::new(FakeClient::new(|_| Some(synced_lyrics())));
    let orchestrator = FetchOrchestrator::new(client.clone(), index);
    let request = BatchRequest::new(targets(&[&synced, &broken]), options(&[Provider::Lrclib]));
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    assert_eq!(
        run.outcomes,
        vec![
            Outcome::SkipExisting(LyricState::Synced),
            Outcome::SkipExisting(LyricState::Incomplete),
        ]
    );
    assert!(client.calls().is_empty());
    assert_eq!(
        fs::read_to_string(broken.with_extension("lrc")).unwrap(),
        "[00:01.00] Love"
    );
}

#[tokio::test]
async fn test_mostly_non_ascii_lyrics_are_rejected() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Kino/Gruppa krovi/01 Gruppa krovi.mp3");

    let client = Arc::new(FakeClient::new(|_| {
        Some("Группа крови на рукаве\nМой порядковый номер\n".repeat(4))
    }));
    let orchestrator = FetchOrchestrator::new(client, index);
    let request = BatchRequest::new(targets(&[&track]), options(&[Provider::Lrclib]));
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    assert_eq!(
        run.outcomes,
        vec![Outcome::Rejected {
            provider: Provider::Lrclib,
            mode: FetchMode::Synced,
        }]
    );
    assert!(!track.with_extension("lrc").exists());
    assert_eq!(run.summary.failed, 1);
}

#[tokio::test]
async fn test_cjk_lines_are_stripped_after_download() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");

    let client = Arc::new(FakeClient::new(|_| {
        Some(format!("{}[00:50.00] 死んだ内側\n", synced_lyrics()))
    }));
    let orchestrator = FetchOrchestrator::new(client, index);
    let request = BatchRequest::new(targets(&[&track]), options(&[Provider::Lrclib]));
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    assert!(run.outcomes[0].is_success());
    assert!(
        run.events
            .iter()
            .any(|e| matches!(e, BatchEvent::Stripped { index: 1 }))
    );
    let text = fs::read_to_string(track.with_extension("lrc")).unwrap();
    assert!(!text.contains("死んだ"));
    assert!(text.contains("Revenge is sweet line number 7"));
}

#[tokio::test]
async fn test_custom_query_replaces_existing_lyrics() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");
    let lrc = track.with_extension("lrc");
    write(&lrc, &synced_lyrics());

    let client = Arc::new(FakeClient::new(|req| {
        (req.query == "Muse: Drones - Dead Inside")
            .then(|| synced_lyrics().replace("Revenge", "Vengeance"))
    }));
    let orchestrator = FetchOrchestrator::new(client.clone(), index);
    let request = BatchRequest::custom(
        track.clone(),
        "Muse: Drones - Dead Inside".to_string(),
        options(&[Provider::Lrclib]),
    );
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    assert_eq!(client.calls()[0].query, "Muse: Drones - Dead Inside");
    assert!(run.outcomes[0].is_success());
    assert!(fs::read_to_string(&lrc).unwrap().contains("Vengeance"));
}

#[tokio::test]
async fn test_lyrics_stripped_to_nothing_are_rejected() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Utada/First Love/01 First Love.flac");

    let client = Arc::new(FakeClient::new(|_| {
        Some(
            (0..10)
                .map(|n| format!("[00:0{}.00] 七回目のベルで受話器を取った君\n", n))
                .collect(),
        )
    }));
    let orchestrator = FetchOrchestrator::new(client, index);
    let request = BatchRequest::new(targets(&[&track]), options(&[Provider::Lrclib]));
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    // Should not report an empty leftover as a synced download
    assert_eq!(
        run.outcomes,
        vec![Outcome::Rejected {
            provider: Provider::Lrclib,
            mode: FetchMode::Synced,
        }]
    );
    assert_eq!(run.summary.failed, 1);
    assert_eq!(run.summary.succeeded, 0);

    // Should leave the track eligible for the next batch
    let lrc = track.with_extension("lrc");
    assert!(!lrc.exists());
    assert_eq!(classify_file(&lrc).await, LyricState::None);
}

#[tokio::test]
async fn test_custom_query_drops_stale_plain_txt() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");
    let txt = track.with_extension("txt");
    write(&txt, &plain_lyrics());

    let client = Arc::new(FakeClient::new(|_| Some(synced_lyrics())));
    let orchestrator = FetchOrchestrator::new(client, index);
    let request = BatchRequest::custom(
        track.clone(),
        "Muse - Dead Inside".to_string(),
        options(&[Provider::Lrclib]),
    );
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    assert!(run.outcomes[0].is_success());
    assert_eq!(
        classify_file(&track.with_extension("lrc")).await,
        LyricState::Synced
    );
    // Should keep only the new synced lyrics
    assert!(!txt.exists());
}

#[tokio::test]
async fn test_cancel_stops_after_the_target_in_flight() {
    let (dir, index) = library();
    let tracks: Vec<_> = (1..=5)
        .map(|i| add_track(dir.path(), &format!("Muse/Drones/Song {}.mp3", i)))
        .collect();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let client = Arc::new(FakeClient::new(move |req| {
        if req.query.starts_with("Song 2") {
            trigger.cancel();
        }
        Some(synced_lyrics())
    }));
    let orchestrator = FetchOrchestrator::new(client.clone(), index);

    let list: TargetList = tracks.iter().cloned().collect();
    let request = BatchRequest::new(list, options(&[Provider::Lrclib])).with_cancel(cancel);
    let run = drain(orchestrator.start(request).unwrap(), false).await;

    assert_eq!(run.summary.total, 5);
    assert_eq!(run.summary.processed, 2);
    assert_eq!(run.summary.succeeded, 2);
    assert!(run.summary.cancelled);
    assert!(run.summary.to_string().starts_with("Cancelled"));
    assert_eq!(client.calls().len(), 2);

    assert!(tracks[1].with_extension("lrc").exists());
    for track in &tracks[2..] {
        assert!(!track.with_extension("lrc").exists());
    }
    assert!(matches!(
        run.events.last(),
        Some(BatchEvent::Finished(summary)) if summary.cancelled
    ));
}

#[tokio::test]
async fn test_cancel_while_waiting_for_an_answer() {
    let (dir, index) = library();
    let first = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");
    let second = add_track(dir.path(), "Muse/Drones/02 Psycho.flac");
    write(&first.with_extension("lrc"), &plain_lyrics());

    let client = Arc::new(FakeClient::new(|_| Some(synced_lyrics())));
    let orchestrator = FetchOrchestrator::new(client.clone(), index);
    let mut opts = options(&[Provider::Lrclib]);
    opts.upgrade = UpgradePolicy::Ask;
    let request = BatchRequest::new(targets(&[&first, &second]), opts);
    let mut handle = orchestrator.start(request).unwrap();

    let mut pending = None;
    while let Some(event) = handle.next_event().await {
        if let BatchEvent::ConfirmUpgrade(prompt) = event {
            pending = Some(prompt);
            break;
        }
    }
    assert!(pending.is_some());

    handle.cancel();
    let summary = handle.wait().await.unwrap();
    drop(pending);

    assert_eq!(summary.processed, 0);
    assert!(summary.cancelled);
    assert!(client.calls().is_empty());
    assert!(!second.with_extension("lrc").exists());
}

#[tokio::test]
async fn test_second_batch_is_refused_while_one_runs() {
    let (dir, index) = library();
    let track = add_track(dir.path(), "Muse/Drones/01 Dead Inside.flac");
    write(&track.with_extension("lrc"), &plain_lyrics());

    let client = Arc::new(FakeClient::new(|_| None));
    let orchestrator = FetchOrchestrator::new(client, index);
    let mut opts = options(&[Provider::Lrclib]);
    opts.upgrade = UpgradePolicy::Ask;

    let mut handle = orchestrator
        .start(BatchRequest::new(targets(&[&track]), opts.clone()))
        .unwrap();

    // The worker is now parked on the upgrade question
    let prompt = loop {
        match handle.next_event().await {
            Some(BatchEvent::ConfirmUpgrade(prompt)) => break prompt,
            Some(_) => continue,
            None => panic!("batch ended without asking"),
        }
    };

    assert!(orchestrator.is_busy());
    let second = orchestrator
        .clone()
        .start(BatchRequest::new(targets(&[&track]), opts.clone()));
    assert!(matches!(second, Err(LyricsError::BatchInProgress)));

    prompt.answer(false);
    let summary = handle.wait().await.unwrap();
    assert_eq!(summary.skipped, 1);

    // Should accept a new batch once the first one is done
    assert!(!orchestrator.is_busy());
    let third = orchestrator.start(BatchRequest::new(targets(&[&track]), opts));
    assert!(third.is_ok());
    drain(third.unwrap(), false).await;
}
