mod common;

use common::{plain_lyrics, synced_lyrics, write};
use lyricsync::{
    lyrics::{classify, classify_file, has_timestamp, is_metadata_line},
    types::LyricState,
};

#[test]
fn test_classify_missing_file_is_none() {
    assert_eq!(classify(None), LyricState::None);
}

#[test]
fn test_classify_synced() {
    assert_eq!(classify(Some(&synced_lyrics())), LyricState::Synced);
}

#[test]
fn test_classify_plain() {
    assert_eq!(classify(Some(&plain_lyrics())), LyricState::Plain);
}

#[test]
fn test_classify_short_files_are_incomplete() {
    assert_eq!(classify(Some("")), LyricState::Incomplete);

    // Five lines are not enough, whatever their timestamps
    let five = "[00:01.00] a\n[00:02.00] b\n[00:03.00] c\n[00:04.00] d\n[00:05.00] e\n";
    assert_eq!(classify(Some(five)), LyricState::Incomplete);
}

#[test]
fn test_classify_ignores_metadata_and_blank_lines() {
    // Header tags and blank lines do not count towards the six lyric lines
    let text = "[ar: Muse]\n[ti: Dead Inside]\n[al: Drones]\n[by: someone]\n\n\n\
                [00:01.00] one\n[00:02.00] two\n[00:03.00] three\n";
    assert_eq!(classify(Some(text)), LyricState::Incomplete);
}

#[test]
fn test_classify_needs_three_timestamps_for_synced() {
    let mut text = String::from("[00:01.00] one\n[00:02.00] two\n");
    text.push_str("three\nfour\nfive\nsix\n");
    assert_eq!(classify(Some(&text)), LyricState::Plain);

    text.push_str("[01:02.345] seven\n");
    assert_eq!(classify(Some(&text)), LyricState::Synced);
}

#[test]
fn test_timestamp_and_metadata_detection() {
    assert!(has_timestamp("[00:12.34] line"));
    assert!(has_timestamp("  [1:02] line"));
    assert!(has_timestamp("[12:00.1]"));
    assert!(!has_timestamp("line [00:12.34]"));
    assert!(!has_timestamp("[ar: Muse]"));
    assert!(!has_timestamp("[123:00.00] too long"));

    assert!(is_metadata_line("[offset: +100]"));
    assert!(is_metadata_line("  [ve: 1.0]"));
    assert!(!is_metadata_line("[00:01.00] [ar: in the lyrics]"));
}

#[tokio::test]
async fn test_classify_file() {
    let dir = tempfile::tempdir().unwrap();
    let synced = dir.path().join("synced.lrc");
    let plain = dir.path().join("plain.txt");
    write(&synced, &synced_lyrics());
    write(&plain, &plain_lyrics());

    assert_eq!(classify_file(&synced).await, LyricState::Synced);
    assert_eq!(classify_file(&plain).await, LyricState::Plain);
    assert_eq!(
        classify_file(&dir.path().join("absent.lrc")).await,
        LyricState::None
    );

    // Invalid UTF-8 is read lossily instead of failing
    let mut bytes = synced_lyrics().into_bytes();
    bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
    let lossy = dir.path().join("lossy.lrc");
    std::fs::write(&lossy, bytes).unwrap();
    assert_eq!(classify_file(&lossy).await, LyricState::Synced);
}

#[test]
fn test_state_icons() {
    assert_eq!(LyricState::Synced.icon(), "✅");
    assert_eq!(LyricState::Plain.icon(), "📄");
    assert_eq!(LyricState::Incomplete.icon(), "⚠️");
    assert_eq!(LyricState::None.icon(), "❌");
}
