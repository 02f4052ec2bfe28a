mod common;

use std::fs;

use common::{plain_lyrics, synced_lyrics, write};
use lyricsync::lyrics::{
    Validators,
    validate::{reject_if_mostly_non_ascii, rename_plain, strip_cjk_lines},
};

#[tokio::test]
async fn test_strip_cjk_lines_rewrites_file() {
    let dir = tempfile::tempdir().unwrap();
    let lrc = dir.path().join("song.lrc");
    write(&lrc, "[ti: Song]\n[00:01.00] hello\n[00:02.00] 你好\n");

    assert!(strip_cjk_lines(&lrc).await.unwrap());
    assert_eq!(
        fs::read_to_string(&lrc).unwrap(),
        "[ti: Song]\n[00:01.00] hello\n"
    );

    // Nothing left to strip, file untouched
    assert!(!strip_cjk_lines(&lrc).await.unwrap());
}

#[tokio::test]
async fn test_reject_deletes_file_above_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let lrc = dir.path().join("song.lrc");

    // Two of ten characters are non-ASCII
    write(&lrc, "abcdefghéé");
    assert!(!reject_if_mostly_non_ascii(&lrc, 0.25).await.unwrap());
    assert!(lrc.exists());

    assert!(reject_if_mostly_non_ascii(&lrc, 0.15).await.unwrap());
    assert!(!lrc.exists());
}

#[tokio::test]
async fn test_rename_plain_only_touches_plain_lyrics() {
    let dir = tempfile::tempdir().unwrap();
    let synced = dir.path().join("synced.lrc");
    let plain = dir.path().join("plain.lrc");
    write(&synced, &synced_lyrics());
    write(&plain, &plain_lyrics());
    write(&dir.path().join("plain.txt"), "stale");

    assert_eq!(rename_plain(&synced).await.unwrap(), synced);
    assert!(synced.exists());

    let moved = rename_plain(&plain).await.unwrap();
    assert_eq!(moved, dir.path().join("plain.txt"));
    assert!(!plain.exists());
    assert_eq!(fs::read_to_string(&moved).unwrap(), plain_lyrics());
}

#[tokio::test]
async fn test_validators_run_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let lrc = dir.path().join("song.lrc");

    // Mostly CJK: stripping first leaves plain Latin lines that pass
    let mut text = plain_lyrics();
    for _ in 0..20 {
        text.push_str("君の名は\n");
    }
    write(&lrc, &text);

    let validators = Validators {
        strip_cjk: true,
        reject_ratio: Some(0.15),
        rename_plain: true,
    };
    let validation = validators.run(&lrc).await.unwrap();

    assert!(validation.stripped);
    assert!(!validation.rejected);
    assert_eq!(validation.path, dir.path().join("song.txt"));
    assert_eq!(
        fs::read_to_string(&validation.path).unwrap(),
        plain_lyrics()
    );
}

#[tokio::test]
async fn test_validators_reject_without_stripping() {
    let dir = tempfile::tempdir().unwrap();
    let lrc = dir.path().join("song.lrc");
    let mut text = plain_lyrics();
    for _ in 0..20 {
        text.push_str("君の名は\n");
    }
    write(&lrc, &text);

    let validators = Validators {
        strip_cjk: false,
        reject_ratio: Some(0.15),
        rename_plain: true,
    };
    let validation = validators.run(&lrc).await.unwrap();

    assert!(!validation.stripped);
    assert!(validation.rejected);
    assert!(!lrc.exists());
    assert!(!dir.path().join("song.txt").exists());
}
