use std::fs;
use std::path::PathBuf;

use clap::Parser;

use super::report::*;
use super::run;
use crate::cli::Cli;
use crate::db::Database;
use crate::db::fixtures::*;
use crate::login::FlowSession;
use crate::unmark::UnmarkReport;

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["tweetvault"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).expect("arguments should parse")
}

#[test]
fn unmark_command_updates_archive_and_media_dir() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("twitter.db");
    let media_dir = dir.path().join("videos");
    fs::create_dir(&media_dir).expect("media dir");
    fs::write(media_dir.join("42_0.mp4"), b"video").expect("media file");
    {
        let db = Database::open(&db_path).expect("open");
        db.migrate().expect("migrate");
        insert_tweet(db.connection(), 42, true);
        insert_video(db.connection(), 7, 42, "42_0.mp4", true);
    }

    run(cli(&[
        "--db",
        db_path.to_str().expect("utf-8 path"),
        "--media-dir",
        media_dir.to_str().expect("utf-8 path"),
        "unmark",
        "42",
    ]))
    .expect("unmark command should succeed");

    let db = Database::open(&db_path).expect("reopen");
    assert!(!video_is_downloaded(db.connection(), 7));
    assert!(!tweet_is_content_downloaded(db.connection(), 42));
    assert!(!media_dir.join("42_0.mp4").exists());
}

#[test]
fn unmark_command_fails_for_unknown_tweet() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("twitter.db");

    let err = run(cli(&["--db", db_path.to_str().expect("utf-8 path"), "unmark", "42"]))
        .expect_err("unknown tweet should fail");

    let message = format!("{err:#}");
    assert!(message.contains("failed to unmark tweet 42"), "{message}");
    assert!(message.contains("not in the database"), "{message}");
}

#[test]
fn reads_without_a_saved_session_ask_for_login() {
    let dir = tempfile::tempdir().expect("temp dir");
    let session_path = dir.path().join("session.json");

    let err = run(cli(&[
        "--session",
        session_path.to_str().expect("utf-8 path"),
        "inbox",
        "--bearer-token",
        "tok",
    ]))
    .expect_err("missing session should fail");

    assert!(err.to_string().contains("tweetvault login"), "{err}");
}

#[test]
fn unmark_summary_lists_missing_files() {
    let report = UnmarkReport {
        tweet_id: 42,
        videos_cleared: 2,
        files_deleted: vec![PathBuf::from("videos/42_0.mp4")],
        files_missing: vec![PathBuf::from("videos/42_1.mp4")],
    };

    let summary = unmark_summary(&report);

    assert!(summary.starts_with("Tweet 42: cleared 2 video flag(s), deleted 1 file(s)."));
    assert!(summary.contains("already missing: videos/42_1.mp4"));
}

#[test]
fn session_summary_masks_the_csrf_token() {
    let cookies = vec!["ct0=abcdef0123456789".to_string()];
    let session = FlowSession::new("g".to_string())
        .with_cookies(&cookies)
        .into_authenticated("abcdef0123456789".to_string(), Some("archivist".to_string()));

    let summary = session_summary(&session, &PathBuf::from("/tmp/session.json"));

    assert!(summary.contains("Logged in as archivist"));
    assert!(summary.contains("abcd...****"));
    assert!(!summary.contains("abcdef0123456789"));
}

#[test]
fn mask_token_hides_short_tokens_entirely() {
    assert_eq!(mask_token("abc"), "***");
    assert_eq!(mask_token(""), "");
}

#[test]
fn format_timestamp_display_passes_through_unparseable_values() {
    assert_eq!(format_timestamp_display("yesterday"), "yesterday");
    assert!(format_timestamp_display("2026-10-17T12:00:00+00:00").starts_with("2026-10-1"));
}
