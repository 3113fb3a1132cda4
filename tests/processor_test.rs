//! Integration tests for per-video processing against a scripted page.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use channel_job_watcher::config::PageSelectors;
use channel_job_watcher::constants::UNKNOWN_CHANNEL;
use channel_job_watcher::processor::{ProcessError, VideoOutcome, VideoProcessor};
use channel_job_watcher::store::{JobStore, StoreError};
use common::{config_in, watch_url, FakeSession, FakeVideo, RecordingNotifier};
use tempfile::TempDir;

const JOB_DESCRIPTION: &str = r#"
    <span>Backend role at Acme, apply before Friday:</span>
    <a href="https://www.youtube.com/redirect?event=video_description&amp;q=https%3A%2F%2Fforms.gle%2Fabc&amp;v=vid1">https://forms.gle/abc</a>
    <span>Careers page:</span>
    <a href="https://acme.example.com/careers">acme.example.com/careers</a>
    <span>Follow me:</span>
    <a href="https://www.youtube.com/redirect?q=https%3A%2F%2Finstagram.com%2Fapply-now">instagram</a>
    <a href="/watch?v=other&amp;t=60s">1:00</a>
"#;

const NOISE_DESCRIPTION: &str = r#"
    <a href="https://www.youtube.com/redirect?q=https%3A%2F%2Finstagram.com%2Fme">Instagram</a>
    <a href="https://company.com/about">Our team</a>
"#;

fn setup(
    session_video: FakeVideo,
    notifier: Arc<RecordingNotifier>,
) -> (FakeSession, VideoProcessor, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(temp_dir.path());
    let processor = VideoProcessor::new(&config, notifier);
    let session = FakeSession::new().with_video("vid1", session_video);
    (session, processor, temp_dir)
}

#[tokio::test]
async fn test_saves_classified_links() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (session, processor, _temp_dir) = setup(
        FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION),
        notifier.clone(),
    );

    let outcome = processor
        .process(&session, &watch_url("vid1"))
        .await
        .expect("process failed");

    let VideoOutcome::Saved(record) = outcome else {
        panic!("expected a saved record");
    };

    let links: HashSet<_> = record.job_links.iter().map(String::as_str).collect();
    assert_eq!(
        links,
        HashSet::from(["https://forms.gle/abc", "https://acme.example.com/careers"])
    );
    assert_eq!(record.video_title, "Hiring Backend Engineers");
    assert_eq!(record.channel_name, "Tech Jobs Daily");
    assert_eq!(record.source, "YouTube");
    assert_eq!(record.video_url.as_deref(), Some(watch_url("vid1").as_str()));

    let stored = processor.store().load().await.unwrap();
    assert_eq!(stored, vec![record.clone()]);
    assert_eq!(notifier.sent(), vec![record]);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (session, processor, _temp_dir) = setup(
        FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION),
        notifier.clone(),
    );

    let first = processor.process(&session, &watch_url("vid1")).await.unwrap();
    let second = processor.process(&session, &watch_url("vid1")).await.unwrap();

    assert!(matches!(first, VideoOutcome::Saved(_)));
    assert_eq!(second, VideoOutcome::AlreadyExists);
    assert_eq!(processor.store().load().await.unwrap().len(), 1);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_no_job_links_leaves_store_untouched() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (session, processor, _temp_dir) = setup(
        FakeVideo::new("My Desk Setup", NOISE_DESCRIPTION),
        notifier.clone(),
    );

    let outcome = processor.process(&session, &watch_url("vid1")).await.unwrap();

    assert_eq!(outcome, VideoOutcome::NoJobLinks);
    assert!(!processor.store().path().exists());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_no_job_links_keeps_existing_bytes() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (session, processor, _temp_dir) = setup(
        FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION),
        notifier.clone(),
    );
    processor.process(&session, &watch_url("vid1")).await.unwrap();
    let before = tokio::fs::read(processor.store().path()).await.unwrap();

    let quiet = FakeSession::new().with_video("vid2", FakeVideo::new("Vlog", NOISE_DESCRIPTION));
    let outcome = processor.process(&quiet, &watch_url("vid2")).await.unwrap();

    assert_eq!(outcome, VideoOutcome::NoJobLinks);
    let after = tokio::fs::read(processor.store().path()).await.unwrap();
    assert_eq!(before, after);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_missing_channel_name_uses_sentinel() {
    let notifier = Arc::new(RecordingNotifier::default());
    let video = FakeVideo {
        channel: None,
        ..FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION)
    };
    let (session, processor, _temp_dir) = setup(video, notifier);

    let outcome = processor.process(&session, &watch_url("vid1")).await.unwrap();

    let VideoOutcome::Saved(record) = outcome else {
        panic!("expected a saved record");
    };
    assert_eq!(record.channel_name, UNKNOWN_CHANNEL);
}

#[tokio::test]
async fn test_missing_title_is_fatal() {
    let notifier = Arc::new(RecordingNotifier::default());
    let video = FakeVideo {
        title: None,
        ..FakeVideo::new("ignored", JOB_DESCRIPTION)
    };
    let (session, processor, _temp_dir) = setup(video, notifier.clone());

    let err = processor
        .process(&session, &watch_url("vid1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::EmptyTitle { .. }));
    assert!(!processor.store().path().exists());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_missing_description_panel_is_fatal() {
    let notifier = Arc::new(RecordingNotifier::default());
    let video = FakeVideo {
        description: None,
        ..FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION)
    };
    let (session, processor, _temp_dir) = setup(video, notifier);

    let err = processor
        .process(&session, &watch_url("vid1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::DescriptionMissing { .. }));
}

#[tokio::test]
async fn test_unreachable_video_is_fatal() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (session, processor, _temp_dir) = setup(
        FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION),
        notifier,
    );

    let err = processor
        .process(&session, &watch_url("gone"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::Navigation { .. }));
}

#[tokio::test]
async fn test_expand_clicked_when_offered() {
    let notifier = Arc::new(RecordingNotifier::default());
    let video = FakeVideo {
        show_more: true,
        ..FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION)
    };
    let (session, processor, _temp_dir) = setup(video, notifier);

    processor.process(&session, &watch_url("vid1")).await.unwrap();

    assert_eq!(*session.expand_clicks.lock().unwrap(), 1);
    assert_eq!(
        *session.click_scopes.lock().unwrap(),
        vec![PageSelectors::default().description]
    );
}

#[tokio::test]
async fn test_expand_failure_is_not_fatal() {
    let notifier = Arc::new(RecordingNotifier::default());
    let video = FakeVideo {
        show_more_fails: true,
        ..FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION)
    };
    let (session, processor, _temp_dir) = setup(video, notifier);

    let outcome = processor.process(&session, &watch_url("vid1")).await.unwrap();

    assert!(matches!(outcome, VideoOutcome::Saved(_)));
}

#[tokio::test]
async fn test_notification_failure_keeps_record() {
    let notifier = Arc::new(RecordingNotifier::failing());
    let (session, processor, _temp_dir) = setup(
        FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION),
        notifier.clone(),
    );

    let outcome = processor.process(&session, &watch_url("vid1")).await.unwrap();

    assert!(matches!(outcome, VideoOutcome::Saved(_)));
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(processor.store().load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_retitled_video_not_recorded_twice() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (session, processor, temp_dir) = setup(
        FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION),
        notifier,
    );
    processor.process(&session, &watch_url("vid1")).await.unwrap();

    let retitled = FakeSession::new().with_video(
        "vid1",
        FakeVideo::new("Hiring Backend Engineers (UPDATED)", JOB_DESCRIPTION),
    );
    let outcome = processor.process(&retitled, &watch_url("vid1")).await.unwrap();

    assert_eq!(outcome, VideoOutcome::AlreadyExists);
    let store = JobStore::new(temp_dir.path().join("data").join("jobs.json"));
    assert_eq!(store.load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_title_read_error_is_fatal() {
    let notifier = Arc::new(RecordingNotifier::default());
    let video = FakeVideo {
        title_fails: true,
        ..FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION)
    };
    let (session, processor, _temp_dir) = setup(video, notifier.clone());

    let err = processor
        .process(&session, &watch_url("vid1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::Title { .. }));
    assert!(!processor.store().path().exists());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_description_read_error_is_fatal() {
    let notifier = Arc::new(RecordingNotifier::default());
    let video = FakeVideo {
        description_read_fails: true,
        ..FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION)
    };
    let (session, processor, _temp_dir) = setup(video, notifier.clone());

    let err = processor
        .process(&session, &watch_url("vid1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::Description { .. }));
    assert!(!processor.store().path().exists());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_corrupt_store_is_fatal_and_left_alone() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (session, processor, _temp_dir) = setup(
        FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION),
        notifier.clone(),
    );
    let path = processor.store().path().to_path_buf();
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(&path, b"{broken").await.unwrap();

    let err = processor
        .process(&session, &watch_url("vid1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::Store(StoreError::Parse { .. })));
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"{broken");
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_unreadable_store_is_fatal() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (session, processor, _temp_dir) = setup(
        FakeVideo::new("Hiring Backend Engineers", JOB_DESCRIPTION),
        notifier.clone(),
    );
    // A directory where the store file should be cannot be read as one
    tokio::fs::create_dir_all(processor.store().path())
        .await
        .unwrap();

    let err = processor
        .process(&session, &watch_url("vid1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::Store(StoreError::Read { .. })));
    assert!(notifier.sent().is_empty());
}
