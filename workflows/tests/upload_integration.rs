//! Integration tests for the two-stage upload pipeline.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{Harness, ProgressLog, content_item};
use coursehub_core::{
    AccessCode, ByteSource, Error, ServiceError, Stage, UploadConfig, WorkflowConfig,
};
use coursehub_testing::Op;
use coursehub_workflows::{UploadPipeline, UploadProgress};

fn image() -> ByteSource {
    ByteSource::new("image/png", vec![7; 8])
}

fn video() -> ByteSource {
    ByteSource::new("video/mp4", vec![9; 8])
}

fn percents(events: &[UploadProgress], stage: Stage) -> Vec<u8> {
    events
        .iter()
        .filter(|event| event.stage == stage)
        .map(|event| event.percent)
        .collect()
}

#[tokio::test]
async fn preview_completes_before_media_and_record_is_written_once() {
    let harness = Harness::new();
    let pipeline = UploadPipeline::new(harness.env.clone());
    let log = ProgressLog::default();
    let mut record = content_item("", 0);
    record.preview_locator = None;
    record.media_locator = None;

    let item = pipeline
        .create_or_update(record, Some(&image()), Some(&video()), &log.sink())
        .await
        .unwrap();

    // The id is allocated before anything else.
    assert_eq!(item.id, "id-1");
    let preview = item.preview_locator.clone().unwrap();
    let media = item.media_locator.clone().unwrap();
    assert!(preview.as_str().starts_with("mem://blobs/thumbnails/id-1_"));
    assert!(media.as_str().starts_with("mem://blobs/videos/id-1_"));
    assert!(harness.blobs.contains(&preview));
    assert!(harness.blobs.contains(&media));

    let events = log.events();
    let first_media = events.iter().position(|e| e.stage == Stage::Media).unwrap();
    assert!(events[..first_media].iter().all(|e| e.stage == Stage::Preview));
    assert_eq!(percents(&events, Stage::Preview), vec![25, 50, 75, 100]);
    assert_eq!(percents(&events, Stage::Media), vec![25, 50, 75, 100]);

    assert_eq!(harness.documents.call_count(Op::Set, "contentItems"), 1);
    assert_eq!(harness.stored_item("id-1"), Some(item));
}

#[tokio::test]
async fn preview_failure_leaves_the_stored_record_untouched() {
    let harness = Harness::new();
    let before = content_item("course-1", 0);
    harness.seed_item(&before);
    harness
        .blobs
        .fail_uploads_under("thumbnails/", ServiceError::Unavailable("quota exceeded".into()));
    let pipeline = UploadPipeline::new(harness.env.clone());
    let log = ProgressLog::default();

    let err = pipeline
        .create_or_update(before.clone(), Some(&image()), Some(&video()), &log.sink())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::Remote {
            stage: Stage::Preview,
            message: "quota exceeded".to_string(),
        }
    );
    // Media never started and nothing reached the store.
    assert_eq!(harness.blobs.upload_count(), 1);
    assert!(percents(&log.events(), Stage::Media).is_empty());
    assert_eq!(harness.documents.call_count(Op::Set, "contentItems"), 0);
    assert_eq!(harness.stored_item("course-1"), Some(before));
}

#[tokio::test]
async fn media_failure_after_preview_success_writes_nothing() {
    let harness = Harness::new();
    let before = content_item("course-1", 0);
    harness.seed_item(&before);
    harness
        .blobs
        .fail_uploads_under("videos/", ServiceError::Unavailable("connection reset".into()));
    let pipeline = UploadPipeline::new(harness.env.clone());

    let err = pipeline
        .create_or_update(before.clone(), Some(&image()), Some(&video()), &|_| {})
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Media));
    assert_eq!(harness.stored_item("course-1"), Some(before));
    // The preview uploaded by this call is not left behind.
    assert_eq!(harness.blobs.upload_count(), 2);
    assert!(harness.blobs.paths().is_empty());
}

#[tokio::test]
async fn skipped_stage_carries_the_previous_locator() {
    let harness = Harness::new();
    let before = content_item("course-1", 0);
    harness.seed_item(&before);
    let pipeline = UploadPipeline::new(harness.env.clone());
    let log = ProgressLog::default();

    let item = pipeline
        .create_or_update(before.clone(), None, Some(&video()), &log.sink())
        .await
        .unwrap();

    assert_eq!(item.preview_locator, before.preview_locator);
    assert_ne!(item.media_locator, before.media_locator);
    assert!(percents(&log.events(), Stage::Preview).is_empty());
    assert_eq!(harness.blobs.upload_count(), 1);
    assert_eq!(harness.stored_item("course-1"), Some(item));
}

#[tokio::test]
async fn oversized_source_is_rejected_before_any_network_call() {
    let config = WorkflowConfig::default().with_upload(UploadConfig::new(8));
    let harness = Harness::new().with_config(config);
    let pipeline = UploadPipeline::new(harness.env.clone());
    let too_big = ByteSource::new("video/mp4", vec![0; 9]);

    let err = pipeline
        .create_or_update(content_item("course-1", 0), Some(&image()), Some(&too_big), &|_| {})
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::PayloadTooLarge {
            stage: Stage::Media,
            size: 9,
            limit: 8,
        }
    );
    assert_eq!(harness.blobs.upload_count(), 0);
    assert_eq!(harness.documents.call_count(Op::Set, "contentItems"), 0);
}

#[tokio::test]
async fn inconsistent_access_code_is_a_validation_error() {
    let harness = Harness::new();
    let pipeline = UploadPipeline::new(harness.env.clone());
    let mut record = content_item("course-1", 0);
    record.is_private = true;

    let err = pipeline
        .create_or_update(record.clone(), None, None, &|_| {})
        .await
        .unwrap_err();
    assert!(err.is_validation());

    record.access_code = Some(AccessCode::parse("123456789", 9).unwrap());
    assert!(pipeline.create_or_update(record, None, None, &|_| {}).await.is_ok());
}

#[tokio::test]
async fn store_failure_is_reported_with_the_write_stage() {
    let harness = Harness::new();
    harness.documents.fail_on(
        Op::Set,
        "contentItems",
        None,
        ServiceError::Unavailable("disk full".into()),
    );
    let pipeline = UploadPipeline::new(harness.env.clone());

    let err = pipeline
        .create_or_update(content_item("course-1", 0), None, Some(&video()), &|_| {})
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::WriteContent));
    assert_eq!(harness.blobs.upload_count(), 1);
    assert!(harness.blobs.paths().is_empty());
}
