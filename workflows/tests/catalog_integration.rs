//! Integration tests for the content catalog.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{Harness, content_item};
use coursehub_core::{ByteSource, ContentItem, Error, ServiceError, Stage};
use coursehub_testing::{Op, ScriptedCodeGenerator};
use coursehub_workflows::{BookmarkKind, Bookmarks, ContentCatalog, ContentEdit, NewContent};

fn image() -> ByteSource {
    ByteSource::new("image/png", vec![1; 16])
}

fn video() -> ByteSource {
    ByteSource::new("video/mp4", vec![2; 64])
}

fn draft(title: &str, is_private: bool) -> NewContent {
    NewContent {
        title: title.to_string(),
        short_summary: "Ownership and borrowing".to_string(),
        long_summary: String::new(),
        category: "programming".to_string(),
        owner_id: "owner-1".to_string(),
        is_private,
    }
}

fn edit_of(item: &ContentItem, is_private: bool) -> ContentEdit {
    ContentEdit {
        title: item.title.clone(),
        short_summary: item.short_summary.clone(),
        long_summary: item.long_summary.clone(),
        category: item.category.clone(),
        is_private,
    }
}

#[tokio::test]
async fn private_item_gets_a_code_and_the_owner_username() {
    let harness = Harness::new().with_codes(ScriptedCodeGenerator::new(["123456789"]));
    harness.seed_profile("owner-1", "ada");
    let catalog = ContentCatalog::new(harness.env.clone());

    let item = catalog
        .create(draft("Rust basics", true), &image(), &video(), &|_| {})
        .await
        .unwrap();

    assert_eq!(item.owner_username, "ada");
    assert!(item.is_private);
    assert_eq!(item.access_code.as_ref().unwrap().as_str(), "123456789");
    assert_eq!(item.created_at.as_millis(), 1_735_689_600_000);
    assert!(harness.blobs.contains(item.preview_locator.as_ref().unwrap()));
    assert!(harness.blobs.contains(item.media_locator.as_ref().unwrap()));
    assert_eq!(harness.stored_item(&item.id), Some(item));
}

#[tokio::test]
async fn public_item_has_no_code() {
    let harness = Harness::new();
    harness.seed_profile("owner-1", "ada");
    let catalog = ContentCatalog::new(harness.env.clone());

    let item = catalog
        .create(draft("Rust basics", false), &image(), &video(), &|_| {})
        .await
        .unwrap();

    assert!(item.access_code.is_none());
    assert_eq!(harness.documents.call_count(Op::Query, "contentItems"), 0);
}

#[tokio::test]
async fn unknown_owner_uploads_nothing() {
    let harness = Harness::new();
    let catalog = ContentCatalog::new(harness.env.clone());

    let err = catalog
        .create(draft("Rust basics", false), &image(), &video(), &|_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound { kind: "profile", .. }));
    assert_eq!(harness.blobs.upload_count(), 0);
    assert!(harness.documents.is_empty("contentItems"));
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let harness = Harness::new();
    let catalog = ContentCatalog::new(harness.env.clone());

    let err = catalog
        .create(draft("  ", false), &image(), &video(), &|_| {})
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(harness.documents.call_count(Op::Get, "users"), 0);
}

#[tokio::test]
async fn edit_toggles_privacy_and_keeps_identity() {
    let harness = Harness::new().with_codes(ScriptedCodeGenerator::new(["111111111"]));
    let original = content_item("course-1", 42);
    harness.seed_item(&original);
    let catalog = ContentCatalog::new(harness.env.clone());

    let private = catalog
        .edit("course-1", edit_of(&original, true), None, None, &|_| {})
        .await
        .unwrap();
    assert_eq!(private.access_code.as_ref().unwrap().as_str(), "111111111");
    assert_eq!(private.id, original.id);
    assert_eq!(private.owner_id, original.owner_id);
    assert_eq!(private.created_at, original.created_at);

    // Staying private keeps the code.
    let mut renamed = edit_of(&private, true);
    renamed.title = "Renamed".to_string();
    let still_private = catalog
        .edit("course-1", renamed, None, None, &|_| {})
        .await
        .unwrap();
    assert_eq!(still_private.access_code, private.access_code);
    assert_eq!(still_private.title, "Renamed");

    let public = catalog
        .edit("course-1", edit_of(&still_private, false), None, None, &|_| {})
        .await
        .unwrap();
    assert!(public.access_code.is_none());
    assert_eq!(harness.stored_item("course-1"), Some(public));
}

#[tokio::test]
async fn replaced_media_is_deleted_after_the_write() {
    let harness = Harness::new();
    harness.seed_profile("owner-1", "ada");
    let catalog = ContentCatalog::new(harness.env.clone());
    let item = catalog
        .create(draft("Rust basics", false), &image(), &video(), &|_| {})
        .await
        .unwrap();
    let old_preview = item.preview_locator.clone().unwrap();
    let old_media = item.media_locator.clone().unwrap();

    let updated = catalog
        .edit(&item.id, edit_of(&item, false), None, Some(&video()), &|_| {})
        .await
        .unwrap();

    assert_eq!(updated.preview_locator.as_ref(), Some(&old_preview));
    assert!(harness.blobs.contains(&old_preview));
    assert!(!harness.blobs.contains(&old_media));
    assert!(harness.blobs.contains(updated.media_locator.as_ref().unwrap()));
}

#[tokio::test]
async fn failed_edit_keeps_the_old_media() {
    let harness = Harness::new();
    harness.seed_profile("owner-1", "ada");
    let catalog = ContentCatalog::new(harness.env.clone());
    let item = catalog
        .create(draft("Rust basics", false), &image(), &video(), &|_| {})
        .await
        .unwrap();
    harness.documents.fail_on(
        Op::Set,
        "contentItems",
        None,
        ServiceError::Unavailable("disk full".into()),
    );

    let err = catalog
        .edit(&item.id, edit_of(&item, false), None, Some(&video()), &|_| {})
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::WriteContent));
    assert!(harness.blobs.contains(item.media_locator.as_ref().unwrap()));
    assert_eq!(harness.stored_item(&item.id), Some(item));
}

#[tokio::test]
async fn editing_a_missing_item_is_not_found() {
    let harness = Harness::new();
    let catalog = ContentCatalog::new(harness.env.clone());

    let edit = ContentEdit {
        title: "Ghost".to_string(),
        ..ContentEdit::default()
    };

    let err = catalog
        .edit("ghost", edit, None, None, &|_| {})
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::NotFound {
            kind: "content item",
            id: "ghost".to_string(),
        }
    );
}

#[tokio::test]
async fn delete_removes_blobs_record_and_bookmarks() {
    let harness = Harness::new();
    harness.seed_profile("owner-1", "ada");
    let catalog = ContentCatalog::new(harness.env.clone());
    let bookmarks = Bookmarks::new(harness.env.clone());
    let item = catalog
        .create(draft("Rust basics", false), &image(), &video(), &|_| {})
        .await
        .unwrap();
    bookmarks
        .save(BookmarkKind::Content, "reader-1", &item.id)
        .await
        .unwrap();
    bookmarks
        .save(BookmarkKind::Content, "reader-2", &item.id)
        .await
        .unwrap();

    catalog.delete(&item.id).await.unwrap();

    assert!(harness.blobs.paths().is_empty());
    assert_eq!(harness.stored_item(&item.id), None);
    assert!(harness.documents.is_empty("savedContent"));
    assert!(
        !bookmarks
            .is_saved(BookmarkKind::Content, "reader-1", &item.id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn failed_document_delete_keeps_the_blobs() {
    let harness = Harness::new();
    harness.seed_profile("owner-1", "ada");
    let catalog = ContentCatalog::new(harness.env.clone());
    let item = catalog
        .create(draft("Rust basics", false), &image(), &video(), &|_| {})
        .await
        .unwrap();
    harness.documents.fail_on(
        Op::Delete,
        "contentItems",
        None,
        ServiceError::Unavailable("offline".into()),
    );

    let err = catalog.delete(&item.id).await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::DeleteContent));
    assert_eq!(harness.stored_item(&item.id), Some(item.clone()));
    assert!(harness.blobs.contains(item.preview_locator.as_ref().unwrap()));
    assert!(harness.blobs.contains(item.media_locator.as_ref().unwrap()));
}

#[tokio::test]
async fn delete_survives_blob_failures() {
    let harness = Harness::new();
    harness.seed_item(&content_item("course-1", 0));
    // The seeded locators point at blobs that were never uploaded.
    let catalog = ContentCatalog::new(harness.env.clone());

    catalog.delete("course-1").await.unwrap();

    assert!(harness.documents.is_empty("contentItems"));
}

#[tokio::test]
async fn listings_filter_and_sort() {
    let harness = Harness::new();
    let mut old = content_item("old", 1);
    old.title = "Intro to Rust".to_string();
    let mut new = content_item("new", 3);
    new.title = "Advanced Rust".to_string();
    let mut cooking = content_item("cooking", 2);
    cooking.title = "Pasta".to_string();
    cooking.category = "cooking".to_string();
    cooking.owner_id = "owner-2".to_string();
    cooking.owner_username = "bob".to_string();
    let mut hidden = content_item("hidden", 4);
    hidden.title = "Secret Rust".to_string();
    hidden.is_private = true;
    hidden.access_code = Some(coursehub_core::AccessCode::parse("123456789", 9).unwrap());
    for item in [&old, &new, &cooking, &hidden] {
        harness.seed_item(item);
    }
    let catalog = ContentCatalog::new(harness.env.clone());
    let ids = |items: Vec<ContentItem>| items.into_iter().map(|i| i.id).collect::<Vec<_>>();

    assert_eq!(ids(catalog.list_public().await.unwrap()), vec!["new", "cooking", "old"]);
    assert_eq!(
        ids(catalog.list_by_owner("owner-1").await.unwrap()),
        vec!["hidden", "new", "old"]
    );
    assert_eq!(
        ids(catalog.list_by_category("programming").await.unwrap()),
        vec!["new", "old"]
    );
    assert_eq!(ids(catalog.search("RUST").await.unwrap()), vec!["new", "old"]);
    assert_eq!(ids(catalog.search("bob").await.unwrap()), vec!["cooking"]);
    assert_eq!(ids(catalog.search("  ").await.unwrap()).len(), 3);
}
