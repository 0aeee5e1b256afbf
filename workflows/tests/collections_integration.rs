//! Integration tests for collection editing.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{Harness, content_item};
use coursehub_core::{Error, ServiceError, Stage};
use coursehub_testing::{Op, ScriptedCodeGenerator};
use coursehub_workflows::{
    BookmarkKind, Bookmarks, CollectionEdit, CollectionService, NewCollection,
};

fn draft(items: &[&str], is_private: bool) -> NewCollection {
    NewCollection {
        title: "Rust from scratch".to_string(),
        description: "Start here".to_string(),
        owner_id: "owner-1".to_string(),
        item_ids: items.iter().map(ToString::to_string).collect(),
        is_private,
    }
}

fn order(ids: &[&str]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn create_dedups_items_and_copies_the_owner() {
    let harness = Harness::new();
    harness.seed_profile("owner-1", "ada");
    let service = CollectionService::new(harness.env.clone());

    let collection = service.create(draft(&["a", "b", "a"], false)).await.unwrap();

    assert_eq!(collection.ordered_item_ids, order(&["a", "b"]));
    assert_eq!(collection.owner_username, "ada");
    assert!(collection.access_code.is_none());
    assert_eq!(service.get(&collection.id).await.unwrap(), collection);
}

#[tokio::test]
async fn private_collection_gets_a_six_digit_code() {
    let harness = Harness::new().with_codes(ScriptedCodeGenerator::new(["654321"]));
    harness.seed_profile("owner-1", "ada");
    let service = CollectionService::new(harness.env.clone());

    let collection = service.create(draft(&[], true)).await.unwrap();

    assert_eq!(collection.access_code.unwrap().as_str(), "654321");
}

#[tokio::test]
async fn create_requires_an_existing_owner() {
    let harness = Harness::new();
    let service = CollectionService::new(harness.env.clone());

    let err = service.create(draft(&["a"], false)).await.unwrap_err();

    assert!(matches!(err, Error::NotFound { kind: "profile", .. }));
    assert!(harness.documents.is_empty("collections"));
}

#[tokio::test]
async fn membership_edits() {
    let harness = Harness::new();
    harness.seed_profile("owner-1", "ada");
    let service = CollectionService::new(harness.env.clone());
    let id = service.create(draft(&["a", "b"], false)).await.unwrap().id;
    let writes = || harness.documents.call_count(Op::Set, "collections");
    assert_eq!(writes(), 1);

    let added = service.add_item(&id, "c").await.unwrap();
    assert_eq!(added.ordered_item_ids, order(&["a", "b", "c"]));
    assert_eq!(writes(), 2);

    // A duplicate is accepted without a write.
    let unchanged = service.add_item(&id, "a").await.unwrap();
    assert_eq!(unchanged.ordered_item_ids, order(&["a", "b", "c"]));
    assert_eq!(writes(), 2);

    let removed = service.remove_item(&id, "b").await.unwrap();
    assert_eq!(removed.ordered_item_ids, order(&["a", "c"]));
    assert_eq!(writes(), 3);

    let reordered = service.reorder(&id, order(&["c", "a"])).await.unwrap();
    assert_eq!(reordered.ordered_item_ids, order(&["c", "a"]));
    assert_eq!(service.get(&id).await.unwrap(), reordered);

    assert!(service.add_item(&id, "").await.unwrap_err().is_validation());
}

#[tokio::test]
async fn reorder_must_be_a_permutation() {
    let harness = Harness::new();
    harness.seed_profile("owner-1", "ada");
    let service = CollectionService::new(harness.env.clone());
    let id = service.create(draft(&["a", "b"], false)).await.unwrap().id;

    for bad in [
        order(&["a"]),
        order(&["a", "b", "c"]),
        order(&["a", "a"]),
        order(&["a", "z"]),
    ] {
        let err = service.reorder(&id, bad.clone()).await.unwrap_err();
        assert!(err.is_validation(), "{bad:?}");
    }
    assert_eq!(harness.documents.call_count(Op::Set, "collections"), 1);
}

#[tokio::test]
async fn update_toggles_privacy() {
    let harness = Harness::new().with_codes(ScriptedCodeGenerator::new(["111111"]));
    harness.seed_profile("owner-1", "ada");
    let service = CollectionService::new(harness.env.clone());
    let created = service.create(draft(&["a"], false)).await.unwrap();

    let private = service
        .update(
            &created.id,
            CollectionEdit {
                title: "Hidden".to_string(),
                description: String::new(),
                is_private: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(private.access_code.as_ref().unwrap().as_str(), "111111");
    assert_eq!(private.ordered_item_ids, created.ordered_item_ids);
    assert_eq!(private.created_at, created.created_at);

    let public = service
        .update(
            &created.id,
            CollectionEdit {
                title: "Visible".to_string(),
                description: String::new(),
                is_private: false,
            },
        )
        .await
        .unwrap();
    assert!(public.access_code.is_none());
}

#[tokio::test]
async fn resolve_elides_missing_items() {
    let harness = Harness::new();
    harness.seed_profile("owner-1", "ada");
    harness.seed_item(&content_item("a", 0));
    harness.seed_item(&content_item("c", 0));
    let service = CollectionService::new(harness.env.clone());
    let id = service.create(draft(&["c", "gone", "a"], false)).await.unwrap().id;

    let resolved = service.resolve(&id).await.unwrap();

    let ids: Vec<&str> = resolved.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a"]);
    assert_eq!(resolved.collection.ordered_item_ids.len(), 3);
}

#[tokio::test]
async fn write_failure_is_reported() {
    let harness = Harness::new();
    harness.seed_profile("owner-1", "ada");
    harness.documents.fail_on(
        Op::Set,
        "collections",
        None,
        ServiceError::Unavailable("disk full".into()),
    );
    let service = CollectionService::new(harness.env.clone());

    let err = service.create(draft(&["a"], false)).await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::WriteCollection));
}

#[tokio::test]
async fn delete_removes_bookmarks() {
    let harness = Harness::new();
    harness.seed_profile("owner-1", "ada");
    let service = CollectionService::new(harness.env.clone());
    let bookmarks = Bookmarks::new(harness.env.clone());
    let id = service.create(draft(&["a"], false)).await.unwrap().id;
    bookmarks
        .save(BookmarkKind::Collection, "reader-1", &id)
        .await
        .unwrap();

    service.delete(&id).await.unwrap();

    assert!(harness.documents.is_empty("collections"));
    assert!(harness.documents.is_empty("savedCollections"));
    assert!(matches!(
        service.delete(&id).await,
        Err(Error::NotFound { kind: "collection", .. })
    ));
}

#[tokio::test]
async fn listings_are_newest_first() {
    let harness = Harness::new();
    harness.seed_profile("owner-1", "ada");
    harness.seed_profile("owner-2", "bob");
    let service = CollectionService::new(harness.env.clone());
    let mut first = service.create(draft(&[], false)).await.unwrap();
    first.created_at = coursehub_core::EpochMillis::new(1);
    harness.seed("collections", &first);
    let mut second = draft(&[], true);
    second.owner_id = "owner-2".to_string();
    let second = service.create(second).await.unwrap();
    let third = service.create(draft(&[], false)).await.unwrap();

    let public: Vec<String> = service
        .list_public()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(public, vec![third.id.clone(), first.id.clone()]);

    let owned: Vec<String> = service
        .list_by_owner("owner-2")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(owned, vec![second.id]);
}

#[tokio::test]
async fn search_matches_title_and_description() {
    let harness = Harness::new().with_codes(ScriptedCodeGenerator::new(["222222"]));
    harness.seed_profile("owner-1", "ada");
    harness.seed_profile("owner-2", "bob");
    let service = CollectionService::new(harness.env.clone());
    let rust = service.create(draft(&[], false)).await.unwrap();
    let mut pasta = draft(&[], false);
    pasta.title = "Pasta nights".to_string();
    pasta.description = "Weekday dinners".to_string();
    pasta.owner_id = "owner-2".to_string();
    let pasta = service.create(pasta).await.unwrap();
    let mut hidden = draft(&[], true);
    hidden.title = "Rust internals".to_string();
    let hidden = service.create(hidden).await.unwrap();
    let ids = |found: Vec<coursehub_core::Collection>| {
        found.into_iter().map(|c| c.id).collect::<Vec<_>>()
    };

    assert_eq!(ids(service.search("RUST").await.unwrap()), vec![rust.id.clone()]);
    assert_eq!(ids(service.search("dinners").await.unwrap()), vec![pasta.id.clone()]);
    assert_eq!(service.search("  ").await.unwrap().len(), 2);
    assert!(service.search("python").await.unwrap().is_empty());

    let mut owned = ids(service.search_by_owner("owner-1", "rust").await.unwrap());
    owned.sort();
    let mut expected = vec![rust.id, hidden.id];
    expected.sort();
    assert_eq!(owned, expected);
    assert!(
        service
            .search_by_owner("owner-2", "rust")
            .await
            .unwrap()
            .is_empty()
    );
}
