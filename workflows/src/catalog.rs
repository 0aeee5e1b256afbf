//! Content catalog: creating, editing, deleting and listing content items.
//!
//! Creation and editing go through the [`UploadPipeline`]; a private item gets
//! its access code from the [`AccessCodeAllocator`] before any upload starts.

use crate::access_code::AccessCodeAllocator;
use crate::environment::ServiceEnvironment;
use crate::records;
use crate::upload::{self, ProgressSink, UploadPipeline};
use coursehub_core::constants::{CONTENT_ITEMS, SAVED_CONTENT, USERS, fields};
use coursehub_core::{
    AccessCodeKind, Bookmark, ByteSource, ContentItem, Error, Profile, Result, Stage,
};
use futures::future::join_all;
use serde_json::Value;

/// What a caller supplies to create a content item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContent {
    /// Title.
    pub title: String,
    /// One-line summary.
    pub short_summary: String,
    /// Full description.
    pub long_summary: String,
    /// Category label.
    pub category: String,
    /// Owning account id.
    pub owner_id: String,
    /// Reachable only through an access code.
    pub is_private: bool,
}

/// Editable fields of an existing content item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentEdit {
    /// Title.
    pub title: String,
    /// One-line summary.
    pub short_summary: String,
    /// Full description.
    pub long_summary: String,
    /// Category label.
    pub category: String,
    /// Reachable only through an access code.
    pub is_private: bool,
}

/// Content catalog.
#[derive(Debug, Clone)]
pub struct ContentCatalog {
    env: ServiceEnvironment,
    pipeline: UploadPipeline,
    codes: AccessCodeAllocator,
}

impl ContentCatalog {
    /// Create the catalog.
    #[must_use]
    pub fn new(env: ServiceEnvironment) -> Self {
        Self {
            pipeline: UploadPipeline::new(env.clone()),
            codes: AccessCodeAllocator::new(env.clone()),
            env,
        }
    }

    /// Create a content item with both artifacts.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: empty title or owner
    /// - [`Error::NotFound`]: the owner has no profile
    /// - anything the allocator or the pipeline reports
    #[tracing::instrument(skip_all, fields(owner_id = %draft.owner_id))]
    pub async fn create(
        &self,
        draft: NewContent,
        preview: &ByteSource,
        media: &ByteSource,
        progress: &ProgressSink,
    ) -> Result<ContentItem> {
        if draft.title.trim().is_empty() {
            return Err(Error::validation("title", "must not be empty"));
        }
        if draft.owner_id.is_empty() {
            return Err(Error::validation("owner", "must not be empty"));
        }

        let owner: Profile = records::require(
            self.env.documents.as_ref(),
            USERS,
            &draft.owner_id,
            Stage::ReadProfile,
        )
        .await?;
        let access_code = self
            .codes
            .code_for(AccessCodeKind::Content, draft.is_private, None)
            .await?;

        let record = ContentItem {
            id: self.env.ids.next_id(),
            title: draft.title,
            short_summary: draft.short_summary,
            long_summary: draft.long_summary,
            owner_id: owner.id,
            owner_username: owner.username,
            preview_locator: None,
            media_locator: None,
            category: draft.category,
            created_at: self.env.clock.now().into(),
            is_private: draft.is_private,
            access_code,
        };

        self.pipeline
            .create_or_update(record, Some(preview), Some(media), progress)
            .await
    }

    /// Edit a content item, optionally replacing its artifacts.
    ///
    /// The id, owner and creation time are kept. Turning an item private mints
    /// a code; turning it public drops the code; a private item keeps its code.
    /// Replaced blobs are deleted on a best-effort basis once the new record is
    /// written.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: empty title
    /// - [`Error::NotFound`]: no such item
    /// - anything the allocator or the pipeline reports
    #[tracing::instrument(skip(self, edit, preview, media, progress))]
    pub async fn edit(
        &self,
        id: &str,
        edit: ContentEdit,
        preview: Option<&ByteSource>,
        media: Option<&ByteSource>,
        progress: &ProgressSink,
    ) -> Result<ContentItem> {
        if edit.title.trim().is_empty() {
            return Err(Error::validation("title", "must not be empty"));
        }

        let current = self.get(id).await?;
        let access_code = self
            .codes
            .code_for(
                AccessCodeKind::Content,
                edit.is_private,
                current.access_code.clone(),
            )
            .await?;

        let record = ContentItem {
            title: edit.title,
            short_summary: edit.short_summary,
            long_summary: edit.long_summary,
            category: edit.category,
            is_private: edit.is_private,
            access_code,
            ..current.clone()
        };

        let updated = self
            .pipeline
            .create_or_update(record, preview, media, progress)
            .await?;

        let replaced = [
            (&current.preview_locator, &updated.preview_locator),
            (&current.media_locator, &updated.media_locator),
        ]
        .into_iter()
        .filter_map(|(old, new)| old.as_ref().filter(|old| Some(*old) != new.as_ref()));
        join_all(replaced.map(|old| upload::discard(&self.env, old))).await;
        Ok(updated)
    }

    /// Delete a content item, its blobs and every bookmark of it.
    ///
    /// The document goes first, so a failed delete leaves a record whose
    /// blobs still exist. Blob and bookmark removal afterwards is best-effort.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`]: no such item
    /// - [`Error::Remote`]: the read or the document delete failed
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let current = self.get(id).await?;

        self.env
            .documents
            .delete(CONTENT_ITEMS, id)
            .await
            .map_err(|e| Error::remote(Stage::DeleteContent, &e))?;

        join_all(
            [&current.preview_locator, &current.media_locator]
                .into_iter()
                .flatten()
                .map(|locator| upload::discard(&self.env, locator)),
        )
        .await;
        remove_bookmarks_of(&self.env, SAVED_CONTENT, id).await;
        tracing::info!("Content item deleted");
        Ok(())
    }

    /// Fetch one content item.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`]: no such item
    /// - [`Error::Remote`] / [`Error::Malformed`]: the read failed
    pub async fn get(&self, id: &str) -> Result<ContentItem> {
        records::require(
            self.env.documents.as_ref(),
            CONTENT_ITEMS,
            id,
            Stage::ReadContent,
        )
        .await
    }

    /// Every public item, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the query fails.
    pub async fn list_public(&self) -> Result<Vec<ContentItem>> {
        let items = self.query(fields::IS_PRIVATE, Value::Bool(false)).await?;
        Ok(newest_first(items))
    }

    /// Every item of one owner, private ones included, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the query fails.
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ContentItem>> {
        let items = self
            .query(fields::OWNER_ID, Value::String(owner_id.to_string()))
            .await?;
        Ok(newest_first(items))
    }

    /// Public items of one category, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the query fails.
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<ContentItem>> {
        let mut items = self
            .query(fields::CATEGORY, Value::String(category.to_string()))
            .await?;
        items.retain(|item| !item.is_private);
        Ok(newest_first(items))
    }

    /// Public items whose title, summaries or owner username contain `text`,
    /// ignoring case. A blank query matches everything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, text: &str) -> Result<Vec<ContentItem>> {
        let needle = text.trim().to_lowercase();
        let mut items = self.list_public().await?;
        if !needle.is_empty() {
            items.retain(|item| matches_search(item, &needle));
        }
        Ok(items)
    }

    async fn query(&self, field: &str, value: Value) -> Result<Vec<ContentItem>> {
        records::find(
            self.env.documents.as_ref(),
            CONTENT_ITEMS,
            field,
            &value,
            Stage::ReadContent,
        )
        .await
    }
}

/// Delete every bookmark pointing at `target_id`, logging failures.
pub(crate) async fn remove_bookmarks_of(
    env: &ServiceEnvironment,
    bookmarks: &str,
    target_id: &str,
) {
    let found: Result<Vec<Bookmark>> = records::find(
        env.documents.as_ref(),
        bookmarks,
        fields::TARGET_ID,
        &Value::String(target_id.to_string()),
        Stage::Bookmark,
    )
    .await;

    match found {
        Ok(found) => {
            for bookmark in found {
                if let Err(err) = env.documents.delete(bookmarks, &bookmark.id).await {
                    tracing::warn!(
                        bookmark_id = %bookmark.id,
                        error = %err,
                        "Could not remove bookmark"
                    );
                }
            }
        }
        Err(err) => {
            tracing::warn!(target_id, error = %err, "Could not look up bookmarks to remove");
        }
    }
}

fn newest_first(mut items: Vec<ContentItem>) -> Vec<ContentItem> {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items
}

fn matches_search(item: &ContentItem, needle: &str) -> bool {
    [
        &item.title,
        &item.short_summary,
        &item.long_summary,
        &item.owner_username,
    ]
    .iter()
    .any(|text| text.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursehub_core::EpochMillis;

    fn item(id: &str, created_at: i64) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            title: format!("Title {id}"),
            short_summary: String::new(),
            long_summary: String::new(),
            owner_id: "owner".to_string(),
            owner_username: "Ada".to_string(),
            preview_locator: None,
            media_locator: None,
            category: String::new(),
            created_at: EpochMillis::new(created_at),
            is_private: false,
            access_code: None,
        }
    }

    #[test]
    fn listings_are_newest_first() {
        let sorted = newest_first(vec![item("a", 1), item("b", 3), item("c", 2)]);
        let ids: Vec<&str> = sorted.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn search_ignores_case_and_checks_owner() {
        let course = item("rust", 0);
        assert!(matches_search(&course, "title r"));
        assert!(matches_search(&course, "ada"));
        assert!(!matches_search(&course, "python"));
    }
}
