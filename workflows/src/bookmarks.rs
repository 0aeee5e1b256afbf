//! Per-user bookmarks of content items and collections.
//!
//! A bookmark's document id is derived from the user and the target, so
//! saving twice rewrites nothing and unsaving needs no query. The user id is
//! length-prefixed, which keeps `("a_b", "c")` and `("a", "b_c")` apart.

use crate::environment::ServiceEnvironment;
use crate::playlist::PlaylistAggregator;
use crate::records;
use coursehub_core::constants::{
    COLLECTIONS, CONTENT_ITEMS, SAVED_COLLECTIONS, SAVED_CONTENT, fields,
};
use coursehub_core::{Bookmark, Collection, ContentItem, Error, Result, Stage};
use serde_json::Value;
use std::fmt;

/// What a bookmark points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookmarkKind {
    /// A content item.
    Content,
    /// A collection.
    Collection,
}

impl BookmarkKind {
    /// Document collection holding this kind of bookmark.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Content => SAVED_CONTENT,
            Self::Collection => SAVED_COLLECTIONS,
        }
    }
}

impl fmt::Display for BookmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Content => "content",
            Self::Collection => "collection",
        })
    }
}

/// Bookmark service.
#[derive(Debug, Clone)]
pub struct Bookmarks {
    env: ServiceEnvironment,
    aggregator: PlaylistAggregator,
}

impl Bookmarks {
    /// Create the service.
    #[must_use]
    pub fn new(env: ServiceEnvironment) -> Self {
        Self {
            aggregator: PlaylistAggregator::new(env.clone()),
            env,
        }
    }

    /// Bookmark `target_id` for `user_id`. Saving again keeps the original.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: empty user or target id
    /// - [`Error::Remote`]: the read or the write failed
    #[tracing::instrument(skip(self), fields(kind = %kind))]
    pub async fn save(
        &self,
        kind: BookmarkKind,
        user_id: &str,
        target_id: &str,
    ) -> Result<Bookmark> {
        let id = bookmark_id(user_id, target_id)?;
        if let Some(existing) = self.load(kind, &id, user_id, target_id).await? {
            return Ok(existing);
        }

        let bookmark = Bookmark {
            id,
            user_id: user_id.to_string(),
            target_id: target_id.to_string(),
            saved_at: self.env.clock.now().into(),
        };
        records::save(
            self.env.documents.as_ref(),
            kind.collection(),
            &bookmark,
            Stage::Bookmark,
        )
        .await?;
        Ok(bookmark)
    }

    /// Remove a bookmark. Returns whether there was one.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: empty user or target id
    /// - [`Error::Remote`]: the read or the delete failed
    #[tracing::instrument(skip(self), fields(kind = %kind))]
    pub async fn unsave(
        &self,
        kind: BookmarkKind,
        user_id: &str,
        target_id: &str,
    ) -> Result<bool> {
        let id = bookmark_id(user_id, target_id)?;
        if self.load(kind, &id, user_id, target_id).await?.is_none() {
            return Ok(false);
        }
        self.env
            .documents
            .delete(kind.collection(), &id)
            .await
            .map_err(|e| Error::remote(Stage::Bookmark, &e))?;
        Ok(true)
    }

    /// Whether `user_id` has bookmarked `target_id`.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: empty user or target id
    /// - [`Error::Remote`]: the read failed
    pub async fn is_saved(
        &self,
        kind: BookmarkKind,
        user_id: &str,
        target_id: &str,
    ) -> Result<bool> {
        let id = bookmark_id(user_id, target_id)?;
        Ok(self.load(kind, &id, user_id, target_id).await?.is_some())
    }

    /// Bookmarked content items, most recently saved first.
    ///
    /// Items that no longer exist or fail to load are elided.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the bookmark query fails.
    #[tracing::instrument(skip(self))]
    pub async fn saved_content(&self, user_id: &str) -> Result<Vec<ContentItem>> {
        let ids = self.saved_ids(BookmarkKind::Content, user_id).await?;
        Ok(self
            .aggregator
            .resolve::<ContentItem>(CONTENT_ITEMS, Stage::ReadContent, &ids)
            .await)
    }

    /// Bookmarked collections, most recently saved first.
    ///
    /// Collections that no longer exist or fail to load are elided.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the bookmark query fails.
    #[tracing::instrument(skip(self))]
    pub async fn saved_collections(&self, user_id: &str) -> Result<Vec<Collection>> {
        let ids = self.saved_ids(BookmarkKind::Collection, user_id).await?;
        Ok(self
            .aggregator
            .resolve::<Collection>(COLLECTIONS, Stage::ReadCollection, &ids)
            .await)
    }

    async fn saved_ids(&self, kind: BookmarkKind, user_id: &str) -> Result<Vec<String>> {
        let mut saved: Vec<Bookmark> = records::find(
            self.env.documents.as_ref(),
            kind.collection(),
            fields::USER_ID,
            &Value::String(user_id.to_string()),
            Stage::Bookmark,
        )
        .await?;
        saved.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(saved.into_iter().map(|bookmark| bookmark.target_id).collect())
    }

    /// The bookmark stored under `id`, if it belongs to this user and target.
    async fn load(
        &self,
        kind: BookmarkKind,
        id: &str,
        user_id: &str,
        target_id: &str,
    ) -> Result<Option<Bookmark>> {
        let found: Option<Bookmark> = records::load(
            self.env.documents.as_ref(),
            kind.collection(),
            id,
            Stage::Bookmark,
        )
        .await?;
        Ok(found.filter(|bookmark| {
            bookmark.user_id == user_id && bookmark.target_id == target_id
        }))
    }
}

fn bookmark_id(user_id: &str, target_id: &str) -> Result<String> {
    if user_id.is_empty() {
        return Err(Error::validation("user id", "must not be empty"));
    }
    if target_id.is_empty() {
        return Err(Error::validation("target id", "must not be empty"));
    }
    Ok(format!("{}_{user_id}_{target_id}", user_id.len()))
}
