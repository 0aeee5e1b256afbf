//! Collection editing.
//!
//! Membership changes are read-modify-write cycles against the document
//! store, not transactions: two concurrent edits of the same collection can
//! overwrite each other, and the last write wins.

use crate::access_code::AccessCodeAllocator;
use crate::catalog::remove_bookmarks_of;
use crate::environment::ServiceEnvironment;
use crate::playlist::PlaylistAggregator;
use crate::records;
use coursehub_core::constants::{COLLECTIONS, SAVED_COLLECTIONS, USERS, fields};
use coursehub_core::{AccessCodeKind, Collection, ContentItem, Error, Profile, Result, Stage};
use serde_json::Value;

/// What a caller supplies to create a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCollection {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Owning account id.
    pub owner_id: String,
    /// Initial members, in display order. Repeats are dropped.
    pub item_ids: Vec<String>,
    /// Reachable only through an access code.
    pub is_private: bool,
}

/// Editable fields of an existing collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionEdit {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Reachable only through an access code.
    pub is_private: bool,
}

/// A collection together with its resolved items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCollection {
    /// The collection record.
    pub collection: Collection,
    /// Its items in display order, unavailable ones elided.
    pub items: Vec<ContentItem>,
}

/// Collection service.
#[derive(Debug, Clone)]
pub struct CollectionService {
    env: ServiceEnvironment,
    codes: AccessCodeAllocator,
    aggregator: PlaylistAggregator,
}

impl CollectionService {
    /// Create the service.
    #[must_use]
    pub fn new(env: ServiceEnvironment) -> Self {
        Self {
            codes: AccessCodeAllocator::new(env.clone()),
            aggregator: PlaylistAggregator::new(env.clone()),
            env,
        }
    }

    /// Create a collection.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: empty title or owner
    /// - [`Error::NotFound`]: the owner has no profile
    /// - [`Error::Remote`]: a read, probe or the write failed
    #[tracing::instrument(skip_all, fields(owner_id = %draft.owner_id))]
    pub async fn create(&self, draft: NewCollection) -> Result<Collection> {
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
            .code_for(AccessCodeKind::Collection, draft.is_private, None)
            .await?;

        let mut collection = Collection {
            id: self.env.ids.next_id(),
            title: draft.title,
            description: draft.description,
            owner_id: owner.id,
            owner_username: owner.username,
            ordered_item_ids: draft.item_ids,
            created_at: self.env.clock.now().into(),
            is_private: draft.is_private,
            access_code,
        };
        collection.dedup_items();

        self.save(&collection).await?;
        tracing::info!(collection_id = %collection.id, "Collection created");
        Ok(collection)
    }

    /// Replace a collection's title, description and privacy.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: empty title
    /// - [`Error::NotFound`]: no such collection
    /// - [`Error::Remote`]: the read, a probe or the write failed
    #[tracing::instrument(skip(self, edit))]
    pub async fn update(&self, id: &str, edit: CollectionEdit) -> Result<Collection> {
        if edit.title.trim().is_empty() {
            return Err(Error::validation("title", "must not be empty"));
        }

        let current = self.get(id).await?;
        let access_code = self
            .codes
            .code_for(AccessCodeKind::Collection, edit.is_private, current.access_code)
            .await?;
        let collection = Collection {
            title: edit.title,
            description: edit.description,
            is_private: edit.is_private,
            access_code,
            ..current
        };

        self.save(&collection).await?;
        Ok(collection)
    }

    /// Delete a collection and every bookmark of it. Its items are untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`]: no such collection
    /// - [`Error::Remote`]: the read or the delete failed
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.get(id).await?;
        self.env
            .documents
            .delete(COLLECTIONS, id)
            .await
            .map_err(|e| Error::remote(Stage::DeleteCollection, &e))?;

        remove_bookmarks_of(&self.env, SAVED_COLLECTIONS, id).await;
        tracing::info!("Collection deleted");
        Ok(())
    }

    /// Append an item. Adding a member again changes nothing and writes nothing.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: empty item id
    /// - [`Error::NotFound`]: no such collection
    /// - [`Error::Remote`]: the read or the write failed
    #[tracing::instrument(skip(self))]
    pub async fn add_item(&self, collection_id: &str, item_id: &str) -> Result<Collection> {
        if item_id.is_empty() {
            return Err(Error::validation("item id", "must not be empty"));
        }
        let mut collection = self.get(collection_id).await?;
        if collection.add_item(item_id) {
            self.save(&collection).await?;
        } else {
            tracing::debug!("Item already in collection");
        }
        Ok(collection)
    }

    /// Remove an item. Removing a non-member changes nothing and writes nothing.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`]: no such collection
    /// - [`Error::Remote`]: the read or the write failed
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, collection_id: &str, item_id: &str) -> Result<Collection> {
        let mut collection = self.get(collection_id).await?;
        if collection.remove_item(item_id) {
            self.save(&collection).await?;
        }
        Ok(collection)
    }

    /// Replace the display order with a permutation of the current members.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: `new_order` is not a permutation of the members
    /// - [`Error::NotFound`]: no such collection
    /// - [`Error::Remote`]: the read or the write failed
    #[tracing::instrument(skip(self, new_order))]
    pub async fn reorder(
        &self,
        collection_id: &str,
        new_order: Vec<String>,
    ) -> Result<Collection> {
        let mut collection = self.get(collection_id).await?;
        collection.reorder(new_order)?;
        self.save(&collection).await?;
        Ok(collection)
    }

    /// Fetch one collection.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`]: no such collection
    /// - [`Error::Remote`] / [`Error::Malformed`]: the read failed
    pub async fn get(&self, id: &str) -> Result<Collection> {
        records::require(
            self.env.documents.as_ref(),
            COLLECTIONS,
            id,
            Stage::ReadCollection,
        )
        .await
    }

    /// Fetch a collection and resolve its items.
    ///
    /// Only reading the collection itself can fail; unavailable items are
    /// elided.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`]: no such collection
    /// - [`Error::Remote`] / [`Error::Malformed`]: the read failed
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, id: &str) -> Result<ResolvedCollection> {
        let collection = self.get(id).await?;
        let items = self.aggregator.resolve_ordered_items(&collection).await;
        Ok(ResolvedCollection { collection, items })
    }

    /// Every public collection, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the query fails.
    pub async fn list_public(&self) -> Result<Vec<Collection>> {
        self.query(fields::IS_PRIVATE, Value::Bool(false)).await
    }

    /// Every collection of one owner, private ones included, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the query fails.
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Collection>> {
        self.query(fields::OWNER_ID, Value::String(owner_id.to_string())).await
    }

    /// Public collections whose title or description contains `text`,
    /// ignoring case. A blank query matches every public collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, text: &str) -> Result<Vec<Collection>> {
        let found = self.list_public().await?;
        Ok(filter_by_text(found, text))
    }

    /// [`search`](Self::search) over one owner's collections, private ones
    /// included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn search_by_owner(&self, owner_id: &str, text: &str) -> Result<Vec<Collection>> {
        let found = self.list_by_owner(owner_id).await?;
        Ok(filter_by_text(found, text))
    }

    async fn query(&self, field: &str, value: Value) -> Result<Vec<Collection>> {
        let mut found: Vec<Collection> = records::find(
            self.env.documents.as_ref(),
            COLLECTIONS,
            field,
            &value,
            Stage::ReadCollection,
        )
        .await?;
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn save(&self, collection: &Collection) -> Result<()> {
        records::save(
            self.env.documents.as_ref(),
            COLLECTIONS,
            collection,
            Stage::WriteCollection,
        )
        .await
    }
}

fn filter_by_text(mut found: Vec<Collection>, text: &str) -> Vec<Collection> {
    let needle = text.trim().to_lowercase();
    if !needle.is_empty() {
        found.retain(|collection| matches_search(collection, &needle));
    }
    found
}

fn matches_search(collection: &Collection, needle: &str) -> bool {
    [&collection.title, &collection.description]
        .iter()
        .any(|text| text.to_lowercase().contains(needle))
}
