//! Domain model.
//!
//! All records are stored as JSON objects with camelCase field names. Point
//! in time fields use [`EpochMillis`] so provider timestamp objects never leak
//! past the storage boundary.

use crate::constants::{self, COLLECTION_CODE_LENGTH, CONTENT_CODE_LENGTH};
use crate::error::{Error, Result};
use crate::providers::{Document, Fields};
use crate::timestamp::EpochMillis;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap a provider-issued id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Retrievable URL of an uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    /// Wrap a URL returned by the blob store.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bytes handed to the upload pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteSource {
    /// MIME type reported to the blob store (`image/*`, `video/*`).
    pub content_type: String,
    /// Payload.
    pub bytes: Vec<u8>,
}

impl ByteSource {
    /// Create a source from raw bytes.
    #[must_use]
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Outcome of one successful artifact upload. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Where the artifact can be retrieved.
    pub locator: Locator,
    /// Uploaded size.
    pub size_bytes: u64,
}

/// Which kind of private record an access code unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessCodeKind {
    /// A private [`ContentItem`].
    Content,
    /// A private [`Collection`].
    Collection,
}

impl AccessCodeKind {
    /// Document collection holding records of this kind.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Content => constants::CONTENT_ITEMS,
            Self::Collection => constants::COLLECTIONS,
        }
    }

    /// Code length used when no configuration overrides it.
    #[must_use]
    pub const fn default_length(self) -> usize {
        match self {
            Self::Content => CONTENT_CODE_LENGTH,
            Self::Collection => COLLECTION_CODE_LENGTH,
        }
    }
}

impl fmt::Display for AccessCodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => f.write_str("content"),
            Self::Collection => f.write_str("collection"),
        }
    }
}

/// A fixed-length numeric shared secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessCode(String);

impl AccessCode {
    /// Parse a code that must be exactly `length` ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the input is empty, has the wrong
    /// length, or contains anything but digits.
    ///
    /// # Examples
    ///
    /// ```
    /// # use coursehub_core::AccessCode;
    /// assert!(AccessCode::parse("123456", 6).is_ok());
    /// assert!(AccessCode::parse("12345", 6).is_err());
    /// assert!(AccessCode::parse("12a456", 6).is_err());
    /// ```
    pub fn parse(raw: &str, length: usize) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::validation("access code", "must not be empty"));
        }
        if raw.len() != length {
            return Err(Error::validation(
                "access code",
                format!("must be {length} digits"),
            ));
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::validation("access code", "must contain only digits"));
        }
        Ok(Self(raw.to_string()))
    }

    /// The code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record stored as one document.
///
/// The collection is chosen by the caller; bookmarks of both kinds share this
/// type.
pub trait StoredRecord: Serialize + DeserializeOwned {
    /// Human-readable kind, used in errors.
    const KIND: &'static str;

    /// Document id.
    fn id(&self) -> &str;

    /// Encode the record into document fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if the record does not serialize to an object.
    fn to_fields(&self) -> Result<Fields> {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => Ok(fields),
            Ok(_) => Err(Error::Malformed {
                kind: Self::KIND,
                id: self.id().to_string(),
                reason: "record is not an object".to_string(),
            }),
            Err(e) => Err(Error::Malformed {
                kind: Self::KIND,
                id: self.id().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Decode a fetched document. The document id wins over any stored `id` field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if the fields do not match the model.
    fn from_document(document: Document) -> Result<Self> {
        let Document { id, mut fields } = document;
        fields.insert("id".to_string(), Value::String(id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|e| Error::Malformed {
            kind: Self::KIND,
            id,
            reason: e.to_string(),
        })
    }
}

/// User profile, keyed by the identity provider's account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Account id.
    pub id: String,
    /// Unique display name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Creation time.
    pub created_at: EpochMillis,
}

impl StoredRecord for Profile {
    const KIND: &'static str = "profile";

    fn id(&self) -> &str {
        &self.id
    }
}

/// A shareable content item (a course) with a preview image and a media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Document id.
    pub id: String,
    /// Title.
    pub title: String,
    /// One-line summary.
    #[serde(default)]
    pub short_summary: String,
    /// Full description.
    #[serde(default)]
    pub long_summary: String,
    /// Owning account id.
    pub owner_id: String,
    /// Owner's username at creation time.
    #[serde(default)]
    pub owner_username: String,
    /// Preview image URL.
    #[serde(default)]
    pub preview_locator: Option<Locator>,
    /// Media file URL.
    #[serde(default)]
    pub media_locator: Option<Locator>,
    /// Category label.
    #[serde(default)]
    pub category: String,
    /// Creation time.
    pub created_at: EpochMillis,
    /// Whether the item is only reachable through its access code.
    #[serde(default)]
    pub is_private: bool,
    /// Present iff `is_private`.
    #[serde(default)]
    pub access_code: Option<AccessCode>,
}

impl ContentItem {
    /// `access_code` is present iff `is_private`.
    #[must_use]
    pub const fn access_code_consistent(&self) -> bool {
        self.is_private == self.access_code.is_some()
    }
}

impl StoredRecord for ContentItem {
    const KIND: &'static str = "content item";

    fn id(&self) -> &str {
        &self.id
    }
}

/// An ordered collection (playlist) of content items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Document id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Owning account id.
    pub owner_id: String,
    /// Owner's username at creation time.
    #[serde(default)]
    pub owner_username: String,
    /// Membership and display order. Never holds duplicates.
    #[serde(default)]
    pub ordered_item_ids: Vec<String>,
    /// Creation time.
    pub created_at: EpochMillis,
    /// Whether the collection is only reachable through its access code.
    #[serde(default)]
    pub is_private: bool,
    /// Present iff `is_private`.
    #[serde(default)]
    pub access_code: Option<AccessCode>,
}

impl Collection {
    /// Append an item. Returns `false` if it was already a member.
    pub fn add_item(&mut self, item_id: &str) -> bool {
        if self.ordered_item_ids.iter().any(|id| id == item_id) {
            return false;
        }
        self.ordered_item_ids.push(item_id.to_string());
        true
    }

    /// Remove an item. Returns `false` if it was not a member.
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let before = self.ordered_item_ids.len();
        self.ordered_item_ids.retain(|id| id != item_id);
        self.ordered_item_ids.len() != before
    }

    /// Replace the display order with a permutation of the current members.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `new_order` adds, drops or repeats an item.
    pub fn reorder(&mut self, new_order: Vec<String>) -> Result<()> {
        let current: HashSet<&str> = self.ordered_item_ids.iter().map(String::as_str).collect();
        let proposed: HashSet<&str> = new_order.iter().map(String::as_str).collect();
        if proposed.len() != new_order.len()
            || new_order.len() != self.ordered_item_ids.len()
            || current != proposed
        {
            return Err(Error::validation(
                "ordered item ids",
                "must be a permutation of the current items",
            ));
        }
        self.ordered_item_ids = new_order;
        Ok(())
    }

    /// Drop repeated ids, keeping the first occurrence.
    pub fn dedup_items(&mut self) {
        let mut seen = HashSet::new();
        self.ordered_item_ids.retain(|id| seen.insert(id.clone()));
    }

    /// `access_code` is present iff `is_private`.
    #[must_use]
    pub const fn access_code_consistent(&self) -> bool {
        self.is_private == self.access_code.is_some()
    }
}

impl StoredRecord for Collection {
    const KIND: &'static str = "collection";

    fn id(&self) -> &str {
        &self.id
    }
}

/// A user's bookmark of a content item or collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Document id.
    pub id: String,
    /// Bookmarking user.
    pub user_id: String,
    /// Bookmarked content item or collection id.
    pub target_id: String,
    /// When it was saved.
    pub saved_at: EpochMillis,
}

impl StoredRecord for Bookmark {
    const KIND: &'static str = "bookmark";

    fn id(&self) -> &str {
        &self.id
    }
}
