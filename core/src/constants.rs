//! Document collection and field names.

/// Profiles, keyed by account id.
pub const USERS: &str = "users";

/// Content items.
pub const CONTENT_ITEMS: &str = "contentItems";

/// Collections (playlists).
pub const COLLECTIONS: &str = "collections";

/// Per-user content bookmarks.
pub const SAVED_CONTENT: &str = "savedContent";

/// Per-user collection bookmarks.
pub const SAVED_COLLECTIONS: &str = "savedCollections";

/// Field names queried by the orchestration layer.
pub mod fields {
    /// `Profile::username`
    pub const USERNAME: &str = "username";
    /// `ContentItem::access_code` / `Collection::access_code`
    pub const ACCESS_CODE: &str = "accessCode";
    /// `ContentItem::is_private` / `Collection::is_private`
    pub const IS_PRIVATE: &str = "isPrivate";
    /// `ContentItem::owner_id` / `Collection::owner_id`
    pub const OWNER_ID: &str = "ownerId";
    /// `ContentItem::category`
    pub const CATEGORY: &str = "category";
    /// `Bookmark::user_id`
    pub const USER_ID: &str = "userId";
    /// `Bookmark::target_id`
    pub const TARGET_ID: &str = "targetId";
}

/// Default upload ceiling: 5 GiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// Access-code length for private content items.
pub const CONTENT_CODE_LENGTH: usize = 9;

/// Access-code length for private collections.
pub const COLLECTION_CODE_LENGTH: usize = 6;
