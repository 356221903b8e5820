use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use crate::bson_datetime;

/// Login of the built-in account used for unauthenticated calls
pub const ANONYMOUS_USER: &str = "anonymoususer";

pub const DEFAULT_LANG_KEY: &str = "en";

/// Collection holding [`User`] documents
pub const USERS_COLLECTION: &str = "users";

/// Collection holding [`LineVersionRating`] documents
pub const RATINGS_COLLECTION: &str = "line_version_rating";

fn default_lang_key() -> String {
    DEFAULT_LANG_KEY.to_string()
}

pub(crate) fn new_document_id() -> String {
    Uuid::now_v7().to_string()
}

/// Account document
///
/// `reset_key` and `reset_date` are set and cleared together, only through
/// [`User::begin_password_reset`] and [`User::finish_password_reset`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Assigned by the store on first save
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Unique, stored lowercased
    pub login: String,
    /// Argon2 PHC string
    #[serde(rename = "password")]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Unique, stored lowercased
    pub email: String,
    #[serde(default)]
    pub activated: bool,
    #[serde(default = "default_lang_key")]
    pub lang_key: String,
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "bson_datetime::optional")]
    pub reset_date: Option<DateTime<Utc>>,
    #[serde(with = "bson_datetime")]
    pub created_date: DateTime<Utc>,
    #[serde(with = "bson_datetime")]
    pub last_modified_date: DateTime<Utc>,
}

/// Where a user stands in the password reset flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetState {
    NoResetPending,
    ResetPending,
}

impl User {
    /// A new, not yet activated account
    pub fn new(
        login: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            login: login.into().to_lowercase(),
            password_hash: password_hash.into(),
            first_name: None,
            last_name: None,
            email: email.into().to_lowercase(),
            activated: false,
            lang_key: default_lang_key(),
            image_url: None,
            reset_key: None,
            reset_date: None,
            created_date: now,
            last_modified_date: now,
        }
    }

    pub fn reset_state(&self) -> ResetState {
        match (&self.reset_key, &self.reset_date) {
            (Some(_), Some(_)) => ResetState::ResetPending,
            _ => ResetState::NoResetPending,
        }
    }

    /// Store a freshly issued key, replacing any pending one
    pub fn begin_password_reset(&mut self, reset_key: String, issued_at: DateTime<Utc>) {
        self.reset_key = Some(reset_key);
        self.reset_date = Some(issued_at);
    }

    /// Install the new password hash and consume the pending key
    pub fn finish_password_reset(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.reset_key = None;
        self.reset_date = None;
    }

    /// Whether the pending key was issued strictly after `cutoff`
    pub fn reset_issued_after(&self, cutoff: DateTime<Utc>) -> bool {
        self.reset_date.is_some_and(|issued| issued > cutoff)
    }

    /// Lowercase the unique fields before they reach the store
    pub(crate) fn normalize(&mut self) {
        self.login = self.login.to_lowercase();
        self.email = self.email.to_lowercase();
    }
}

/// Users are the same record iff both have been saved under the same id
///
/// An unsaved user only equals itself, not its clones.
impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || matches!((&self.id, &other.id), (Some(a), Some(b)) if a == b)
    }
}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// User as shown to callers, without credentials or reset data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Option<String>,
    pub login: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub image_url: Option<String>,
    pub activated: bool,
    pub lang_key: String,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            image_url: user.image_url,
            activated: user.activated,
            lang_key: user.lang_key,
            created_date: user.created_date,
            last_modified_date: user.last_modified_date,
        }
    }
}

/// Zero-based page of results, ordered by login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl PageRequest {
    pub const MAX_SIZE: u64 = 500;

    /// Sizes are clamped to `1..=MAX_SIZE`
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, 20)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            size: request.size,
            total,
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.size.max(1))
    }
}

/// Reference to a document in another collection, stored as `{ $ref, $id }`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    #[serde(rename = "$ref")]
    pub collection: String,
    #[serde(rename = "$id")]
    pub id: String,
}

impl DocumentRef {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            collection: USERS_COLLECTION.to_string(),
            id: id.into(),
        }
    }
}

/// Score and comment left by a user on a line version
///
/// The owner is referenced, not embedded: deleting the rating leaves the
/// user untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineVersionRating {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub owner: Option<DocumentRef>,
}

impl LineVersionRating {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rating(mut self, rating: i32) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Point the rating at a saved user; unsaved users leave it ownerless
    pub fn owned_by(mut self, user: &User) -> Self {
        self.owner = user.id.clone().map(DocumentRef::user);
        self
    }

    pub fn is_owned_by(&self, user: &User) -> bool {
        match (&self.owner, &user.id) {
            (Some(owner), Some(id)) => owner.collection == USERS_COLLECTION && &owner.id == id,
            _ => false,
        }
    }
}

impl PartialEq for LineVersionRating {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || matches!((&self.id, &other.id), (Some(a), Some(b)) if a == b)
    }
}

impl Hash for LineVersionRating {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
