//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
};
use tracing::instrument;

use crate::bson_datetime;
use crate::error::{AccountError, AccountResult};
use crate::models::{PageRequest, USERS_COLLECTION, User, new_document_id};
use crate::repository::UserRepository;

const DUPLICATE_KEY: i32 = 11000;

const LOGIN_INDEX: &str = "login_unique";
const EMAIL_INDEX: &str = "email_unique";
const RESET_KEY_INDEX: &str = "reset_key_unique";
const INACTIVE_INDEX: &str = "activated_created_date";

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    /// ```ignore
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let repo = MongoUserRepository::new(client.database("accounts"));
    /// repo.create_indexes().await?;
    /// ```
    pub fn new(db: Database) -> Self {
        Self::with_collection(db, USERS_COLLECTION)
    }

    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<User>(collection_name);
        Self { collection }
    }

    pub fn collection(&self) -> &Collection<User> {
        &self.collection
    }

    /// Unique indexes backing login, email and reset key uniqueness, plus
    /// one for the stale account sweep
    ///
    /// The reset key index is sparse: cleared keys are removed from the
    /// document, so only pending resets take part.
    pub async fn create_indexes(&self) -> AccountResult<()> {
        let unique = |name: &str| {
            IndexOptions::builder()
                .name(name.to_string())
                .unique(true)
                .build()
        };

        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "login": 1 })
                .options(unique(LOGIN_INDEX))
                .build(),
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique(EMAIL_INDEX))
                .build(),
            IndexModel::builder()
                .keys(doc! { "resetKey": 1 })
                .options(
                    IndexOptions::builder()
                        .name(RESET_KEY_INDEX.to_string())
                        .unique(true)
                        .sparse(true)
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "activated": 1, "createdDate": 1 })
                .options(IndexOptions::builder().name(INACTIVE_INDEX.to_string()).build())
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!(collection = %self.collection.name(), "User indexes ensured");
        Ok(())
    }

    fn id_filter(id: &str) -> Document {
        doc! { "_id": id }
    }

    fn excluding_login_filter(login: &str) -> Document {
        doc! { "login": { "$ne": login.to_lowercase() } }
    }

    fn inactive_before_filter(cutoff: DateTime<Utc>) -> Document {
        doc! {
            "activated": false,
            "createdDate": { "$lt": bson_datetime::to_bson(cutoff) },
        }
    }

    /// Translate unique index violations into domain errors
    fn map_write_error(err: mongodb::error::Error, user: &User) -> AccountError {
        if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
            if write_error.code == DUPLICATE_KEY {
                let message = &write_error.message;
                return if message.contains(LOGIN_INDEX) {
                    AccountError::DuplicateLogin(user.login.clone())
                } else if message.contains(EMAIL_INDEX) {
                    AccountError::DuplicateEmail(user.email.clone())
                } else {
                    AccountError::Conflict(message.clone())
                };
            }
        }
        err.into()
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self))]
    async fn find_by_login(&self, login: &str) -> AccountResult<Option<User>> {
        let filter = doc! { "login": login.to_lowercase() };
        Ok(self.collection.find_one(filter).await?)
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        let filter = doc! { "email": email.to_lowercase() };
        Ok(self.collection.find_one(filter).await?)
    }

    #[instrument(skip(self, reset_key))]
    async fn find_by_reset_key(&self, reset_key: &str) -> AccountResult<Option<User>> {
        let filter = doc! { "resetKey": reset_key };
        Ok(self.collection.find_one(filter).await?)
    }

    #[instrument(skip(self))]
    async fn find_inactive_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> AccountResult<Vec<User>> {
        let cursor = self
            .collection
            .find(Self::inactive_before_filter(cutoff))
            .await?;
        let users: Vec<User> = cursor.try_collect().await?;

        tracing::debug!(count = users.len(), "Found not activated users");
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn find_all_excluding_login(
        &self,
        login: &str,
        page: PageRequest,
    ) -> AccountResult<Vec<User>> {
        let options = FindOptions::builder()
            .skip(page.offset())
            .limit(page.size as i64)
            .sort(doc! { "login": 1 })
            .build();

        let cursor = self
            .collection
            .find(Self::excluding_login_filter(login))
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn count_excluding_login(&self, login: &str) -> AccountResult<u64> {
        Ok(self
            .collection
            .count_documents(Self::excluding_login_filter(login))
            .await?)
    }

    #[instrument(skip(self, user), fields(user_id = ?user.id))]
    async fn save(&self, mut user: User) -> AccountResult<User> {
        user.normalize();
        let id = user.id.get_or_insert_with(new_document_id).clone();
        user.last_modified_date = Utc::now();

        self.collection
            .replace_one(Self::id_filter(&id), &user)
            .upsert(true)
            .await
            .map_err(|e| Self::map_write_error(e, &user))?;

        tracing::debug!(user_id = %id, "User saved");
        Ok(user)
    }

    #[instrument(skip(self, user), fields(user_id = ?user.id))]
    async fn delete(&self, user: &User) -> AccountResult<()> {
        let Some(id) = user.id.as_deref() else {
            return Ok(());
        };

        let result = self.collection.delete_one(Self::id_filter(id)).await?;
        if result.deleted_count == 0 {
            tracing::debug!(user_id = %id, "User already gone");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Bson;

    #[test]
    fn test_inactive_filter_uses_native_dates() {
        let cutoff = Utc::now();
        let filter = MongoUserRepository::inactive_before_filter(cutoff);

        assert!(!filter.get_bool("activated").unwrap());
        let created = filter.get_document("createdDate").unwrap();
        match created.get("$lt") {
            Some(Bson::DateTime(dt)) => {
                assert_eq!(dt.timestamp_millis(), cutoff.timestamp_millis())
            }
            other => panic!("expected a BSON date, got {other:?}"),
        }
    }

    #[test]
    fn test_excluding_login_filter_lowercases() {
        let filter = MongoUserRepository::excluding_login_filter("AnonymousUser");
        let login = filter.get_document("login").unwrap();
        assert_eq!(login.get_str("$ne").unwrap(), "anonymoususer");
    }

    #[test]
    fn test_id_filter() {
        let filter = MongoUserRepository::id_filter("abc");
        assert_eq!(filter.get_str("_id").unwrap(), "abc");
    }
}
