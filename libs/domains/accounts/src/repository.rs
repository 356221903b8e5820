use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AccountError, AccountResult};
use crate::models::{PageRequest, User, new_document_id};

/// Persistence contract for user records
///
/// Lookups return `Ok(None)` or an empty list when nothing matches; only
/// storage failures are errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Case-insensitive exact match on login
    async fn find_by_login(&self, login: &str) -> AccountResult<Option<User>>;

    /// Case-insensitive exact match on email
    async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>>;

    async fn find_by_reset_key(&self, reset_key: &str) -> AccountResult<Option<User>>;

    /// Accounts never activated and created strictly before `cutoff`
    async fn find_inactive_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> AccountResult<Vec<User>>;

    /// One page of users sorted by login, skipping `login`
    async fn find_all_excluding_login(
        &self,
        login: &str,
        page: PageRequest,
    ) -> AccountResult<Vec<User>>;

    async fn count_excluding_login(&self, login: &str) -> AccountResult<u64>;

    /// Insert or replace by id, assigning one on first save
    async fn save(&self, user: User) -> AccountResult<User>;

    /// Remove the record; removing a missing record succeeds
    async fn delete(&self, user: &User) -> AccountResult<()>;
}

/// In-memory implementation for tests and local runs
#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_login(&self, login: &str) -> AccountResult<Option<User>> {
        let login = login.to_lowercase();
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.login == login).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        let email = email.to_lowercase();
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_reset_key(&self, reset_key: &str) -> AccountResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.reset_key.as_deref() == Some(reset_key))
            .cloned())
    }

    async fn find_inactive_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> AccountResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| !u.activated && u.created_date < cutoff)
            .cloned()
            .collect())
    }

    async fn find_all_excluding_login(
        &self,
        login: &str,
        page: PageRequest,
    ) -> AccountResult<Vec<User>> {
        let login = login.to_lowercase();
        let users = self.users.read().await;
        let mut result: Vec<User> = users
            .values()
            .filter(|u| u.login != login)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.login.cmp(&b.login));

        Ok(result
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect())
    }

    async fn count_excluding_login(&self, login: &str) -> AccountResult<u64> {
        let login = login.to_lowercase();
        let users = self.users.read().await;
        Ok(users.values().filter(|u| u.login != login).count() as u64)
    }

    async fn save(&self, mut user: User) -> AccountResult<User> {
        user.normalize();
        let mut users = self.users.write().await;

        let id = user.id.clone().unwrap_or_else(new_document_id);
        for other in users.values() {
            if other.id.as_deref() == Some(id.as_str()) {
                continue;
            }
            if other.login == user.login {
                return Err(AccountError::DuplicateLogin(user.login));
            }
            if other.email == user.email {
                return Err(AccountError::DuplicateEmail(user.email));
            }
            if user.reset_key.is_some() && other.reset_key == user.reset_key {
                return Err(AccountError::Conflict("reset key already issued".to_string()));
            }
        }

        user.id = Some(id.clone());
        user.last_modified_date = Utc::now();
        users.insert(id, user.clone());

        tracing::debug!(user_id = ?user.id, "Saved user");
        Ok(user)
    }

    async fn delete(&self, user: &User) -> AccountResult<()> {
        if let Some(id) = &user.id {
            let removed = self.users.write().await.remove(id);
            tracing::debug!(user_id = %id, existed = removed.is_some(), "Deleted user");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(login: &str) -> User {
        User::new(login, format!("{login}@example.com"), "hash")
    }

    #[tokio::test]
    async fn test_save_assigns_id_once() {
        let repo = InMemoryUserRepository::new();

        let saved = repo.save(user("john")).await.unwrap();
        let id = saved.id.clone().unwrap();

        let resaved = repo.save(saved).await.unwrap();
        assert_eq!(resaved.id.as_deref(), Some(id.as_str()));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_lookups_are_case_insensitive() {
        let repo = InMemoryUserRepository::new();
        repo.save(user("john")).await.unwrap();

        assert!(repo.find_by_login("JOHN").await.unwrap().is_some());
        assert!(repo.find_by_email("John@Example.com").await.unwrap().is_some());
        assert!(repo.find_by_login("jane").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_login_and_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.save(user("john")).await.unwrap();

        let same_login = User::new("JOHN", "other@example.com", "hash");
        assert!(matches!(
            repo.save(same_login).await,
            Err(AccountError::DuplicateLogin(login)) if login == "john"
        ));

        let same_email = User::new("johnny", "JOHN@example.com", "hash");
        assert!(matches!(
            repo.save(same_email).await,
            Err(AccountError::DuplicateEmail(_))
        ));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_by_reset_key() {
        let repo = InMemoryUserRepository::new();
        let mut john = user("john");
        john.begin_password_reset("abc".to_string(), Utc::now());
        repo.save(john).await.unwrap();
        repo.save(user("jane")).await.unwrap();

        let found = repo.find_by_reset_key("abc").await.unwrap().unwrap();
        assert_eq!(found.login, "john");
        assert!(repo.find_by_reset_key("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_inactive_created_before() {
        let repo = InMemoryUserRepository::new();
        let cutoff = Utc::now() - Duration::days(3);

        let mut stale = user("stale");
        stale.created_date = cutoff - Duration::seconds(1);
        let mut stale_but_active = user("active");
        stale_but_active.created_date = cutoff - Duration::days(1);
        stale_but_active.activated = true;
        let mut at_cutoff = user("edge");
        at_cutoff.created_date = cutoff;

        for u in [stale, stale_but_active, at_cutoff, user("fresh")] {
            repo.save(u).await.unwrap();
        }

        let found = repo.find_inactive_created_before(cutoff).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].login, "stale");
    }

    #[tokio::test]
    async fn test_paging_excludes_login_and_sorts() {
        let repo = InMemoryUserRepository::new();
        for login in ["carol", "anonymoususer", "alice", "bob"] {
            repo.save(user(login)).await.unwrap();
        }

        let first = repo
            .find_all_excluding_login("anonymoususer", PageRequest::new(0, 2))
            .await
            .unwrap();
        let logins: Vec<_> = first.iter().map(|u| u.login.as_str()).collect();
        assert_eq!(logins, ["alice", "bob"]);

        let second = repo
            .find_all_excluding_login("anonymoususer", PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].login, "carol");

        assert_eq!(repo.count_excluding_login("anonymoususer").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_excluded_login_is_case_insensitive() {
        let repo = InMemoryUserRepository::new();
        for login in ["anonymoususer", "alice"] {
            repo.save(user(login)).await.unwrap();
        }

        let page = repo
            .find_all_excluding_login("AnonymousUser", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].login, "alice");

        assert_eq!(repo.count_excluding_login("ANONYMOUSUSER").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = InMemoryUserRepository::new();
        let saved = repo.save(user("john")).await.unwrap();

        repo.delete(&saved).await.unwrap();
        repo.delete(&saved).await.unwrap();
        repo.delete(&user("never-saved")).await.unwrap();

        assert!(repo.is_empty().await);
    }
}
