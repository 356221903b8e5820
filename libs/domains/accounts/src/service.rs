use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{AccountError, AccountResult};
use crate::models::{ANONYMOUS_USER, Page, PageRequest, User, UserView};
use crate::password::{generate_reset_key, hash_password};
use crate::repository::UserRepository;
use crate::settings::LifecycleSettings;

/// Password reset and stale account cleanup on top of a [`UserRepository`]
///
/// Every "no" answer (unknown email, inactive account, wrong or expired key)
/// is `Ok(None)`, so callers cannot tell them apart.
pub struct AccountService<R: UserRepository> {
    repository: Arc<R>,
    settings: LifecycleSettings,
}

impl<R: UserRepository> AccountService<R> {
    pub fn new(repository: R) -> Self {
        Self::with_settings(repository, LifecycleSettings::default())
    }

    pub fn with_settings(repository: R, settings: LifecycleSettings) -> Self {
        Self {
            repository: Arc::new(repository),
            settings,
        }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// `now - window`, or an error when the window reaches past the earliest date
    fn cutoff(window: Duration) -> AccountResult<DateTime<Utc>> {
        Utc::now().checked_sub_signed(window).ok_or_else(|| {
            AccountError::InvalidSettings(format!("window of {window} is out of range"))
        })
    }

    /// Issue a reset key for the activated account registered under `email`
    #[instrument(skip(self, email))]
    pub async fn request_password_reset(&self, email: &str) -> AccountResult<Option<User>> {
        let Some(mut user) = self.repository.find_by_email(email).await? else {
            debug!("No account for password reset request");
            return Ok(None);
        };

        if !user.activated {
            debug!(user_id = ?user.id, "Password reset refused for account that is not activated");
            return Ok(None);
        }

        user.begin_password_reset(generate_reset_key(), Utc::now());
        let user = self.repository.save(user).await?;

        info!(user_id = ?user.id, "Password reset issued");
        Ok(Some(user))
    }

    /// Set a new password if `reset_key` is known and still within its validity window
    #[instrument(skip(self, new_password, reset_key))]
    pub async fn complete_password_reset(
        &self,
        new_password: &str,
        reset_key: &str,
    ) -> AccountResult<Option<User>> {
        let Some(mut user) = self.repository.find_by_reset_key(reset_key).await? else {
            debug!("Unknown password reset key");
            return Ok(None);
        };

        let oldest_valid = Self::cutoff(self.settings.reset_key_validity)?;
        if !user.reset_issued_after(oldest_valid) {
            debug!(user_id = ?user.id, "Password reset key expired");
            return Ok(None);
        }

        user.finish_password_reset(hash_password(new_password)?);
        let user = self.repository.save(user).await?;

        info!(user_id = ?user.id, "Password reset completed");
        Ok(Some(user))
    }

    /// Delete accounts never activated within the retention window
    ///
    /// Each deletion stands alone: a failure is logged and the sweep goes on.
    /// Returns how many accounts were removed.
    #[instrument(skip(self))]
    pub async fn remove_not_activated_users(&self) -> AccountResult<u64> {
        let cutoff = Self::cutoff(self.settings.inactive_retention)?;
        let candidates = self.repository.find_inactive_created_before(cutoff).await?;

        let mut removed = 0;
        for user in &candidates {
            match self.repository.delete(user).await {
                Ok(()) => {
                    debug!(login = %user.login, "Deleted not activated user");
                    removed += 1;
                }
                Err(e) => {
                    warn!(login = %user.login, error = %e, "Failed to delete not activated user");
                }
            }
        }

        info!(
            candidates = candidates.len(),
            removed,
            cutoff = %cutoff,
            "Not activated users removed"
        );
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_login(&self, login: &str) -> AccountResult<Option<User>> {
        self.repository.find_by_login(login).await
    }

    /// Page through every account except the anonymous system user
    #[instrument(skip(self))]
    pub async fn get_all_managed_users(&self, page: PageRequest) -> AccountResult<Page<UserView>> {
        let users = self
            .repository
            .find_all_excluding_login(ANONYMOUS_USER, page)
            .await?;
        let total = self.repository.count_excluding_login(ANONYMOUS_USER).await?;

        Ok(Page::new(
            users.into_iter().map(UserView::from).collect(),
            page,
            total,
        ))
    }
}

impl<R: UserRepository> Clone for AccountService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            settings: self.settings.clone(),
        }
    }
}
