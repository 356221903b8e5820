//! Accounts Domain
//!
//! User records stored in MongoDB and the lifecycle operations around them:
//! password reset issue/complete and removal of accounts that were never
//! activated.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  AccountService  │  ← Reset flow, stale account sweep, listings
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │  UserRepository  │  ← Trait + MongoDB / in-memory implementations
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │      Models      │  ← User, UserView, LineVersionRating
//! └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_accounts::{AccountService, MongoUserRepository};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let repository = MongoUserRepository::new(client.database("accounts"));
//! repository.create_indexes().await?;
//!
//! let service = AccountService::new(repository);
//! if let Some(_user) = service.request_password_reset("jane@example.com").await? {
//!     // hand _user.reset_key to the mailer
//! }
//! service.remove_not_activated_users().await?;
//! # Ok(())
//! # }
//! ```

mod bson_datetime;
pub mod error;
pub mod models;
pub mod mongodb;
pub mod password;
pub mod repository;
pub mod service;
pub mod settings;

pub use error::{AccountError, AccountResult};
pub use models::{
    ANONYMOUS_USER, DocumentRef, LineVersionRating, Page, PageRequest, RATINGS_COLLECTION,
    ResetState, USERS_COLLECTION, User, UserView,
};
pub use self::mongodb::MongoUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::AccountService;
pub use settings::LifecycleSettings;
