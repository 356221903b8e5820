//! Shared test utilities for the account crates
//!
//! - `TestMongo`: MongoDB container with automatic cleanup (feature: "mongo", default)
//! - `TestDataBuilder`: deterministic logins and emails derived from the test name
//! - `assertions`: small assertion helpers
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, TestMongo};
//!
//! #[tokio::test]
//! async fn my_mongo_test() {
//!     let mongo = TestMongo::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_mongo_test");
//!
//!     let db = mongo.database(&builder.database());
//!     let login = builder.login("main");
//! }
//! ```

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "mongo")]
pub use mongo::TestMongo;

/// Builder for test data with deterministic values
///
/// Values derived from the same test name are stable across runs, while
/// different tests never collide on unique fields.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from a hash of the test name
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_reset_flow");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Lowercase login unique to this test
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.login("main"), "user-7-main");
    /// ```
    pub fn login(&self, suffix: &str) -> String {
        format!("user-{}-{}", self.seed, suffix.to_lowercase())
    }

    /// Email matching [`TestDataBuilder::login`]
    pub fn email(&self, suffix: &str) -> String {
        format!("{}@example.test", self.login(suffix))
    }

    /// Database name unique to this test
    pub fn database(&self) -> String {
        format!("accounts_test_{}", self.seed)
    }
}

/// Test assertion helpers
pub mod assertions {
    use chrono::{DateTime, Duration, Utc};

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert that `timestamp` lies within `tolerance` of now
    pub fn assert_recent(timestamp: DateTime<Utc>, tolerance: Duration, context: &str) {
        let drift = (Utc::now() - timestamp).abs();
        assert!(
            drift <= tolerance,
            "{}: expected a timestamp within {} of now, got {} ({} away)",
            context,
            tolerance,
            timestamp,
            drift
        );
    }
}
