use core_config::{ConfigError, Environment, FromEnv, env_or_default};
use database::mongodb::MongoConfig;
use domain_accounts::LifecycleSettings;

/// Daily at 01:00 (sec min hour day month weekday)
pub const DEFAULT_CLEANUP_CRON: &str = "0 0 1 * * *";

const APP_NAME: &str = "account-lifecycle";

/// Runner configuration, composed from the shared config pieces
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub mongodb: MongoConfig,
    pub lifecycle: LifecycleSettings,
    /// `CLEANUP_CRON`, used by `schedule` when no `--cron` is given
    pub cleanup_cron: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut mongodb = MongoConfig::from_env()?;
        if mongodb.app_name.is_none() {
            mongodb = mongodb.with_app_name(APP_NAME);
        }

        Ok(Self {
            environment: Environment::from_env(),
            mongodb,
            lifecycle: LifecycleSettings::from_env()?,
            cleanup_cron: env_or_default("CLEANUP_CRON", DEFAULT_CLEANUP_CRON),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("MONGODB_DATABASE", Some("accounts")),
                ("MONGODB_APP_NAME", None),
                ("CLEANUP_CRON", None),
                ("ACCOUNT_INACTIVE_RETENTION_DAYS", None),
                ("APP_ENV", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.cleanup_cron, DEFAULT_CLEANUP_CRON);
                assert_eq!(config.mongodb.app_name.as_deref(), Some(APP_NAME));
                assert_eq!(config.environment, Environment::Development);
                assert_eq!(
                    config.lifecycle.inactive_retention.to_std().unwrap(),
                    Duration::from_secs(3 * 24 * 60 * 60)
                );
            },
        );
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("MONGODB_DATABASE", Some("accounts")),
                ("MONGODB_APP_NAME", Some("accounts-nightly")),
                ("CLEANUP_CRON", Some("0 30 2 * * *")),
                ("APP_ENV", Some("production")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.cleanup_cron, "0 30 2 * * *");
                assert_eq!(config.mongodb.app_name.as_deref(), Some("accounts-nightly"));
                assert!(config.environment.is_production());
            },
        );
    }

    #[test]
    fn test_missing_database_is_an_error() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("MONGODB_DATABASE", None),
                ("MONGO_DATABASE", None),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("MONGODB_DATABASE"));
            },
        );
    }
}
