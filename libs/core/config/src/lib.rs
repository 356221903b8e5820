//! Shared configuration primitives for the account lifecycle workspace
//!
//! Every crate that reads settings from the process environment goes through
//! the [`FromEnv`] trait and the helpers below, so missing and malformed
//! variables surface as the same [`ConfigError`] values everywhere.

pub mod tracing;

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Deployment environment, selected with `APP_ENV`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Environment::Production => "info",
            Environment::Development => "debug",
        }
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Read a variable, falling back to `default` when unset
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read the first variable that is set among `keys`
pub fn env_first_of(keys: &[&str]) -> Result<String, ConfigError> {
    keys.iter()
        .find_map(|key| env::var(key).ok())
        .ok_or_else(|| ConfigError::MissingEnvVar(keys.join(" or ")))
}

/// Read and parse a variable, using `default` when unset
///
/// A value that is set but cannot be parsed is an error rather than a
/// silent fallback.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(!env.is_production());
            assert_eq!(env.default_log_filter(), "debug");
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        for value in ["production", "PRODUCTION", "Production"] {
            temp_env::with_var("APP_ENV", Some(value), || {
                let env = Environment::from_env();
                assert_eq!(env, Environment::Production);
                assert_eq!(env.default_log_filter(), "info");
            });
        }
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("ACCOUNTS_TEST_VAR", Some("set"), || {
            assert_eq!(env_or_default("ACCOUNTS_TEST_VAR", "fallback"), "set");
        });
        temp_env::with_var_unset("ACCOUNTS_TEST_VAR", || {
            assert_eq!(env_or_default("ACCOUNTS_TEST_VAR", "fallback"), "fallback");
        });
    }

    #[test]
    fn test_env_first_of_prefers_earlier_keys() {
        temp_env::with_vars(
            [("PRIMARY_URL", Some("primary")), ("LEGACY_URL", Some("legacy"))],
            || {
                assert_eq!(env_first_of(&["PRIMARY_URL", "LEGACY_URL"]).unwrap(), "primary");
            },
        );
        temp_env::with_vars(
            [("PRIMARY_URL", None::<&str>), ("LEGACY_URL", Some("legacy"))],
            || {
                assert_eq!(env_first_of(&["PRIMARY_URL", "LEGACY_URL"]).unwrap(), "legacy");
            },
        );
    }

    #[test]
    fn test_env_first_of_reports_all_keys() {
        temp_env::with_vars_unset(["PRIMARY_URL", "LEGACY_URL"], || {
            let err = env_first_of(&["PRIMARY_URL", "LEGACY_URL"]).unwrap_err();
            assert!(err.to_string().contains("PRIMARY_URL or LEGACY_URL"));
        });
    }

    #[test]
    fn test_env_parse_default_and_value() {
        temp_env::with_var_unset("RETENTION_DAYS", || {
            assert_eq!(env_parse("RETENTION_DAYS", 3i64).unwrap(), 3);
        });
        temp_env::with_var("RETENTION_DAYS", Some(" 7 "), || {
            assert_eq!(env_parse("RETENTION_DAYS", 3i64).unwrap(), 7);
        });
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        temp_env::with_var("RETENTION_DAYS", Some("three"), || {
            let err = env_parse("RETENTION_DAYS", 3i64).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "RETENTION_DAYS"));
        });
    }
}
