use chrono::Duration;
use core_config::{ConfigError, FromEnv, env_parse};

/// Time windows driving the account lifecycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleSettings {
    /// How long an issued reset key stays usable
    pub reset_key_validity: Duration,
    /// How long a never-activated account is kept
    pub inactive_retention: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            reset_key_validity: Duration::hours(24),
            inactive_retention: Duration::days(3),
        }
    }
}

/// Upper bound for either window (about a century)
const MAX_WINDOW: Duration = Duration::days(36_500);

/// Turn a positive count of `unit`s into a window no longer than [`MAX_WINDOW`]
fn window(
    key: &str,
    value: i64,
    unit: &str,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    let invalid = |details: String| ConfigError::ParseError {
        key: key.to_string(),
        details,
    };

    if value <= 0 {
        return Err(invalid(format!("expected a positive number, got {value}")));
    }

    to_duration(value)
        .filter(|window| *window <= MAX_WINDOW)
        .ok_or_else(|| {
            invalid(format!(
                "{value} {unit} exceeds the maximum of {} days",
                MAX_WINDOW.num_days()
            ))
        })
}

/// Environment variables:
/// - `ACCOUNT_RESET_KEY_VALIDITY_HOURS` (default: 24)
/// - `ACCOUNT_INACTIVE_RETENTION_DAYS` (default: 3)
impl FromEnv for LifecycleSettings {
    fn from_env() -> Result<Self, ConfigError> {
        const VALIDITY: &str = "ACCOUNT_RESET_KEY_VALIDITY_HOURS";
        const RETENTION: &str = "ACCOUNT_INACTIVE_RETENTION_DAYS";

        Ok(Self {
            reset_key_validity: window(
                VALIDITY,
                env_parse(VALIDITY, 24)?,
                "hours",
                Duration::try_hours,
            )?,
            inactive_retention: window(
                RETENTION,
                env_parse(RETENTION, 3)?,
                "days",
                Duration::try_days,
            )?,
        })
    }
}
