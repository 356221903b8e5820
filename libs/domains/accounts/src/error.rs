use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Login '{0}' is already in use")]
    DuplicateLogin(String),

    #[error("Email '{0}' is already in use")]
    DuplicateEmail(String),

    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Invalid lifecycle settings: {0}")]
    InvalidSettings(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type AccountResult<T> = Result<T, AccountError>;

impl From<mongodb::error::Error> for AccountError {
    fn from(err: mongodb::error::Error) -> Self {
        AccountError::Database(err.to_string())
    }
}
