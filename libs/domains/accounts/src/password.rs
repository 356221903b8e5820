//! Password hashing and reset key generation

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::distr::{Alphanumeric, SampleString};

use crate::error::{AccountError, AccountResult};

/// Length of generated reset keys, in alphanumeric characters
pub const RESET_KEY_LENGTH: usize = 20;

/// Hash with argon2 and a fresh random salt
pub fn hash_password(password: &str) -> AccountResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> AccountResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AccountError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Random reset key drawn from the thread-local CSPRNG
pub fn generate_reset_key() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), RESET_KEY_LENGTH)
}
