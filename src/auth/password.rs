//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`) so the
//! parameters and salt travel with the hash. Hashing is CPU-heavy, so the async
//! [Argon2Hasher] moves it onto tokio's blocking pool.

use crate::domain::user::driven_ports::PasswordHasher;
use anyhow::Context;
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordVerifier, SaltString};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    HashError(String),
    #[error("stored password hash is unusable: {0}")]
    InvalidHash(String),
}

/// Hashes a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = password_hash::PasswordHasher::hash_password(
        &Argon2::default(),
        password.as_bytes(),
        &salt,
    )
    .map_err(|err| PasswordError::HashError(err.to_string()))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored PHC hash. A mismatch is `Ok(false)`, not an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|err| PasswordError::InvalidHash(err.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PasswordError::InvalidHash(err.to_string())),
    }
}

/// Production [PasswordHasher] backed by Argon2id
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    async fn hash_password(&self, password: &str) -> Result<String, anyhow::Error> {
        let password = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("password hashing task panicked")??;

        Ok(hash)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, anyhow::Error> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .context("password verification task panicked")??;

        Ok(matches)
    }
}
