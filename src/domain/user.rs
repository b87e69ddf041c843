use crate::domain::user::driving_ports::{LoginError, RegisterError};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use tracing::{info, warn};
use uuid::Uuid;

/// Passwords shorter than this (in characters) are rejected at registration
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

/// Email and password as submitted by someone registering or logging in
#[derive(Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Rules a registration must pass before anything is looked up or stored
    pub fn check_for_registration(&self) -> Result<(), RegisterError> {
        if normalize_email(&self.email).is_empty() || self.password.is_empty() {
            return Err(RegisterError::MissingCredentials);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RegisterError::PasswordTooShort);
        }

        Ok(())
    }
}

/// A user ready to be stored: normalized email plus an already-hashed password
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// Emails are matched case-insensitively and without surrounding whitespace
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub mod driven_ports {
    use super::*;

    pub trait UserReader {
        async fn user_by_email(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<User>, anyhow::Error>;
    }

    pub trait UserWriter {
        /// Stores a new user. Returns [None] if the email is already taken.
        async fn create_user(
            &self,
            user: &NewUser,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<User>, anyhow::Error>;
    }

    pub trait PasswordHasher {
        async fn hash_password(&self, password: &str) -> Result<String, anyhow::Error>;
        /// `Ok(false)` means the password doesn't match. Errors are reserved for unusable hashes.
        async fn verify_password(&self, password: &str, hash: &str)
        -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum RegisterError {
        #[error("email and password required")]
        MissingCredentials,
        #[error("password too short")]
        PasswordTooShort,
        #[error("email already in use")]
        EmailInUse,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum LoginError {
        #[error("email and password required")]
        MissingCredentials,
        #[error("invalid credentials")]
        InvalidCredentials,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait AuthPort {
        async fn register(
            &self,
            credentials: &Credentials,
            ext_cxn: &mut impl ExternalConnectivity,
            u_read: &impl driven_ports::UserReader,
            u_write: &impl driven_ports::UserWriter,
            hasher: &impl driven_ports::PasswordHasher,
        ) -> Result<User, RegisterError>;

        async fn login(
            &self,
            credentials: &Credentials,
            ext_cxn: &mut impl ExternalConnectivity,
            u_read: &impl driven_ports::UserReader,
            hasher: &impl driven_ports::PasswordHasher,
        ) -> Result<User, LoginError>;
    }
}

pub struct AuthService;

impl driving_ports::AuthPort for AuthService {
    async fn register(
        &self,
        credentials: &Credentials,
        ext_cxn: &mut impl ExternalConnectivity,
        u_read: &impl driven_ports::UserReader,
        u_write: &impl driven_ports::UserWriter,
        hasher: &impl driven_ports::PasswordHasher,
    ) -> Result<User, RegisterError> {
        credentials.check_for_registration()?;
        let email = normalize_email(&credentials.email);

        let existing = u_read
            .user_by_email(&email, &mut *ext_cxn)
            .await
            .context("looking up email during registration")?;
        if existing.is_some() {
            return Err(RegisterError::EmailInUse);
        }

        let password_hash = hasher
            .hash_password(&credentials.password)
            .await
            .context("hashing password for a new user")?;
        let new_user = NewUser {
            email,
            password_hash,
        };

        let Some(created) = u_write
            .create_user(&new_user, &mut *ext_cxn)
            .await
            .context("storing a new user")?
        else {
            // Someone claimed the email between the lookup and the insert
            return Err(RegisterError::EmailInUse);
        };

        info!(user_id = %created.id, "registered new user");
        Ok(created)
    }

    async fn login(
        &self,
        credentials: &Credentials,
        ext_cxn: &mut impl ExternalConnectivity,
        u_read: &impl driven_ports::UserReader,
        hasher: &impl driven_ports::PasswordHasher,
    ) -> Result<User, LoginError> {
        let email = normalize_email(&credentials.email);
        if email.is_empty() || credentials.password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        let Some(user) = u_read
            .user_by_email(&email, &mut *ext_cxn)
            .await
            .context("looking up user for login")?
        else {
            warn!("login attempted for unknown email");
            return Err(LoginError::InvalidCredentials);
        };

        let valid = hasher
            .verify_password(&credentials.password, &user.password_hash)
            .await
            .context("verifying password at login")?;
        if !valid {
            warn!(user_id = %user.id, "login attempted with wrong password");
            return Err(LoginError::InvalidCredentials);
        }

        Ok(user)
    }
}
