//! Session tokens and the cookie that carries them.
//!
//! A session is an HS256-signed JWT whose subject is the user's ID. The token lives in an
//! HTTP-only cookie named [AUTH_COOKIE_NAME] so browser scripts can't read it.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

pub const AUTH_COOKIE_NAME: &str = "auth_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// ID of the logged in user
    pub sub: Uuid,
    pub email: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to sign session token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("session lifetime of {0:?} is too long to express as an expiry time")]
    TtlOutOfRange(Duration),
    #[error("session token has expired")]
    Expired,
    #[error("session token is invalid: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Signs and checks session tokens, and formats the cookies that carry them
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    secure_cookies: bool,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: Duration, secure_cookies: bool) -> Self {
        SessionKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            secure_cookies,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for the user which expires one TTL from now
    pub fn issue_token(&self, user_id: Uuid, email: &str) -> Result<String, SessionError> {
        self.issue_token_at(user_id, email, Utc::now())
    }

    pub fn issue_token_at(
        &self,
        user_id: Uuid,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let expires_at = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| issued_at.timestamp().checked_add(ttl))
            .ok_or(SessionError::TtlOutOfRange(self.ttl))?;
        let claims = SessionClaims {
            sub: user_id,
            email: email.to_owned(),
            iat: issued_at.timestamp(),
            exp: expires_at,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(SessionError::Sign)
    }

    /// Checks the token's signature and expiry and returns its claims
    pub fn verify_token(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid(err),
            })
    }

    /// `Set-Cookie` value which stores the token in the browser
    pub fn session_cookie(&self, token: &str) -> String {
        self.cookie_with(token, self.ttl.as_secs())
    }

    /// `Set-Cookie` value which removes the session cookie from the browser
    pub fn clearing_cookie(&self) -> String {
        self.cookie_with("", 0)
    }

    fn cookie_with(&self, value: &str, max_age_secs: u64) -> String {
        let secure = if self.secure_cookies { "; Secure" } else { "" };
        format!(
            "{AUTH_COOKIE_NAME}={value}; Max-Age={max_age_secs}; Path=/; HttpOnly; SameSite=Lax{secure}"
        )
    }
}

/// Pulls the session token out of a `Cookie` request header, if there is a non-empty one
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE_NAME)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
