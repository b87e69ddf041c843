use crate::auth::session::{SessionKeys, token_from_cookie_header};
use crate::routing_utils::BasicError;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use tracing::{Span, debug, field};
use uuid::Uuid;

/// The user behind the session cookie on a request. Extracting this rejects the request
/// with a 401 when there's no valid session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
}

impl AuthenticatedUser {
    pub fn from_headers(headers: &HeaderMap, keys: &SessionKeys) -> Result<Self, BasicError> {
        let token = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(token_from_cookie_header)
            .ok_or_else(BasicError::unauthorized)?;

        let claims = keys.verify_token(token).map_err(|err| {
            debug!("rejected session token: {err}");
            BasicError::unauthorized()
        })?;

        Span::current().record("user_id", field::display(claims.sub));

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    SessionKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = BasicError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        Self::from_headers(&parts.headers, &keys)
    }
}
