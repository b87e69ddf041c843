use crate::domain;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// DTO for registering or logging in. Missing fields deserialize as empty strings so the
/// domain can report them as missing instead of the request failing to parse.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct Credentials {
    #[serde(default)]
    #[validate(length(max = 254))]
    #[schema(example = "someone@example.com")]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 128))]
    #[schema(example = "password123")]
    pub password: String,
}

impl From<Credentials> for domain::user::Credentials {
    fn from(value: Credentials) -> Self {
        domain::user::Credentials {
            email: value.email,
            password: value.password,
        }
    }
}

/// Generic acknowledgement for requests that don't return data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OkResponse {
    #[schema(example = true)]
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        OkResponse { ok: true }
    }
}

/// DTO describing the logged in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionInfo {
    pub user_id: Uuid,
    #[schema(example = "someone@example.com")]
    pub email: String,
}
