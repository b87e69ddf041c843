//! Data shapes exchanged over the HTTP API, separate from the domain types so the wire
//! format can change independently of the business logic.

pub mod task;
pub mod user;

use crate::routing_utils::{BasicErrorResponse, ExtraInfo, ValidationErrorSchema};
use utoipa::OpenApi;

pub use task::*;
pub use user::*;

/// Schemas shared across the API which aren't attached to a specific path
#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            BasicErrorResponse,
            ExtraInfo,
            ValidationErrorSchema,
            crate::domain::task::TaskStatus,
            crate::domain::task::TaskPriority,
        ),
        responses(BasicErrorResponse),
    )
)]
pub struct OpenApiSchemas;
