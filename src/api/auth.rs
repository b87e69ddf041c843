use crate::auth::password::Argon2Hasher;
use crate::auth::{AuthenticatedUser, SessionKeys};
use crate::domain::user::User;
use crate::domain::user::driving_ports::{AuthPort, LoginError, RegisterError};
use crate::external_connections::{ExternalConnectivity, Transactable, TransactionHandle};
use crate::persistence::db_user_driven_ports::{DbUserReader, DbUserWriter};
use crate::routing_utils::{
    BasicError, BasicErrorResponse, GenericErrorResponse, Json, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{ErrorResponse, IntoResponse, Response};
use axum::routing::{get, post};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::OpenApi;
use validator::Validate;

#[derive(OpenApi)]
#[openapi(
    paths(register, login, logout, session),
    components(schemas(dto::Credentials, dto::OkResponse, dto::SessionInfo))
)]
/// Defines the OpenAPI documentation for the authentication API
pub struct AuthApi;
/// Constant used to group authentication endpoints in OpenAPI documentation
pub const AUTH_API_GROUP: &str = "Authentication";

/// Builds a router for the routes under "/api/auth"
pub fn auth_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/register",
            post(
                |State(app_state): AppState, Json(credentials): Json<dto::Credentials>| async move {
                    register(
                        credentials,
                        &app_state.ext_cxn,
                        &domain::user::AuthService,
                        &app_state.session_keys,
                    )
                    .await
                },
            ),
        )
        .route(
            "/login",
            post(
                |State(app_state): AppState, Json(credentials): Json<dto::Credentials>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    login(
                        credentials,
                        &mut ext_cxn,
                        &domain::user::AuthService,
                        &app_state.session_keys,
                    )
                    .await
                },
            ),
        )
        .route(
            "/logout",
            post(|State(session_keys): State<SessionKeys>| async move { logout(&session_keys) }),
        )
        .route("/session", get(session))
}

/// Issues a session token for the user and packages it as a `Set-Cookie` response
fn session_response(
    status: StatusCode,
    user: &User,
    session_keys: &SessionKeys,
) -> Result<Response, ErrorResponse> {
    let token = session_keys
        .issue_token(user.id, &user.email)
        .map_err(|err| GenericErrorResponse(err.into()))?;

    Ok((
        status,
        [(SET_COOKIE, session_keys.session_cookie(&token))],
        Json(dto::OkResponse::ok()),
    )
        .into_response())
}

impl From<RegisterError> for ErrorResponse {
    fn from(value: RegisterError) -> Self {
        let message = value.to_string();
        match value {
            RegisterError::MissingCredentials | RegisterError::PasswordTooShort => {
                BasicError::invalid_input(message).into()
            }
            RegisterError::EmailInUse => {
                info!("registration rejected: {message}");
                BasicError::conflict(message).into()
            }
            RegisterError::PortError(cause) => GenericErrorResponse(cause).into(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = AUTH_API_GROUP,
    request_body = dto::Credentials,
    responses(
        (status = 201, description = "Account created and session cookie set", body = dto::OkResponse),
        (status = 400, response = BasicErrorResponse),
        (status = 409, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all)]
/// Creates an account and logs the new user in
async fn register(
    credentials: dto::Credentials,
    ext_cxn: &impl Transactable,
    auth_service: &impl AuthPort,
    session_keys: &SessionKeys,
) -> Result<Response, ErrorResponse> {
    credentials
        .validate()
        .map_err(ValidationErrorResponse::from)?;
    let credentials = domain::user::Credentials::from(credentials);
    // Bad form input shouldn't tie up a pooled connection
    credentials.check_for_registration()?;

    let mut txn = ext_cxn
        .start_transaction()
        .await
        .map_err(GenericErrorResponse)?;
    let user = auth_service
        .register(
            &credentials,
            &mut txn,
            &DbUserReader,
            &DbUserWriter,
            &Argon2Hasher,
        )
        .await?;
    txn.commit().await.map_err(GenericErrorResponse)?;

    session_response(StatusCode::CREATED, &user, session_keys)
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = AUTH_API_GROUP,
    request_body = dto::Credentials,
    responses(
        (status = 200, description = "Session cookie set", body = dto::OkResponse),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all)]
/// Checks a user's credentials and starts a session
async fn login(
    credentials: dto::Credentials,
    ext_cxn: &mut impl ExternalConnectivity,
    auth_service: &impl AuthPort,
    session_keys: &SessionKeys,
) -> Result<Response, ErrorResponse> {
    credentials
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let login_result = auth_service
        .login(&credentials.into(), &mut *ext_cxn, &DbUserReader, &Argon2Hasher)
        .await;

    match login_result {
        Ok(user) => session_response(StatusCode::OK, &user, session_keys),
        Err(err @ LoginError::MissingCredentials) => {
            Err(BasicError::invalid_input(err.to_string()).into())
        }
        Err(err @ LoginError::InvalidCredentials) => {
            warn!("login rejected: {err}");
            Err(BasicError::new(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string()).into())
        }
        Err(LoginError::PortError(cause)) => Err(GenericErrorResponse(cause).into()),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = AUTH_API_GROUP,
    responses(
        (status = 200, description = "Session cookie cleared", body = dto::OkResponse),
    ),
)]
/// Ends the session by expiring the cookie. Works whether or not a session exists.
fn logout(session_keys: &SessionKeys) -> Response {
    (
        [(SET_COOKIE, session_keys.clearing_cookie())],
        Json(dto::OkResponse::ok()),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = AUTH_API_GROUP,
    responses(
        (status = 200, description = "The logged in user", body = dto::SessionInfo),
        (status = 401, response = BasicErrorResponse),
    ),
)]
/// Describes the user behind the current session cookie
async fn session(user: AuthenticatedUser) -> Json<dto::SessionInfo> {
    Json(dto::SessionInfo {
        user_id: user.user_id,
        email: user.email,
    })
}
