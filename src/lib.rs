#![allow(async_fn_in_trait)]

use crate::auth::SessionKeys;
use axum::Router;
use axum::extract::{FromRef, State};
use std::sync::Arc;

pub mod api;
pub mod app_env;
pub mod auth;
pub mod client;
pub mod config;
pub mod domain;
pub mod dto;
pub mod external_connections;
pub mod logging;
pub mod persistence;
pub mod routing_utils;

/// Global application state shared across request handlers
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
    pub session_keys: SessionKeys,
}

impl FromRef<Arc<SharedData>> for SessionKeys {
    fn from_ref(input: &Arc<SharedData>) -> Self {
        input.session_keys.clone()
    }
}

/// Extractor type for handlers that need the application state
pub type AppState = State<Arc<SharedData>>;

/// Assembles every route of the service, the API docs, and request tracing
pub fn build_router(shared_data: Arc<SharedData>) -> Router {
    let api_routes = Router::new()
        .nest("/api/auth", api::auth::auth_routes())
        .nest("/api/tasks", api::task::task_routes())
        .with_state(shared_data);

    logging::attach_tracing_http(api_routes.merge(api::swagger_main::build_documentation()))
}
