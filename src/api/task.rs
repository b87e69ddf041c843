use crate::auth::AuthenticatedUser;
use crate::domain::task::driving_ports::{TaskError, TaskPort};
use crate::external_connections::ExternalConnectivity;
use crate::persistence::db_task_driven_ports::{DbTaskReader, DbTaskWriter};
use crate::routing_utils::{
    BasicError, BasicErrorResponse, GenericErrorResponse, Json, JsonErrorResponse,
    ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto};
use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::get;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;
use validator::Validate;

#[derive(OpenApi)]
#[openapi(
    paths(list_tasks, create_task, get_task, update_task, delete_task),
    components(schemas(dto::NewTask, dto::UpdateTask, dto::TaskResponse, dto::OkResponse))
)]
/// Defines the OpenAPI documentation for the task API
pub struct TaskApi;
/// Constant used to group task endpoints in OpenAPI documentation
pub const TASK_API_GROUP: &str = "Tasks";

/// Builds a router for the routes under "/api/tasks". Every route requires a session.
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(
                |State(app_state): AppState,
                 user: AuthenticatedUser,
                 query: Result<Query<dto::TaskQuery>, QueryRejection>| async move {
                    let Query(query) =
                        query.map_err(|rejection| BasicError::invalid_input(rejection.body_text()))?;
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    list_tasks(&user, query, &mut ext_cxn, &domain::task::TaskService).await
                },
            )
            .post(
                |State(app_state): AppState,
                 user: AuthenticatedUser,
                 Json(new_task): Json<dto::NewTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    create_task(&user, new_task, &mut ext_cxn, &domain::task::TaskService).await
                },
            ),
        )
        .route(
            "/:task_id",
            get(
                |State(app_state): AppState,
                 user: AuthenticatedUser,
                 Path(task_id): Path<String>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    get_task(&user, &task_id, &mut ext_cxn, &domain::task::TaskService).await
                },
            )
            .patch(
                |State(app_state): AppState,
                 user: AuthenticatedUser,
                 Path(task_id): Path<String>,
                 update: Result<Json<dto::UpdateTask>, JsonErrorResponse>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    update_task(
                        &user,
                        &task_id,
                        update.map(|Json(update)| update),
                        &mut ext_cxn,
                        &domain::task::TaskService,
                    )
                    .await
                },
            )
            .delete(
                |State(app_state): AppState,
                 user: AuthenticatedUser,
                 Path(task_id): Path<String>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    delete_task(&user, &task_id, &mut ext_cxn, &domain::task::TaskService).await
                },
            ),
        )
}

fn parse_task_id(raw: &str) -> Result<Uuid, BasicError> {
    Uuid::parse_str(raw).map_err(|_| BasicError::invalid_id())
}

impl From<TaskError> for ErrorResponse {
    fn from(value: TaskError) -> Self {
        let message = value.to_string();
        match value {
            TaskError::TaskNotFound => BasicError::not_found(message).into(),
            TaskError::MissingTitle => BasicError::invalid_input(message).into(),
            TaskError::PortError(cause) => GenericErrorResponse(cause).into(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = TASK_API_GROUP,
    params(dto::TaskQuery),
    responses(
        (status = 200, description = "The user's tasks, newest first", body = Vec<dto::TaskResponse>),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, task_service))]
/// Lists the caller's tasks, narrowed down by the query filters
async fn list_tasks(
    user: &AuthenticatedUser,
    query: dto::TaskQuery,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<Vec<dto::TaskResponse>>, ErrorResponse> {
    let filter = domain::task::TaskFilter::from(query);
    let tasks = task_service
        .tasks_for_user(user.user_id, &filter, &mut *ext_cxn, &DbTaskReader)
        .await?;

    Ok(Json(tasks.into_iter().map(dto::TaskResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = TASK_API_GROUP,
    request_body = dto::NewTask,
    responses(
        (status = 201, description = "Task created", body = dto::TaskResponse),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all)]
/// Creates a task owned by the caller
async fn create_task(
    user: &AuthenticatedUser,
    new_task: dto::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<(StatusCode, Json<dto::TaskResponse>), ErrorResponse> {
    new_task.validate().map_err(ValidationErrorResponse::from)?;

    let created = task_service
        .create_task_for_user(user.user_id, &new_task.into(), &mut *ext_cxn, &DbTaskWriter)
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(("task_id" = Uuid, Path, description = "ID of the task")),
    responses(
        (status = 200, description = "The task", body = dto::TaskResponse),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, task_service))]
async fn get_task(
    user: &AuthenticatedUser,
    task_id: &str,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::TaskResponse>, ErrorResponse> {
    let task_id = parse_task_id(task_id)?;

    let task = task_service
        .user_task_by_id(user.user_id, task_id, &mut *ext_cxn, &DbTaskReader)
        .await?;

    Ok(Json(task.into()))
}

#[utoipa::path(
    patch,
    path = "/api/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(("task_id" = Uuid, Path, description = "ID of the task")),
    request_body = dto::UpdateTask,
    responses(
        (status = 200, description = "The updated task", body = dto::TaskResponse),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(update, ext_cxn, task_service))]
/// Changes only the fields present in the request body. The ID is checked before the body
/// so a bad ID wins over a bad body.
async fn update_task(
    user: &AuthenticatedUser,
    task_id: &str,
    update: Result<dto::UpdateTask, JsonErrorResponse>,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::TaskResponse>, ErrorResponse> {
    let task_id = parse_task_id(task_id)?;
    let update = update?;
    update.validate().map_err(ValidationErrorResponse::from)?;

    let updated = task_service
        .update_task(
            user.user_id,
            task_id,
            &update.into(),
            &mut *ext_cxn,
            &DbTaskWriter,
        )
        .await?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(("task_id" = Uuid, Path, description = "ID of the task")),
    responses(
        (status = 200, description = "Task deleted", body = dto::OkResponse),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, task_service))]
async fn delete_task(
    user: &AuthenticatedUser,
    task_id: &str,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::OkResponse>, ErrorResponse> {
    let task_id = parse_task_id(task_id)?;

    task_service
        .delete_task(user.user_id, task_id, &mut *ext_cxn, &DbTaskWriter)
        .await?;
    info!(%task_id, "task removed at user's request");

    Ok(Json(dto::OkResponse::ok()))
}
