use crate::client::api_client::ClientError;
use crate::client::store::{Action, ModalMode, Store};
use crate::domain::task::{TaskPriority, TaskStatus};
use crate::dto;
use reqwest::StatusCode;
use tracing::{info, warn};
use uuid::Uuid;

/// Shown in the delete dialog when the server refuses to delete a task
pub const DELETE_FAILED_MESSAGE: &str = "Could not delete the task. Please try again.";

/// The calls the board makes against the task board API
pub trait BoardApi {
    async fn register(&self, email: &str, password: &str) -> Result<(), ClientError>;
    async fn login(&self, email: &str, password: &str) -> Result<(), ClientError>;
    async fn logout(&self) -> Result<(), ClientError>;
    async fn session(&self) -> Result<dto::SessionInfo, ClientError>;
    async fn list_tasks(
        &self,
        filter: &dto::TaskQuery,
    ) -> Result<Vec<dto::TaskResponse>, ClientError>;
    async fn create_task(&self, task: &dto::NewTask) -> Result<dto::TaskResponse, ClientError>;
    async fn update_task(
        &self,
        task_id: Uuid,
        update: &dto::UpdateTask,
    ) -> Result<dto::TaskResponse, ClientError>;
    async fn delete_task(&self, task_id: Uuid) -> Result<(), ClientError>;
}

/// Contents of the create/edit task form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub tags: Vec<String>,
}

impl Default for TaskForm {
    fn default() -> Self {
        TaskForm {
            title: String::new(),
            description: String::new(),
            status: TaskStatus::Backlog,
            priority: TaskPriority::Medium,
            tags: Vec::new(),
        }
    }
}

impl From<&dto::TaskResponse> for TaskForm {
    fn from(task: &dto::TaskResponse) -> Self {
        TaskForm {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            tags: task.tags.clone(),
        }
    }
}

impl From<TaskForm> for dto::NewTask {
    fn from(form: TaskForm) -> Self {
        dto::NewTask {
            title: form.title,
            description: Some(form.description),
            status: Some(form.status),
            priority: Some(form.priority),
            tags: Some(form.tags),
        }
    }
}

impl From<TaskForm> for dto::UpdateTask {
    fn from(form: TaskForm) -> Self {
        dto::UpdateTask {
            title: Some(form.title),
            description: Some(form.description),
            status: Some(form.status),
            priority: Some(form.priority),
            tags: Some(form.tags),
        }
    }
}

/// Drives the [Store] from API results. UI-only changes go straight through
/// [TaskBoard::dispatch]; anything that talks to the server goes through the other methods.
pub struct TaskBoard<Api: BoardApi> {
    api: Api,
    store: Store,
}

impl<Api: BoardApi> TaskBoard<Api> {
    pub fn new(api: Api) -> Self {
        TaskBoard {
            api,
            store: Store::new(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn dispatch(&mut self, action: Action) {
        self.store.dispatch(action);
    }

    pub async fn register(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        self.api.register(email, password).await?;
        self.store.dispatch(Action::LoggedIn);
        Ok(())
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        self.api.login(email, password).await?;
        self.store.dispatch(Action::LoggedIn);
        Ok(())
    }

    /// Drops local state even if the server call fails, the cookie is gone either way
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let result = self.api.logout().await;
        if let Err(ref err) = result {
            warn!(error = %err, "Logout request failed");
        }

        self.store.dispatch(Action::LoggedOut);
        self.store.dispatch(Action::SetTasks(Vec::new()));
        self.store.dispatch(Action::CloseTaskModal);
        self.store.dispatch(Action::CloseDeleteConfirm);
        result
    }

    /// Checks for an existing session cookie. Returns [None] when the server says there is
    /// no valid session.
    pub async fn restore_session(&mut self) -> Result<Option<dto::SessionInfo>, ClientError> {
        match self.api.session().await {
            Ok(session) => {
                self.store.dispatch(Action::LoggedIn);
                Ok(Some(session))
            }
            Err(err) if err.status() == Some(StatusCode::UNAUTHORIZED) => {
                self.store.dispatch(Action::LoggedOut);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Reloads every task from the server. Filtering happens locally.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let tasks = self.api.list_tasks(&dto::TaskQuery::default()).await?;
        info!(count = tasks.len(), "Loaded tasks");
        self.store.dispatch(Action::SetTasks(tasks));
        Ok(())
    }

    /// Saves the form as a new task or as changes to the task being edited, depending on
    /// the modal's mode. The modal stays open if the save fails.
    pub async fn submit_task(&mut self, form: TaskForm) -> Result<dto::TaskResponse, ClientError> {
        let editing = match self.store.ui.task_modal_mode {
            ModalMode::Edit => self.store.ui.selected_task.as_ref().map(|task| task.id),
            ModalMode::Create => None,
        };

        let saved = match editing {
            Some(task_id) => {
                self.api
                    .update_task(task_id, &dto::UpdateTask::from(form))
                    .await?
            }
            None => self.api.create_task(&dto::NewTask::from(form)).await?,
        };

        self.store.dispatch(Action::UpsertTask(saved.clone()));
        self.store.dispatch(Action::CloseTaskModal);
        Ok(saved)
    }

    /// Deletes the task waiting in the confirm dialog. The task leaves the list right away and
    /// comes back if the server refuses, with [DELETE_FAILED_MESSAGE] shown in the dialog.
    pub async fn confirm_delete(&mut self) -> Result<(), ClientError> {
        let Some(task_id) = self.store.ui.task_to_delete.as_ref().map(|task| task.id) else {
            return Ok(());
        };

        self.store.dispatch(Action::ClearDeleteError);
        let snapshot = self.store.tasks.clone();
        self.store.dispatch(Action::RemoveTask(task_id));

        match self.api.delete_task(task_id).await {
            Ok(()) => {
                self.store.dispatch(Action::CloseDeleteConfirm);
                Ok(())
            }
            Err(err) => {
                warn!(%task_id, error = %err, "Delete failed, restoring task list");
                self.store.dispatch(Action::SetTasks(snapshot));
                self.store
                    .dispatch(Action::SetDeleteError(DELETE_FAILED_MESSAGE.to_owned()));
                Err(err)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::MockBoardApi;
    use super::*;
    use chrono::Utc;
    use speculoos::prelude::*;
    use std::sync::Mutex;

    fn task(title: &str) -> dto::TaskResponse {
        let now = Utc::now();
        dto::TaskResponse {
            id: Uuid::new_v4(),
            title: title.to_owned(),
            description: String::new(),
            status: TaskStatus::Backlog,
            priority: TaskPriority::Medium,
            tags: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn server_error(status: StatusCode, message: &str) -> ClientError {
        ClientError::Api {
            status,
            message: message.to_owned(),
        }
    }

    fn board_with(tasks: Vec<dto::TaskResponse>) -> TaskBoard<Mutex<MockBoardApi>> {
        let mut board = TaskBoard::new(MockBoardApi::new_locked());
        board.dispatch(Action::LoggedIn);
        board.dispatch(Action::SetTasks(tasks));
        board
    }

    fn api(board: &TaskBoard<Mutex<MockBoardApi>>) -> std::sync::MutexGuard<'_, MockBoardApi> {
        board.api.lock().expect("mock board api mutex poisoned")
    }

    mod auth {
        use super::*;

        #[tokio::test]
        async fn login_marks_the_user_logged_in() {
            let mut board = TaskBoard::new(MockBoardApi::new_locked());
            api(&board).login_result.set_returned_result(Ok(()));

            let result = board.login("someone@example.com", "password123").await;

            assert_that!(result).is_ok();
            assert!(board.store().auth.logged_in);
            assert_eq!(
                vec![(
                    "someone@example.com".to_owned(),
                    "password123".to_owned()
                )],
                api(&board).login_result.calls()
            );
        }

        #[tokio::test]
        async fn failed_login_stays_logged_out() {
            let mut board = TaskBoard::new(MockBoardApi::new_locked());
            api(&board).login_result.set_returned_result(Err(server_error(
                StatusCode::UNAUTHORIZED,
                "invalid credentials",
            )));

            let result = board.login("someone@example.com", "wrong").await;

            assert_that!(result).is_err();
            assert!(!board.store().auth.logged_in);
        }

        #[tokio::test]
        async fn register_marks_the_user_logged_in() {
            let mut board = TaskBoard::new(MockBoardApi::new_locked());
            api(&board).register_result.set_returned_result(Ok(()));

            board
                .register("someone@example.com", "password123")
                .await
                .expect("register should succeed");

            assert!(board.store().auth.logged_in);
        }

        #[tokio::test]
        async fn logout_clears_local_state_even_if_the_server_fails() {
            let mut board = board_with(vec![task("Something")]);
            api(&board).logout_result.set_returned_result(Err(server_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "boom",
            )));

            let result = board.logout().await;

            assert_that!(result).is_err();
            assert!(!board.store().auth.logged_in);
            assert!(board.store().tasks.is_empty());
        }

        #[tokio::test]
        async fn missing_session_is_not_an_error() {
            let mut board = board_with(vec![]);
            api(&board)
                .session_result
                .set_returned_result(Err(server_error(StatusCode::UNAUTHORIZED, "unauthorized")));

            let result = board.restore_session().await;

            assert_that!(result).is_ok().is_none();
            assert!(!board.store().auth.logged_in);
        }

        #[tokio::test]
        async fn valid_session_logs_the_user_in() {
            let mut board = TaskBoard::new(MockBoardApi::new_locked());
            let session = dto::SessionInfo {
                user_id: Uuid::new_v4(),
                email: "someone@example.com".to_owned(),
            };
            api(&board)
                .session_result
                .set_returned_result(Ok(session.clone()));

            let result = board.restore_session().await;

            assert_that!(result).is_ok().is_some().is_equal_to(session);
            assert!(board.store().auth.logged_in);
        }
    }

    mod tasks {
        use super::*;

        #[tokio::test]
        async fn refresh_loads_everything_unfiltered() {
            let mut board = board_with(vec![]);
            let loaded = vec![task("First"), task("Second")];
            api(&board)
                .list_tasks_result
                .set_returned_result(Ok(loaded.clone()));
            board.dispatch(Action::SetSearch("first".to_owned()));

            board.refresh().await.expect("refresh should succeed");

            assert_eq!(loaded, board.store().tasks);
            let calls = api(&board).list_tasks_result.calls().to_vec();
            assert_eq!(1, calls.len());
            assert_eq!(None, calls[0].search);
            assert_eq!(None, calls[0].status);
        }

        #[tokio::test]
        async fn create_adds_the_task_and_closes_the_modal() {
            let existing = task("Existing");
            let mut board = board_with(vec![existing.clone()]);
            let created = task("Created");
            api(&board)
                .create_task_result
                .set_returned_result(Ok(created.clone()));
            board.dispatch(Action::OpenCreate);

            let form = TaskForm {
                title: "Created".to_owned(),
                ..TaskForm::default()
            };
            board.submit_task(form).await.expect("create should succeed");

            assert_eq!(vec![created, existing], board.store().tasks);
            assert!(!board.store().ui.task_modal_open);
            let calls = api(&board).create_task_result.calls().to_vec();
            assert_eq!("Created", calls[0].title);
            assert!(api(&board).update_task_result.calls().is_empty());
        }

        #[tokio::test]
        async fn edit_sends_the_whole_form_for_the_selected_task() {
            let original = task("Original");
            let mut board = board_with(vec![original.clone()]);
            let mut updated = original.clone();
            updated.title = "Updated".to_owned();
            updated.status = TaskStatus::Done;
            api(&board)
                .update_task_result
                .set_returned_result(Ok(updated.clone()));
            board.dispatch(Action::OpenEdit(original.clone()));

            let mut form = TaskForm::from(&original);
            form.title = "Updated".to_owned();
            form.status = TaskStatus::Done;
            board.submit_task(form).await.expect("update should succeed");

            assert_eq!(vec![updated], board.store().tasks);
            assert!(!board.store().ui.task_modal_open);
            let calls = api(&board).update_task_result.calls().to_vec();
            assert_eq!(original.id, calls[0].0);
            assert_eq!(Some("Updated".to_owned()), calls[0].1.title);
            assert_eq!(Some(TaskStatus::Done), calls[0].1.status);
            assert_eq!(Some(String::new()), calls[0].1.description);
        }

        #[tokio::test]
        async fn failed_save_keeps_the_modal_open() {
            let mut board = board_with(vec![]);
            api(&board).create_task_result.set_returned_result(Err(server_error(
                StatusCode::BAD_REQUEST,
                "title is required",
            )));
            board.dispatch(Action::OpenCreate);

            let result = board.submit_task(TaskForm::default()).await;

            assert_that!(result).is_err();
            assert!(board.store().ui.task_modal_open);
            assert!(board.store().tasks.is_empty());
        }
    }

    mod delete {
        use super::*;

        #[tokio::test]
        async fn successful_delete_removes_the_task_and_closes_the_dialog() {
            let keep = task("Keep");
            let doomed = task("Doomed");
            let mut board = board_with(vec![keep.clone(), doomed.clone()]);
            api(&board).delete_task_result.set_returned_result(Ok(()));
            board.dispatch(Action::OpenDeleteConfirm(doomed.clone()));

            board
                .confirm_delete()
                .await
                .expect("delete should succeed");

            assert_eq!(vec![keep], board.store().tasks);
            assert!(!board.store().ui.confirm_dialog_open);
            assert_eq!(None, board.store().ui.delete_error);
            assert_eq!(vec![doomed.id], api(&board).delete_task_result.calls());
        }

        #[tokio::test]
        async fn failed_delete_restores_the_list_and_shows_an_error() {
            let first = task("First");
            let doomed = task("Doomed");
            let last = task("Last");
            let before = vec![first, doomed.clone(), last];
            let mut board = board_with(before.clone());
            api(&board).delete_task_result.set_returned_result(Err(server_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "boom",
            )));
            board.dispatch(Action::OpenDeleteConfirm(doomed.clone()));

            let result = board.confirm_delete().await;

            assert_that!(result).is_err();
            assert_eq!(before, board.store().tasks);
            assert!(board.store().ui.confirm_dialog_open);
            assert_eq!(
                Some(DELETE_FAILED_MESSAGE.to_owned()),
                board.store().ui.delete_error
            );
        }

        #[tokio::test]
        async fn retry_clears_the_previous_error() {
            let doomed = task("Doomed");
            let mut board = board_with(vec![doomed.clone()]);
            board.dispatch(Action::OpenDeleteConfirm(doomed));
            board.dispatch(Action::SetDeleteError(DELETE_FAILED_MESSAGE.to_owned()));
            api(&board).delete_task_result.set_returned_result(Ok(()));

            board.confirm_delete().await.expect("retry should succeed");

            assert_eq!(None, board.store().ui.delete_error);
            assert!(board.store().tasks.is_empty());
        }

        #[tokio::test]
        async fn nothing_to_delete_is_a_no_op() {
            let mut board = board_with(vec![task("Safe")]);

            board.confirm_delete().await.expect("no-op should succeed");

            assert_eq!(1, board.store().tasks.len());
            assert!(api(&board).delete_task_result.calls().is_empty());
        }
    }
}
