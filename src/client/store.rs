//! Client-side state for the task board. All changes go through [Store::dispatch] so the
//! state only ever moves by a known [Action].

use crate::domain::task::{TaskFilter, TaskPriority, TaskStatus};
use crate::dto::TaskResponse;
use uuid::Uuid;

/// A filter setting which either lets everything through or only one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: Copy> Filter<T> {
    pub fn only(&self) -> Option<T> {
        match self {
            Filter::All => None,
            Filter::Only(value) => Some(*value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalMode {
    #[default]
    Create,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UiState {
    pub status_filter: Filter<TaskStatus>,
    pub priority_filter: Filter<TaskPriority>,
    pub search: String,
    pub task_modal_open: bool,
    pub task_modal_mode: ModalMode,
    /// Task being edited while the modal is in [ModalMode::Edit]
    pub selected_task: Option<TaskResponse>,
    pub confirm_dialog_open: bool,
    pub task_to_delete: Option<TaskResponse>,
    /// Shown in the delete dialog after the server refused a delete
    pub delete_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthState {
    pub logged_in: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetTasks(Vec<TaskResponse>),
    /// Replaces the task with the same ID in place, or puts it at the front of the list
    UpsertTask(TaskResponse),
    RemoveTask(Uuid),
    SetStatusFilter(Filter<TaskStatus>),
    SetPriorityFilter(Filter<TaskPriority>),
    SetSearch(String),
    OpenCreate,
    OpenEdit(TaskResponse),
    CloseTaskModal,
    OpenDeleteConfirm(TaskResponse),
    CloseDeleteConfirm,
    SetDeleteError(String),
    ClearDeleteError,
    LoggedIn,
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Store {
    /// Newest first, as the server lists them
    pub tasks: Vec<TaskResponse>,
    pub ui: UiState,
    pub auth: AuthState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::SetTasks(tasks) => self.tasks = tasks,
            Action::UpsertTask(task) => {
                match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
                    Some(existing) => *existing = task,
                    None => self.tasks.insert(0, task),
                }
            }
            Action::RemoveTask(task_id) => self.tasks.retain(|task| task.id != task_id),
            Action::SetStatusFilter(filter) => self.ui.status_filter = filter,
            Action::SetPriorityFilter(filter) => self.ui.priority_filter = filter,
            Action::SetSearch(search) => self.ui.search = search,
            Action::OpenCreate => {
                self.ui.task_modal_mode = ModalMode::Create;
                self.ui.selected_task = None;
                self.ui.task_modal_open = true;
            }
            Action::OpenEdit(task) => {
                self.ui.task_modal_mode = ModalMode::Edit;
                self.ui.selected_task = Some(task);
                self.ui.task_modal_open = true;
            }
            Action::CloseTaskModal => {
                self.ui.task_modal_open = false;
                self.ui.selected_task = None;
            }
            Action::OpenDeleteConfirm(task) => {
                self.ui.task_to_delete = Some(task);
                self.ui.confirm_dialog_open = true;
            }
            Action::CloseDeleteConfirm => {
                self.ui.confirm_dialog_open = false;
                self.ui.task_to_delete = None;
            }
            Action::SetDeleteError(message) => self.ui.delete_error = Some(message),
            Action::ClearDeleteError => self.ui.delete_error = None,
            Action::LoggedIn => self.auth.logged_in = true,
            Action::LoggedOut => self.auth.logged_in = false,
        }
    }

    /// The filter the UI settings describe, matching tasks the same way the server does
    pub fn active_filter(&self) -> TaskFilter {
        TaskFilter {
            status: self.ui.status_filter.only(),
            priority: self.ui.priority_filter.only(),
            search: Some(self.ui.search.clone()),
            tag: None,
        }
    }

    pub fn filtered_tasks(&self) -> Vec<&TaskResponse> {
        let filter = self.active_filter();

        self.tasks
            .iter()
            .filter(|task| {
                filter.matches_fields(
                    task.status,
                    task.priority,
                    &task.title,
                    &task.description,
                    &task.tags,
                )
            })
            .collect()
    }

    /// Filtered tasks split into board columns, in board order. Tasks keep their list order
    /// within a column.
    pub fn grouped_by_status(&self) -> Vec<(TaskStatus, Vec<&TaskResponse>)> {
        let filtered = self.filtered_tasks();

        TaskStatus::ALL
            .into_iter()
            .map(|status| {
                let column = filtered
                    .iter()
                    .copied()
                    .filter(|task| task.status == status)
                    .collect();
                (status, column)
            })
            .collect()
    }
}
