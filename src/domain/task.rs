use crate::domain::task::driving_ports::TaskError;
use crate::external_connections::ExternalConnectivity;
use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

/// Which column of the board a task sits in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    #[display("BACKLOG")]
    Backlog,
    #[display("IN_PROGRESS")]
    InProgress,
    #[display("DONE")]
    Done,
}

impl TaskStatus {
    /// Every status in board order
    pub const ALL: [TaskStatus; 3] = [Self::Backlog, Self::InProgress, Self::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "BACKLOG",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| anyhow!("unknown task status {s:?}"))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    #[display("LOW")]
    Low,
    #[default]
    #[display("MEDIUM")]
    Medium,
    #[display("HIGH")]
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| anyhow!("unknown task priority {s:?}"))
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Task {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
#[cfg_attr(test, derive(Clone, PartialEq))]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub tags: Vec<String>,
}

/// Partial update to a task. [None] fields are left alone.
#[derive(Debug, Default)]
#[cfg_attr(test, derive(Clone, PartialEq))]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
    }

    /// Applies this update to a task in place. Returns true if anything was provided.
    pub fn apply_to(&self, task: &mut Task) -> bool {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(ref description) = self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(ref tags) = self.tags {
            task.tags = tags.clone();
        }

        !self.is_empty()
    }
}

/// Narrows down a user's task list. Empty filters match everything.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Case-insensitive substring of "{title} {description}"
    pub search: Option<String>,
    /// Task must carry this exact tag
    pub tag: Option<String>,
}

impl TaskFilter {
    /// The search term trimmed and lower-cased, or [None] if there's nothing to search for
    pub fn normalized_search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|search| search.trim().to_lowercase())
            .filter(|search| !search.is_empty())
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.matches_fields(
            task.status,
            task.priority,
            &task.title,
            &task.description,
            &task.tags,
        )
    }

    pub fn matches_fields(
        &self,
        status: TaskStatus,
        priority: TaskPriority,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> bool {
        if self.status.is_some_and(|wanted| wanted != status) {
            return false;
        }
        if self.priority.is_some_and(|wanted| wanted != priority) {
            return false;
        }
        if let Some(ref tag) = self.tag {
            if !tags.iter().any(|task_tag| task_tag == tag) {
                return false;
            }
        }
        if let Some(search) = self.normalized_search() {
            let text = format!("{title} {description}").to_lowercase();
            if !text.contains(&search) {
                return false;
            }
        }

        true
    }
}

/// Trims every tag and drops the ones left blank
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

pub mod driven_ports {
    use super::*;

    pub trait TaskReader {
        /// Tasks owned by the user which match the filter, newest first
        async fn tasks_for_user(
            &self,
            user_id: Uuid,
            filter: &TaskFilter,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;

        async fn user_task_by_id(
            &self,
            user_id: Uuid,
            task_id: Uuid,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;
    }

    pub trait TaskWriter {
        async fn create_task_for_user(
            &self,
            user_id: Uuid,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Task, anyhow::Error>;

        /// Returns the updated task, or [None] if the user owns no task with that ID
        async fn update_user_task(
            &self,
            user_id: Uuid,
            task_id: Uuid,
            update: &TaskUpdate,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;

        /// Returns false if the user owns no task with that ID
        async fn delete_user_task(
            &self,
            user_id: Uuid,
            task_id: Uuid,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("task not found")]
        TaskNotFound,
        #[error("title is required")]
        MissingTitle,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait TaskPort {
        async fn tasks_for_user(
            &self,
            user_id: Uuid,
            filter: &TaskFilter,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, TaskError>;
        async fn user_task_by_id(
            &self,
            user_id: Uuid,
            task_id: Uuid,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Task, TaskError>;
        async fn create_task_for_user(
            &self,
            user_id: Uuid,
            task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
        async fn update_task(
            &self,
            user_id: Uuid,
            task_id: Uuid,
            update: &TaskUpdate,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
        async fn delete_task(
            &self,
            user_id: Uuid,
            task_id: Uuid,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
    }
}

/// Trims a required title, failing if nothing is left
fn required_title(title: &str) -> Result<String, TaskError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(TaskError::MissingTitle)
    } else {
        Ok(trimmed.to_owned())
    }
}

pub struct TaskService;

impl driving_ports::TaskPort for TaskService {
    async fn tasks_for_user(
        &self,
        user_id: Uuid,
        filter: &TaskFilter,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl driven_ports::TaskReader,
    ) -> Result<Vec<Task>, TaskError> {
        let tasks = task_read
            .tasks_for_user(user_id, filter, &mut *ext_cxn)
            .await
            .context("fetching tasks for a user")?;

        Ok(tasks)
    }

    async fn user_task_by_id(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl driven_ports::TaskReader,
    ) -> Result<Task, TaskError> {
        task_read
            .user_task_by_id(user_id, task_id, &mut *ext_cxn)
            .await
            .context("fetching a task by ID")?
            .ok_or(TaskError::TaskNotFound)
    }

    async fn create_task_for_user(
        &self,
        user_id: Uuid,
        task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<Task, TaskError> {
        let normalized = NewTask {
            title: required_title(&task.title)?,
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            tags: normalize_tags(&task.tags),
        };

        let created = task_write
            .create_task_for_user(user_id, &normalized, &mut *ext_cxn)
            .await
            .context("creating a task")?;

        info!(task_id = %created.id, "created task");
        Ok(created)
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        update: &TaskUpdate,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<Task, TaskError> {
        let normalized = TaskUpdate {
            title: update.title.as_deref().map(required_title).transpose()?,
            description: update.description.clone(),
            status: update.status,
            priority: update.priority,
            tags: update.tags.as_deref().map(normalize_tags),
        };

        task_write
            .update_user_task(user_id, task_id, &normalized, &mut *ext_cxn)
            .await
            .context("updating a task")?
            .ok_or(TaskError::TaskNotFound)
    }

    async fn delete_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<(), TaskError> {
        let deleted = task_write
            .delete_user_task(user_id, task_id, &mut *ext_cxn)
            .await
            .context("deleting a task")?;

        if deleted {
            info!(%task_id, "deleted task");
            Ok(())
        } else {
            Err(TaskError::TaskNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::driving_ports::TaskPort;
    use super::test_util::*;
    use super::*;
    use crate::domain::test_util::Connectivity;
    use crate::external_connections;
    use speculoos::prelude::*;
    use std::sync::RwLock;

    fn owned(owner: Uuid, title: &str) -> NewTaskWithOwner {
        NewTaskWithOwner {
            owner,
            task: NewTask {
                title: title.to_owned(),
                ..NewTask::default()
            },
        }
    }

    mod tasks_for_user {
        use super::*;

        #[tokio::test]
        async fn only_returns_own_tasks_newest_first() {
            let me = Uuid::new_v4();
            let someone_else = Uuid::new_v4();
            let task_persist = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                owned(me, "First thing"),
                owned(someone_else, "Not mine"),
                owned(me, "Second thing"),
            ]));
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let fetched_tasks = TaskService
                .tasks_for_user(me, &TaskFilter::default(), &mut ext_cxn, &task_persist)
                .await;
            assert_that!(fetched_tasks).is_ok().matches(|tasks| {
                matches!(tasks.as_slice(), [
                    Task { title: newest, .. },
                    Task { title: oldest, .. },
                ] if newest == "Second thing" && oldest == "First thing")
            });
        }

        #[tokio::test]
        async fn applies_filter() {
            let me = Uuid::new_v4();
            let mut urgent = owned(me, "Fix the roof");
            urgent.task.priority = TaskPriority::High;
            urgent.task.description = "Leaking over the KITCHEN".to_owned();
            let mut done = owned(me, "Clean kitchen");
            done.task.status = TaskStatus::Done;
            let task_persist = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                urgent,
                done,
                owned(me, "Walk the dog"),
            ]));
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let filter = TaskFilter {
                search: Some("  kitchen ".to_owned()),
                priority: Some(TaskPriority::High),
                ..TaskFilter::default()
            };
            let fetched_tasks = TaskService
                .tasks_for_user(me, &filter, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(fetched_tasks).is_ok().matches(|tasks| {
                matches!(tasks.as_slice(), [Task { title, .. }] if title == "Fix the roof")
            });
        }

        #[tokio::test]
        async fn propagates_port_error() {
            let mut raw_persist = InMemoryTaskPersistence::new();
            raw_persist.connected = Connectivity::Disconnected;
            let task_persist = RwLock::new(raw_persist);
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let fetched_tasks = TaskService
                .tasks_for_user(
                    Uuid::new_v4(),
                    &TaskFilter::default(),
                    &mut ext_cxn,
                    &task_persist,
                )
                .await;
            assert_that!(fetched_tasks)
                .is_err()
                .matches(|err| matches!(err, TaskError::PortError(_)));
        }
    }

    mod user_task_by_id {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let me = Uuid::new_v4();
            let task_persist = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                owned(me, "abcde"),
                owned(me, "fghijk"),
            ]));
            let wanted_id = task_persist.read().expect("rw lock poisoned").tasks[1].id;
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let task_fetch_result = TaskService
                .user_task_by_id(me, wanted_id, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(task_fetch_result)
                .is_ok()
                .matches(|task| task.id == wanted_id && task.title == "fghijk");
        }

        #[tokio::test]
        async fn other_users_task_is_not_found() {
            let me = Uuid::new_v4();
            let task_persist = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[owned(
                Uuid::new_v4(),
                "lmnop",
            )]));
            let their_task = task_persist.read().expect("rw lock poisoned").tasks[0].id;
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let task_fetch_result = TaskService
                .user_task_by_id(me, their_task, &mut ext_cxn, &task_persist)
                .await;
            let Err(TaskError::TaskNotFound) = task_fetch_result else {
                panic!("Expected task to be hidden, got {task_fetch_result:#?}");
            };
        }
    }

    mod create_task_for_user {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let me = Uuid::new_v4();
            let task_persist = InMemoryTaskPersistence::new_locked();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            let task = NewTask {
                title: "  Something to do ".to_owned(),
                tags: vec![" home ".to_owned(), "  ".to_owned(), "chores".to_owned()],
                ..NewTask::default()
            };

            let create_result = TaskService
                .create_task_for_user(me, &task, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(create_result).is_ok().matches(|task| {
                task.owner_user_id == me
                    && task.title == "Something to do"
                    && task.description.is_empty()
                    && task.status == TaskStatus::Backlog
                    && task.priority == TaskPriority::Medium
                    && task.tags == ["home", "chores"]
            });
        }

        #[tokio::test]
        async fn rejects_blank_title() {
            let task_persist = InMemoryTaskPersistence::new_locked();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            for title in ["", "   "] {
                let task = NewTask {
                    title: title.to_owned(),
                    ..NewTask::default()
                };
                let create_result = TaskService
                    .create_task_for_user(Uuid::new_v4(), &task, &mut ext_cxn, &task_persist)
                    .await;
                let Err(TaskError::MissingTitle) = create_result else {
                    panic!("Expected a missing title error, got {create_result:#?}");
                };
            }

            let locked_persist = task_persist.read().expect("rw lock poisoned");
            assert!(locked_persist.tasks.is_empty());
        }
    }

    mod update_task {
        use super::*;

        #[tokio::test]
        async fn only_changes_provided_fields() {
            let me = Uuid::new_v4();
            let mut original = owned(me, "abcde");
            original.task.description = "keep me".to_owned();
            original.task.tags = vec!["keep".to_owned()];
            let task_persist =
                RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[original]));
            let task_id = task_persist.read().expect("rw lock poisoned").tasks[0].id;
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let update_result = TaskService
                .update_task(
                    me,
                    task_id,
                    &TaskUpdate {
                        title: Some(" Renamed ".to_owned()),
                        status: Some(TaskStatus::InProgress),
                        ..TaskUpdate::default()
                    },
                    &mut ext_cxn,
                    &task_persist,
                )
                .await;
            assert_that!(update_result).is_ok().matches(|task| {
                task.title == "Renamed"
                    && task.status == TaskStatus::InProgress
                    && task.description == "keep me"
                    && task.priority == TaskPriority::Medium
                    && task.tags == ["keep"]
                    && task.updated_at >= task.created_at
            });
        }

        #[tokio::test]
        async fn rejects_blank_title() {
            let me = Uuid::new_v4();
            let task_persist =
                RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[owned(me, "abcde")]));
            let task_id = task_persist.read().expect("rw lock poisoned").tasks[0].id;
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let update_result = TaskService
                .update_task(
                    me,
                    task_id,
                    &TaskUpdate {
                        title: Some("  ".to_owned()),
                        ..TaskUpdate::default()
                    },
                    &mut ext_cxn,
                    &task_persist,
                )
                .await;
            let Err(TaskError::MissingTitle) = update_result else {
                panic!("Expected a missing title error, got {update_result:#?}");
            };
            assert_eq!(
                "abcde",
                task_persist.read().expect("rw lock poisoned").tasks[0].title
            );
        }

        #[tokio::test]
        async fn other_users_task_is_not_found() {
            let task_persist = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[owned(
                Uuid::new_v4(),
                "abcde",
            )]));
            let their_task = task_persist.read().expect("rw lock poisoned").tasks[0].id;
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let update_result = TaskService
                .update_task(
                    Uuid::new_v4(),
                    their_task,
                    &TaskUpdate {
                        title: Some("Mine now".to_owned()),
                        ..TaskUpdate::default()
                    },
                    &mut ext_cxn,
                    &task_persist,
                )
                .await;
            let Err(TaskError::TaskNotFound) = update_result else {
                panic!("Expected task to be hidden, got {update_result:#?}");
            };
            assert_eq!(
                "abcde",
                task_persist.read().expect("rw lock poisoned").tasks[0].title
            );
        }
    }

    mod delete_task {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let me = Uuid::new_v4();
            let task_persist = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                owned(me, "abcde"),
                owned(me, "fghij"),
            ]));
            let doomed = task_persist.read().expect("rw lock poisoned").tasks[1].id;
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let delete_result = TaskService
                .delete_task(me, doomed, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(delete_result).is_ok();

            let locked_persist = task_persist.read().expect("rw lock poisoned");
            assert!(matches!(locked_persist.tasks.as_slice(), [
                Task { title, .. }
            ] if title == "abcde"));
        }

        #[tokio::test]
        async fn other_users_task_is_not_found() {
            let task_persist = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[owned(
                Uuid::new_v4(),
                "abcde",
            )]));
            let their_task = task_persist.read().expect("rw lock poisoned").tasks[0].id;
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let delete_result = TaskService
                .delete_task(Uuid::new_v4(), their_task, &mut ext_cxn, &task_persist)
                .await;
            let Err(TaskError::TaskNotFound) = delete_result else {
                panic!("Expected task to be hidden, got {delete_result:#?}");
            };
            assert_eq!(1, task_persist.read().expect("rw lock poisoned").tasks.len());
        }

        #[tokio::test]
        async fn returns_port_err() {
            let task_persist = InMemoryTaskPersistence::new_locked();
            {
                let mut locked_persist = task_persist.write().expect("rw lock poisoned");
                locked_persist.connected = Connectivity::Disconnected;
            }
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let delete_result = TaskService
                .delete_task(Uuid::new_v4(), Uuid::new_v4(), &mut ext_cxn, &task_persist)
                .await;
            assert_that!(delete_result)
                .is_err()
                .matches(|err| matches!(err, TaskError::PortError(_)));
        }
    }

    mod task_filter {
        use super::*;

        #[test]
        fn blank_search_matches_everything() {
            let filter = TaskFilter {
                search: Some("   ".to_owned()),
                ..TaskFilter::default()
            };
            assert!(filter.normalized_search().is_none());
            assert!(filter.matches_fields(TaskStatus::Done, TaskPriority::Low, "x", "", &[]));
        }

        #[test]
        fn tag_must_match_exactly() {
            let filter = TaskFilter {
                tag: Some("home".to_owned()),
                ..TaskFilter::default()
            };
            let tags = vec!["homework".to_owned()];
            assert!(!filter.matches_fields(
                TaskStatus::Backlog,
                TaskPriority::Medium,
                "x",
                "",
                &tags
            ));
        }

        #[test]
        fn status_strings_round_trip_through_parsing() {
            for status in TaskStatus::ALL {
                assert_eq!(status, status.as_str().parse::<TaskStatus>().unwrap());
                assert_eq!(status.as_str(), status.to_string());
            }
            assert!("WAITING".parse::<TaskStatus>().is_err());
            assert!("low".parse::<TaskPriority>().is_err());
        }
    }
}
