use crate::domain;
use crate::domain::task::{TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// DTO for creating a new task via the API
#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct NewTask {
    /// Required. A missing title is treated the same as a blank one.
    #[serde(default)]
    #[validate(length(max = 200))]
    #[schema(example = "Write release notes")]
    pub title: String,
    #[validate(length(max = 5000))]
    #[schema(example = "Cover the new filtering options")]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[validate(length(max = 20))]
    #[schema(example = json!(["docs"]))]
    pub tags: Option<Vec<String>>,
}

impl From<NewTask> for domain::task::NewTask {
    fn from(value: NewTask) -> Self {
        domain::task::NewTask {
            title: value.title,
            description: value.description.unwrap_or_default(),
            status: value.status.unwrap_or_default(),
            priority: value.priority.unwrap_or_default(),
            tags: value.tags.unwrap_or_default(),
        }
    }
}

/// DTO for partially updating a task via the API. Omitted fields are left unchanged.
#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20))]
    pub tags: Option<Vec<String>>,
}

impl From<UpdateTask> for domain::task::TaskUpdate {
    fn from(value: UpdateTask) -> Self {
        domain::task::TaskUpdate {
            title: value.title,
            description: value.description,
            status: value.status,
            priority: value.priority,
            tags: value.tags,
        }
    }
}

/// DTO for a task returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub id: Uuid,
    #[schema(example = "Write release notes")]
    pub title: String,
    #[schema(example = "Cover the new filtering options")]
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[schema(example = json!(["docs"]))]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<domain::task::Task> for TaskResponse {
    fn from(value: domain::task::Task) -> Self {
        TaskResponse {
            id: value.id,
            title: value.title,
            description: value.description,
            status: value.status,
            priority: value.priority,
            tags: value.tags,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Query string filters for listing tasks
#[derive(Debug, Default, Clone, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskQuery {
    /// Only tasks in this column
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<TaskStatus>,
    /// Only tasks with this priority
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<TaskPriority>,
    /// Case-insensitive text to look for in the title and description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Only tasks carrying this exact tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Query strings send an unset filter as `status=`, which means "no filter" like a missing one
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => T::deserialize(value.into_deserializer()).map(Some),
    }
}

impl From<TaskQuery> for domain::task::TaskFilter {
    fn from(value: TaskQuery) -> Self {
        domain::task::TaskFilter {
            status: value.status,
            priority: value.priority,
            search: value.search,
            tag: value.tag.filter(|tag| !tag.trim().is_empty()),
        }
    }
}
