use crate::domain;
use crate::domain::task::{NewTask, Task, TaskFilter, TaskUpdate};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, query, query_as};
use uuid::Uuid;

const TASK_COLUMNS: &str =
    "id, user_id, title, description, status, priority, tags, created_at, updated_at";

#[derive(FromRow)]
struct TaskRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: String,
    status: String,
    priority: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = anyhow::Error;

    fn try_from(value: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: value.id,
            owner_user_id: value.user_id,
            title: value.title,
            description: value.description,
            status: value.status.parse()?,
            priority: value.priority.parse()?,
            tags: value.tags,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

pub struct DbTaskReader;

impl domain::task::driven_ports::TaskReader for DbTaskReader {
    async fn tasks_for_user(
        &self,
        user_id: Uuid,
        filter: &TaskFilter,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM task \
             WHERE user_id = $1 \
             AND ($2::text IS NULL OR status = $2) \
             AND ($3::text IS NULL OR priority = $3) \
             AND ($4::text IS NULL OR strpos(lower(title || ' ' || description), $4) > 0) \
             AND ($5::text IS NULL OR $5 = ANY(tags)) \
             ORDER BY created_at DESC, id"
        );
        let rows = query_as::<_, TaskRow>(&sql)
            .bind(user_id)
            .bind(filter.status.map(|status| status.as_str()))
            .bind(filter.priority.map(|priority| priority.as_str()))
            .bind(filter.normalized_search())
            .bind(filter.tag.as_deref())
            .fetch_all(cxn.borrow_connection())
            .await
            .context("trying to fetch tasks for a user")?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn user_task_by_id(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let sql = format!("SELECT {TASK_COLUMNS} FROM task WHERE user_id = $1 AND id = $2");
        let row = query_as::<_, TaskRow>(&sql)
            .bind(user_id)
            .bind(task_id)
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("trying to fetch a task by ID")?;

        row.map(Task::try_from).transpose()
    }
}

pub struct DbTaskWriter;

impl domain::task::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task_for_user(
        &self,
        user_id: Uuid,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let sql = format!(
            "INSERT INTO task(id, user_id, title, description, status, priority, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {TASK_COLUMNS}"
        );
        let row = query_as::<_, TaskRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&new_task.title)
            .bind(&new_task.description)
            .bind(new_task.status.as_str())
            .bind(new_task.priority.as_str())
            .bind(&new_task.tags)
            .fetch_one(cxn.borrow_connection())
            .await
            .context("trying to insert a new task into the database")?;

        Task::try_from(row)
    }

    async fn update_user_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        update: &TaskUpdate,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        // updated_at only moves when at least one field was provided
        let sql = format!(
            "UPDATE task SET \
             title = COALESCE($3, title), \
             description = COALESCE($4, description), \
             status = COALESCE($5, status), \
             priority = COALESCE($6, priority), \
             tags = COALESCE($7, tags), \
             updated_at = CASE WHEN $8 THEN now() ELSE updated_at END \
             WHERE user_id = $1 AND id = $2 \
             RETURNING {TASK_COLUMNS}"
        );
        let row = query_as::<_, TaskRow>(&sql)
            .bind(user_id)
            .bind(task_id)
            .bind(update.title.as_deref())
            .bind(update.description.as_deref())
            .bind(update.status.map(|status| status.as_str()))
            .bind(update.priority.map(|priority| priority.as_str()))
            .bind(update.tags.as_ref())
            .bind(!update.is_empty())
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("trying to update a task")?;

        row.map(Task::try_from).transpose()
    }

    async fn delete_user_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let result = query("DELETE FROM task WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(result.rows_affected() > 0)
    }
}
