//! Task lifecycle rules: initial status, field updates and completion toggling.
//!
//! `completed`, `completed_at` and `status == Completed` always move together.

use crate::db::RecordStore;
use crate::domain::models::{NewTask, Task, TaskPriority, TaskStatus};
use crate::error::{AppError, AppResult};
use crate::time_utils::CivilZone;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub user_id: Uuid,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub category: Option<String>,
    /// An empty string clears the deadline.
    pub deadline: Option<String>,
    pub completed: Option<bool>,
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS]` read in the civil zone,
/// or a bare date meaning the end of that civil day.
pub fn parse_deadline(zone: &CivilZone, raw: &str) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();
    let invalid = || AppError::Validation(format!("invalid deadline: {raw:?}"));

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return zone.to_utc(naive).ok_or_else(invalid);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(invalid)?;
        return zone.to_utc(date.and_time(end_of_day)).ok_or_else(invalid);
    }
    Err(invalid())
}

fn open_status(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> TaskStatus {
    match deadline {
        Some(d) if d < now => TaskStatus::Overdue,
        _ => TaskStatus::Pending,
    }
}

pub async fn create_task(
    store: &dyn RecordStore,
    zone: &CivilZone,
    req: CreateTask,
    now: DateTime<Utc>,
) -> AppResult<Task> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }
    store
        .find_user(req.user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let deadline = match req.deadline.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_deadline(zone, raw)?),
        _ => None,
    };

    let task = store
        .insert_task(NewTask {
            title: req.title,
            description: req.description,
            user_id: req.user_id,
            priority: req.priority.unwrap_or(TaskPriority::Medium),
            status: open_status(deadline, now),
            category: req
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            deadline,
            created_at: now,
        })
        .await?;

    tracing::info!("Created task {} for user {}", task.id, task.user_id);
    Ok(task)
}

/// Applies `update` to `task` in place. Completion wins over any other status
/// in the same update.
pub fn apply_update(
    zone: &CivilZone,
    task: &mut Task,
    update: UpdateTask,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if let Some(title) = update.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        task.title = title;
    }
    if let Some(description) = update.description {
        task.description = description;
    }
    if let Some(priority) = update.priority {
        task.priority = priority;
    }
    if let Some(category) = update.category {
        task.category = category;
    }
    if let Some(raw) = update.deadline {
        task.deadline = if raw.trim().is_empty() {
            None
        } else {
            Some(parse_deadline(zone, &raw)?)
        };
    }

    let wants_complete = match (update.completed, update.status) {
        (Some(flag), _) => Some(flag),
        (None, Some(TaskStatus::Completed)) => Some(true),
        (None, Some(_)) => Some(false),
        (None, None) => None,
    };

    match wants_complete {
        Some(true) => {
            if !task.completed {
                task.completed_at = Some(now);
            }
            task.completed = true;
            task.status = TaskStatus::Completed;
        }
        Some(false) => {
            task.completed = false;
            task.completed_at = None;
            task.status = match update.status {
                Some(status) if status != TaskStatus::Completed => status,
                _ if task.status == TaskStatus::Completed => open_status(task.deadline, now),
                _ => task.status,
            };
        }
        None => {}
    }

    task.updated_at = now;
    Ok(())
}

pub async fn update_task(
    store: &dyn RecordStore,
    zone: &CivilZone,
    id: Uuid,
    update: UpdateTask,
    now: DateTime<Utc>,
) -> AppResult<Task> {
    let mut task = store
        .find_task(id)
        .await?
        .ok_or(AppError::NotFound("task"))?;
    apply_update(zone, &mut task, update, now)?;
    Ok(store.update_task(&task).await?)
}

pub async fn delete_task(store: &dyn RecordStore, id: Uuid) -> AppResult<()> {
    if store.delete_task(id).await? {
        tracing::info!("Deleted task {}", id);
        Ok(())
    } else {
        Err(AppError::NotFound("task"))
    }
}
