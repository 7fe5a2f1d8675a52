//! Record store: the persistence boundary for users, attendance, tasks and events.
//!
//! Production uses [`postgres::PgStore`]; tests use the in-memory store.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use crate::domain::models::{
    Attendance, AttendanceStatus, AttendanceWithUser, Event, EventType, NewAttendance, NewEvent,
    NewTask, NewUser, Task, TaskPriority, TaskStatus, User,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A storage-level uniqueness constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Attendance query; every field narrows the result. Results are ordered by
/// date, most recent first.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub user_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

impl AttendanceFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn matches(&self, row: &Attendance) -> bool {
        self.user_id.map_or(true, |id| row.user_id == id)
            && self.from.map_or(true, |from| row.date >= from)
            && self.to.map_or(true, |to| row.date <= to)
            && self.status.map_or(true, |status| row.status == status)
    }
}

/// Task query; results are ordered by creation time, newest first.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.user_id.map_or(true, |id| task.user_id == id)
            && self.status.map_or(true, |status| task.status == status)
            && self.priority.map_or(true, |priority| task.priority == priority)
            && self
                .category
                .as_deref()
                .map_or(true, |category| task.category == category)
            && self.created_from.map_or(true, |from| task.created_at >= from)
            && self.created_to.map_or(true, |to| task.created_at <= to)
    }
}

/// Event query; results are ordered by date then time, earliest first.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub event_type: Option<EventType>,
    pub limit: Option<i64>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.from.map_or(true, |from| event.date >= from)
            && self.to.map_or(true, |to| event.date <= to)
            && self.event_type.map_or(true, |t| event.event_type == t)
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn count_users(&self) -> StoreResult<i64>;
    /// Fails with [`StoreError::UniqueViolation`] on a duplicate email.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    /// Persists name, email, gender and embedding of an existing user.
    async fn update_user(&self, user: &User) -> StoreResult<User>;

    async fn find_attendance(&self, user_id: Uuid, date: NaiveDate)
        -> StoreResult<Option<Attendance>>;
    /// Inserts unless a row already exists for `(user_id, date)`; returns `None`
    /// when the existing row wins. Check and insert are a single atomic step.
    async fn insert_attendance_if_absent(
        &self,
        row: NewAttendance,
    ) -> StoreResult<Option<Attendance>>;
    /// Sets check-out fields only while `check_out_time` is still null; returns
    /// `None` when the row was already checked out.
    async fn record_check_out(
        &self,
        id: Uuid,
        check_out_time: DateTime<Utc>,
        work_hours: f64,
    ) -> StoreResult<Option<Attendance>>;
    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>>;
    /// Attendance joined with user names.
    async fn list_attendance_with_users(
        &self,
        filter: &AttendanceFilter,
    ) -> StoreResult<Vec<AttendanceWithUser>>;

    async fn insert_task(&self, task: NewTask) -> StoreResult<Task>;
    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;
    async fn update_task(&self, task: &Task) -> StoreResult<Task>;
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>>;
    /// Moves pending/in-progress tasks past their deadline to overdue.
    async fn mark_overdue_tasks(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    async fn insert_event(&self, event: NewEvent) -> StoreResult<Event>;
    async fn list_events(&self, filter: &EventFilter) -> StoreResult<Vec<Event>>;
}
