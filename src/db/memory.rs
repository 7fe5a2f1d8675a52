use super::{AttendanceFilter, EventFilter, RecordStore, StoreError, StoreResult, TaskFilter};
use crate::domain::models::{
    Attendance, AttendanceWithUser, Event, NewAttendance, NewEvent, NewTask, NewUser, Task,
    TaskStatus, User,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    attendances: Vec<Attendance>,
    tasks: HashMap<Uuid, Task>,
    events: Vec<Event>,
}

/// Record store held entirely in process memory. Each operation takes the
/// table lock once, so conditional writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    /// Snapshot served to the next n attendance lookups.
    replay: Mutex<Option<(Vec<Attendance>, usize)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully-formed attendance row, bypassing the workflow.
    pub async fn seed_attendance(&self, row: Attendance) {
        self.tables.write().await.attendances.push(row);
    }

    /// Inserts a fully-formed task, bypassing the workflow.
    pub async fn seed_task(&self, task: Task) {
        self.tables.write().await.tasks.insert(task.id, task);
    }

    pub async fn attendance_count(&self) -> usize {
        self.tables.read().await.attendances.len()
    }

    /// Answers the next `lookups` attendance reads from the table as it is
    /// now, so a later writer acts on a stale view like a concurrent request
    /// that read before another one committed.
    pub async fn replay_attendance_reads(&self, lookups: usize) {
        let snapshot = self.tables.read().await.attendances.clone();
        *self.replay.lock().unwrap() = Some((snapshot, lookups));
    }

    fn replayed_attendance(&self) -> Option<Vec<Attendance>> {
        let mut replay = self.replay.lock().unwrap();
        let (rows, remaining) = replay.as_mut()?;
        let rows = rows.clone();
        *remaining -= 1;
        if *remaining == 0 {
            *replay = None;
        }
        Some(rows)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.users.len() as i64)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users.email".to_string()));
        }
        let row = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            gender: user.gender,
            face_embedding: user.face_embedding,
            created_at: Utc::now(),
        };
        tables.users.push(row.clone());
        Ok(row)
    }

    async fn update_user(&self, user: &User) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(StoreError::UniqueViolation("users.email".to_string()));
        }
        let existing = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        existing.name = user.name.clone();
        existing.email = user.email.clone();
        existing.gender = user.gender;
        existing.face_embedding = user.face_embedding.clone();
        Ok(existing.clone())
    }

    async fn find_attendance(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<Attendance>> {
        if let Some(rows) = self.replayed_attendance() {
            return Ok(rows
                .into_iter()
                .find(|a| a.user_id == user_id && a.date == date));
        }
        let tables = self.tables.read().await;
        Ok(tables
            .attendances
            .iter()
            .find(|a| a.user_id == user_id && a.date == date)
            .cloned())
    }

    async fn insert_attendance_if_absent(
        &self,
        row: NewAttendance,
    ) -> StoreResult<Option<Attendance>> {
        let mut tables = self.tables.write().await;
        if tables
            .attendances
            .iter()
            .any(|a| a.user_id == row.user_id && a.date == row.date)
        {
            return Ok(None);
        }
        let inserted = Attendance {
            id: Uuid::new_v4(),
            user_id: row.user_id,
            date: row.date,
            check_in_time: row.check_in_time,
            check_out_time: None,
            status: row.status,
            work_hours: None,
            location: row.location,
            notes: row.notes,
        };
        tables.attendances.push(inserted.clone());
        Ok(Some(inserted))
    }

    async fn record_check_out(
        &self,
        id: Uuid,
        check_out_time: DateTime<Utc>,
        work_hours: f64,
    ) -> StoreResult<Option<Attendance>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .attendances
            .iter_mut()
            .find(|a| a.id == id && a.check_out_time.is_none())
        else {
            return Ok(None);
        };
        row.check_out_time = Some(check_out_time);
        row.work_hours = Some(work_hours);
        Ok(Some(row.clone()))
    }

    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Attendance> = tables
            .attendances
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(b.check_in_time.cmp(&a.check_in_time))
        });
        Ok(rows)
    }

    async fn list_attendance_with_users(
        &self,
        filter: &AttendanceFilter,
    ) -> StoreResult<Vec<AttendanceWithUser>> {
        let rows = self.list_attendance(filter).await?;
        let tables = self.tables.read().await;
        Ok(rows
            .into_iter()
            .filter_map(|attendance| {
                let user = tables.users.iter().find(|u| u.id == attendance.user_id)?;
                Some(AttendanceWithUser {
                    user_name: user.name.clone(),
                    attendance,
                })
            })
            .collect())
    }

    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let row = Task {
            id: Uuid::new_v4(),
            title: task.title,
            description: task.description,
            user_id: task.user_id,
            priority: task.priority,
            status: task.status,
            category: task.category,
            deadline: task.deadline,
            completed: false,
            completed_at: None,
            created_at: task.created_at,
            updated_at: task.created_at,
        };
        self.tables.write().await.tasks.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn update_task(&self, task: &Task) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .tasks
            .get_mut(&task.id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        *existing = task.clone();
        Ok(existing.clone())
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.tasks.remove(&id).is_some())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn mark_overdue_tasks(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for task in tables.tasks.values_mut() {
            let open = matches!(task.status, TaskStatus::Pending | TaskStatus::InProgress);
            if open && task.deadline.map_or(false, |d| d < now) {
                task.status = TaskStatus::Overdue;
                task.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn insert_event(&self, event: NewEvent) -> StoreResult<Event> {
        let now = Utc::now();
        let row = Event {
            id: Uuid::new_v4(),
            title: event.title,
            description: event.description,
            event_type: event.event_type,
            date: event.date,
            time: event.time,
            location: event.location,
            attendees: event.attendees,
            status: event.status,
            created_by: event.created_by,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.events.push(row.clone());
        Ok(row)
    }

    async fn list_events(&self, filter: &EventFilter) -> StoreResult<Vec<Event>> {
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.time.cmp(&b.time)));
        if let Some(limit) = filter.limit {
            events.truncate(limit.max(0) as usize);
        }
        Ok(events)
    }
}
