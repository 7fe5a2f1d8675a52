use super::{AttendanceFilter, EventFilter, RecordStore, StoreError, StoreResult, TaskFilter};
use crate::domain::models::{
    Attendance, AttendanceWithUser, Event, NewAttendance, NewEvent, NewTask, NewUser, Task, User,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, gender, face_embedding, created_at";

const ATTENDANCE_COLUMNS: &str =
    "id, user_id, date, check_in_time, check_out_time, status, work_hours, location, notes";

const TASK_COLUMNS: &str = "id, title, description, user_id, priority, status, category, \
     deadline, completed, completed_at, created_at, updated_at";

const EVENT_COLUMNS: &str = "id, title, description, event_type, date, time, location, \
     attendees, status, created_by, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::UniqueViolation(what.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, gender, face_embedding, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.gender)
        .bind(&user.face_embedding)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "users.email"))
    }

    async fn update_user(&self, user: &User) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, email = $3, gender = $4, face_embedding = $5
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.gender)
        .bind(&user.face_embedding)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "users.email"))
    }

    async fn find_attendance(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<Attendance>> {
        let row = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendances WHERE user_id = $1 AND date = $2"
        ))
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_attendance_if_absent(
        &self,
        row: NewAttendance,
    ) -> StoreResult<Option<Attendance>> {
        let inserted = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            INSERT INTO attendances (id, user_id, date, check_in_time, status, location, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, date) DO NOTHING
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(row.user_id)
        .bind(row.date)
        .bind(row.check_in_time)
        .bind(row.status)
        .bind(&row.location)
        .bind(&row.notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn record_check_out(
        &self,
        id: Uuid,
        check_out_time: DateTime<Utc>,
        work_hours: f64,
    ) -> StoreResult<Option<Attendance>> {
        let updated = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            UPDATE attendances
            SET check_out_time = $2, work_hours = $3
            WHERE id = $1 AND check_out_time IS NULL
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(check_out_time)
        .bind(work_hours)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendances
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
              AND ($4::attendance_status IS NULL OR status = $4)
            ORDER BY date DESC, check_in_time DESC
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_attendance_with_users(
        &self,
        filter: &AttendanceFilter,
    ) -> StoreResult<Vec<AttendanceWithUser>> {
        let rows = sqlx::query_as::<_, AttendanceWithUser>(
            r#"
            SELECT
                a.id,
                a.user_id,
                a.date,
                a.check_in_time,
                a.check_out_time,
                a.status,
                a.work_hours,
                a.location,
                a.notes,
                u.name AS user_name
            FROM attendances a
            JOIN users u ON u.id = a.user_id
            WHERE ($1::uuid IS NULL OR a.user_id = $1)
              AND ($2::date IS NULL OR a.date >= $2)
              AND ($3::date IS NULL OR a.date <= $3)
              AND ($4::attendance_status IS NULL OR a.status = $4)
            ORDER BY a.date DESC, a.check_in_time DESC
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let inserted = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks
                (id, title, description, user_id, priority, status, category, deadline,
                 completed, completed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, false, NULL, $9, $9)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.user_id)
        .bind(task.priority)
        .bind(task.status)
        .bind(&task.category)
        .bind(task.deadline)
        .bind(task.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn update_task(&self, task: &Task) -> StoreResult<Task> {
        let updated = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $2,
                description = $3,
                priority = $4,
                status = $5,
                category = $6,
                deadline = $7,
                completed = $8,
                completed_at = $9,
                updated_at = $10
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.status)
        .bind(&task.category)
        .bind(task.deadline)
        .bind(task.completed)
        .bind(task.completed_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::task_priority IS NULL OR priority = $3)
              AND ($4::text IS NULL OR category = $4)
              AND ($5::timestamptz IS NULL OR created_at >= $5)
              AND ($6::timestamptz IS NULL OR created_at <= $6)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.status)
        .bind(filter.priority)
        .bind(&filter.category)
        .bind(filter.created_from)
        .bind(filter.created_to)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn mark_overdue_tasks(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET status = 'overdue', updated_at = $1
            WHERE status IN ('pending', 'in_progress')
              AND deadline IS NOT NULL
              AND deadline < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_event(&self, event: NewEvent) -> StoreResult<Event> {
        let inserted = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events
                (id, title, description, event_type, date, time, location, attendees,
                 status, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now(), now())
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_type)
        .bind(event.date)
        .bind(event.time)
        .bind(&event.location)
        .bind(&event.attendees)
        .bind(event.status)
        .bind(event.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn list_events(&self, filter: &EventFilter) -> StoreResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE ($1::date IS NULL OR date >= $1)
              AND ($2::date IS NULL OR date <= $2)
              AND ($3::event_type IS NULL OR event_type = $3)
            ORDER BY date ASC, time ASC
            LIMIT $4
            "#
        ))
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.event_type)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}
