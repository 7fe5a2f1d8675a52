use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "gender", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "attendance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    OnTime,
    Late,
    /// Enumerated for manual entry; the workflow never assigns it.
    Absent,
    Leave,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::OnTime => "on_time",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Leave => "leave",
        }
    }
}

impl TryFrom<&str> for AttendanceStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "on_time" | "ontime" | "present" => Ok(AttendanceStatus::OnTime),
            "late" => Ok(AttendanceStatus::Late),
            "absent" => Ok(AttendanceStatus::Absent),
            "leave" => Ok(AttendanceStatus::Leave),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn is_high(&self) -> bool {
        matches!(self, TaskPriority::High | TaskPriority::Urgent)
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            "urgent" => Ok(TaskPriority::Urgent),
            _ => Err(()),
        }
    }
}

/// Status assigned through the task workflow. The dashboard's age-derived
/// view lives in `analytics::dashboard::AgeBucket`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Overdue,
}

impl TryFrom<&str> for TaskStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" | "inprogress" | "in-progress" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            "overdue" => Ok(TaskStatus::Overdue),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "event_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Meeting,
    Deadline,
    Training,
    Holiday,
    Other,
}

impl TryFrom<&str> for EventType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "meeting" => Ok(EventType::Meeting),
            "deadline" => Ok(EventType::Deadline),
            "training" => Ok(EventType::Training),
            "holiday" => Ok(EventType::Holiday),
            "other" => Ok(EventType::Other),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "event_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    /// JSON array of floats; `None` until the user enrolls a face.
    pub face_embedding: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_enrolled(&self) -> bool {
        self.face_embedding
            .as_deref()
            .map(|raw| !raw.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub face_embedding: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Attendance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    pub work_hours: Option<f64>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    pub status: AttendanceStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Attendance row joined with its owner's display name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttendanceWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub attendance: Attendance,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub category: String,
    pub deadline: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub category: String,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: Option<String>,
    pub attendees: Option<String>,
    pub status: EventStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: Option<String>,
    pub attendees: Option<String>,
    pub status: EventStatus,
    pub created_by: Option<Uuid>,
}
