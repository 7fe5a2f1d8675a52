use super::parse_date;
use crate::analytics::summary::{
    attendance_summary, productivity_report, task_summary, AttendanceSummaryRow, ProductivityRow,
    TaskSummaryRow,
};
use crate::db::{AttendanceFilter, TaskFilter};
use crate::domain::models::{Attendance, Task, User};
use crate::error::{AppError, AppResult};
use crate::state::SharedState;
use super::extract::{Json, Query};
use axum::{
    extract::State,
    routing::get,
    Router,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_REPORT_DAYS: i64 = 30;

#[derive(Deserialize, Default)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Report<T> {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rows: Vec<T>,
}

/// Resolved report window and the users it covers.
struct Scope {
    start: NaiveDate,
    end: NaiveDate,
    users: Vec<User>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/attendance-summary", get(attendance))
        .route("/task-summary", get(tasks))
        .route("/productivity-report", get(productivity))
        .with_state(state)
}

async fn resolve_scope(state: &SharedState, query: ReportQuery) -> AppResult<Scope> {
    let today = state.zone.today(state.now());
    let end = parse_date("end_date", query.end_date.as_deref())?.unwrap_or(today);
    let start = parse_date("start_date", query.start_date.as_deref())?
        .unwrap_or(end - Duration::days(DEFAULT_REPORT_DAYS));
    if start > end {
        return Err(AppError::Validation(
            "start_date must not be after end_date".into(),
        ));
    }

    let users = match query.user_id {
        Some(id) => vec![state
            .store
            .find_user(id)
            .await?
            .ok_or(AppError::NotFound("user"))?],
        None => state.store.list_users().await?,
    };
    Ok(Scope { start, end, users })
}

fn single_user(scope: &Scope) -> Option<Uuid> {
    match scope.users.as_slice() {
        [only] => Some(only.id),
        _ => None,
    }
}

async fn scoped_attendance(state: &SharedState, scope: &Scope) -> AppResult<Vec<Attendance>> {
    let filter = AttendanceFilter {
        user_id: single_user(scope),
        ..AttendanceFilter::default().between(scope.start, scope.end)
    };
    Ok(state.store.list_attendance(&filter).await?)
}

/// Tasks created within the window, read in civil time.
async fn scoped_tasks(state: &SharedState, scope: &Scope) -> AppResult<Vec<Task>> {
    let zone = state.zone;
    let from = scope
        .start
        .and_hms_opt(0, 0, 0)
        .and_then(|dt| zone.to_utc(dt));
    let to = scope
        .end
        .and_hms_milli_opt(23, 59, 59, 999)
        .and_then(|dt| zone.to_utc(dt));
    let filter = TaskFilter {
        user_id: single_user(scope),
        created_from: from,
        created_to: to,
        ..TaskFilter::default()
    };
    Ok(state.store.list_tasks(&filter).await?)
}

async fn attendance(
    State(state): State<SharedState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Report<AttendanceSummaryRow>>> {
    let scope = resolve_scope(&state, query).await?;
    let rows = scoped_attendance(&state, &scope).await?;
    Ok(Json(Report {
        start_date: scope.start,
        end_date: scope.end,
        rows: attendance_summary(&scope.users, &rows),
    }))
}

async fn tasks(
    State(state): State<SharedState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Report<TaskSummaryRow>>> {
    let scope = resolve_scope(&state, query).await?;
    let tasks = scoped_tasks(&state, &scope).await?;
    Ok(Json(Report {
        start_date: scope.start,
        end_date: scope.end,
        rows: task_summary(&scope.users, &tasks),
    }))
}

async fn productivity(
    State(state): State<SharedState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Report<ProductivityRow>>> {
    let scope = resolve_scope(&state, query).await?;
    let rows = scoped_attendance(&state, &scope).await?;
    let tasks = scoped_tasks(&state, &scope).await?;
    Ok(Json(Report {
        start_date: scope.start,
        end_date: scope.end,
        rows: productivity_report(&scope.users, &rows, &tasks),
    }))
}
