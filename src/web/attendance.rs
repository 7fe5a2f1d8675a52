use super::{ensure_user, parse_date, parse_enum};
use crate::analytics::attendance_stats::{monthly_stats, MonthlyAttendanceStats};
use crate::db::AttendanceFilter;
use crate::domain::attendance::{self, CheckInReceipt, CheckInRequest, CheckOutReceipt};
use crate::domain::models::{Attendance, AttendanceStatus};
use crate::error::{AppError, AppResult};
use crate::state::SharedState;
use super::extract::{Json, Path, Query};
use crate::time_utils::month_bounds;
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_HISTORY_DAYS: i64 = 30;

#[derive(Deserialize)]
pub struct CheckOutRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RosterEntry {
    pub attendance_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub status: AttendanceStatus,
    pub check_in_time: String,
    pub check_out_time: Option<String>,
    pub work_hours: Option<f64>,
    pub location: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/check-in", post(check_in))
        .route("/check-out", post(check_out))
        .route("/history/:user_id", get(history))
        .route("/stats/:user_id", get(stats))
        .route("/today", get(today))
        .with_state(state)
}

async fn check_in(
    State(state): State<SharedState>,
    Json(req): Json<CheckInRequest>,
) -> AppResult<Json<CheckInReceipt>> {
    // unknown ids never get a limiter window
    ensure_user(&state, req.user_id).await?;
    if !state.face_limiter.check(req.user_id).await {
        tracing::warn!("Face attempt limit exceeded for user {}", req.user_id);
        return Err(AppError::RateLimited);
    }
    let receipt =
        attendance::check_in(state.store.as_ref(), &state.zone, req, state.now()).await?;
    Ok(Json(receipt))
}

async fn check_out(
    State(state): State<SharedState>,
    Json(req): Json<CheckOutRequest>,
) -> AppResult<Json<CheckOutReceipt>> {
    let receipt =
        attendance::check_out(state.store.as_ref(), &state.zone, req.user_id, state.now()).await?;
    Ok(Json(receipt))
}

/// Rows for one user, most recent first. Defaults to the last 30 days.
async fn history(
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<Attendance>>> {
    ensure_user(&state, user_id).await?;

    let today = state.zone.today(state.now());
    let to = parse_date("end_date", query.end_date.as_deref())?.unwrap_or(today);
    let from = parse_date("start_date", query.start_date.as_deref())?
        .unwrap_or(to - Duration::days(DEFAULT_HISTORY_DAYS));
    if from > to {
        return Err(AppError::Validation(
            "start_date must not be after end_date".into(),
        ));
    }

    let filter = AttendanceFilter {
        status: parse_enum::<AttendanceStatus>("status", query.status.as_deref())?,
        ..AttendanceFilter::for_user(user_id).between(from, to)
    };
    Ok(Json(state.store.list_attendance(&filter).await?))
}

async fn stats(
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<MonthlyAttendanceStats>> {
    ensure_user(&state, user_id).await?;

    let today: NaiveDate = state.zone.today(state.now());
    let (start, end) = month_bounds(today);
    let rows = state
        .store
        .list_attendance(&AttendanceFilter::for_user(user_id).between(start, end))
        .await?;
    Ok(Json(monthly_stats(&rows, today)))
}

async fn today(State(state): State<SharedState>) -> AppResult<Json<Vec<RosterEntry>>> {
    let today = state.zone.today(state.now());
    let rows = state
        .store
        .list_attendance_with_users(&AttendanceFilter::default().between(today, today))
        .await?;

    let zone = state.zone;
    let roster = rows
        .into_iter()
        .map(|row| {
            let att = row.attendance;
            RosterEntry {
                attendance_id: att.id,
                user_id: att.user_id,
                user_name: row.user_name,
                status: att.status,
                check_in_time: zone.format_time(att.check_in_time),
                check_out_time: att.check_out_time.map(|t| zone.format_time(t)),
                work_hours: att.work_hours,
                location: att.location,
            }
        })
        .collect();
    Ok(Json(roster))
}
