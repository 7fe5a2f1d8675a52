use super::events::{upcoming_events, DEFAULT_UPCOMING_LIMIT};
use crate::analytics::dashboard::{
    overview, productivity_trend, recent_activity, task_distribution, weekly_attendance,
    window_start, Activity, DailyAttendance, OverviewStats, TaskDistribution, TrendPoint,
    RECENT_ACTIVITY_LIMIT,
};
use crate::db::{AttendanceFilter, TaskFilter};
use crate::domain::models::{Event, TaskStatus};
use crate::error::AppResult;
use crate::state::SharedState;
use axum::{extract::State, routing::get, Json, Router};
use chrono::Duration;

/// Days covered by the productivity trend (four weeks).
const TREND_DAYS: i64 = 28;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/attendance-weekly", get(attendance_weekly))
        .route("/task-distribution", get(distribution))
        .route("/recent-activities", get(recent_activities))
        .route("/productivity-trend", get(trend))
        .route("/upcoming-events", get(upcoming))
        .with_state(state)
}

async fn stats(State(state): State<SharedState>) -> AppResult<Json<OverviewStats>> {
    let today = state.zone.today(state.now());
    let employees = state.store.count_users().await?;
    let rows = state
        .store
        .list_attendance(&AttendanceFilter::default().between(window_start(today), today))
        .await?;
    let tasks = state.store.list_tasks(&TaskFilter::default()).await?;
    Ok(Json(overview(employees, today, &rows, &tasks)))
}

async fn attendance_weekly(
    State(state): State<SharedState>,
) -> AppResult<Json<Vec<DailyAttendance>>> {
    let today = state.zone.today(state.now());
    let rows = state
        .store
        .list_attendance(&AttendanceFilter::default().between(window_start(today), today))
        .await?;
    let week = weekly_attendance(today, &rows);
    Ok(Json(state.fallback.weekly_attendance(week)))
}

async fn distribution(State(state): State<SharedState>) -> AppResult<Json<TaskDistribution>> {
    let tasks = state.store.list_tasks(&TaskFilter::default()).await?;
    let dist = task_distribution(&tasks, state.now());
    Ok(Json(state.fallback.task_distribution(dist)))
}

async fn recent_activities(State(state): State<SharedState>) -> AppResult<Json<Vec<Activity>>> {
    let now = state.now();
    let since = now - Duration::days(7);
    let today = state.zone.today(now);
    let rows = state
        .store
        .list_attendance_with_users(
            &AttendanceFilter::default().between(state.zone.today(since), today),
        )
        .await?;
    let tasks = state
        .store
        .list_tasks(&TaskFilter {
            status: Some(TaskStatus::Completed),
            ..TaskFilter::default()
        })
        .await?;
    let users = state.store.list_users().await?;

    let feed = recent_activity(
        &state.zone,
        since,
        &rows,
        &tasks,
        &users,
        RECENT_ACTIVITY_LIMIT,
    );
    Ok(Json(state.fallback.recent_activity(&state.zone, now, feed)))
}

async fn trend(State(state): State<SharedState>) -> AppResult<Json<Vec<TrendPoint>>> {
    let now = state.now();
    let today = state.zone.today(now);
    let from = today - Duration::days(TREND_DAYS - 1);
    let employees = state.store.count_users().await?;
    let rows = state
        .store
        .list_attendance(&AttendanceFilter::default().between(from, today))
        .await?;
    let tasks = state
        .store
        .list_tasks(&TaskFilter {
            created_from: from.and_hms_opt(0, 0, 0).and_then(|dt| state.zone.to_utc(dt)),
            ..TaskFilter::default()
        })
        .await?;
    Ok(Json(productivity_trend(
        &state.zone,
        today,
        employees,
        &rows,
        &tasks,
    )))
}

async fn upcoming(State(state): State<SharedState>) -> AppResult<Json<Vec<Event>>> {
    Ok(Json(upcoming_events(&state, DEFAULT_UPCOMING_LIMIT).await?))
}
