use super::{ensure_user, parse_date, parse_enum};
use crate::db::EventFilter;
use crate::domain::models::{Event, EventStatus, EventType, NewEvent};
use crate::error::{AppError, AppResult};
use crate::state::SharedState;
use super::extract::{Json, Query};
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

pub const DEFAULT_UPCOMING_LIMIT: i64 = 5;
const MAX_UPCOMING_LIMIT: i64 = 50;

#[derive(Deserialize)]
pub struct CreateEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub date: NaiveDate,
    /// `HH:MM` or `HH:MM:SS`.
    pub time: String,
    pub location: Option<String>,
    pub attendees: Option<String>,
    pub status: Option<EventStatus>,
    pub created_by: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct EventQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<i64>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/upcoming", get(upcoming))
        .with_state(state)
}

fn parse_time(raw: &str) -> AppResult<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("invalid time: {raw:?}")))
}

async fn create_event(
    State(state): State<SharedState>,
    Json(req): Json<CreateEvent>,
) -> AppResult<(StatusCode, Json<Event>)> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }
    let time = parse_time(&req.time)?;
    if let Some(creator) = req.created_by {
        ensure_user(&state, creator).await?;
    }

    let event = state
        .store
        .insert_event(NewEvent {
            title: req.title,
            description: req.description,
            event_type: req.event_type,
            date: req.date,
            time,
            location: req.location,
            attendees: req.attendees,
            status: req.status.unwrap_or(EventStatus::Scheduled),
            created_by: req.created_by,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn list_events(
    State(state): State<SharedState>,
    Query(query): Query<EventQuery>,
) -> AppResult<Json<Vec<Event>>> {
    let filter = EventFilter {
        from: parse_date("start_date", query.start_date.as_deref())?,
        to: parse_date("end_date", query.end_date.as_deref())?,
        event_type: parse_enum::<EventType>("event_type", query.event_type.as_deref())?,
        limit: None,
    };
    Ok(Json(state.store.list_events(&filter).await?))
}

/// Events from today onwards, earliest first.
pub async fn upcoming_events(state: &SharedState, limit: i64) -> AppResult<Vec<Event>> {
    let filter = EventFilter {
        from: Some(state.zone.today(state.now())),
        limit: Some(limit),
        ..EventFilter::default()
    };
    Ok(state.store.list_events(&filter).await?)
}

async fn upcoming(
    State(state): State<SharedState>,
    Query(query): Query<UpcomingQuery>,
) -> AppResult<Json<Vec<Event>>> {
    let limit = query.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);
    if !(1..=MAX_UPCOMING_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_UPCOMING_LIMIT}"
        )));
    }
    Ok(Json(upcoming_events(&state, limit).await?))
}
