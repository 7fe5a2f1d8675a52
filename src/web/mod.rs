pub mod attendance;
pub mod dashboard;
pub mod events;
mod extract;
pub mod reports;
pub mod tasks;
pub mod users;

use crate::error::{AppError, AppResult};
use crate::state::SharedState;
use axum::{routing::get, Router};
use chrono::NaiveDate;
use uuid::Uuid;

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/users", users::router(state.clone()))
        .nest("/attendance", attendance::router(state.clone()))
        .nest("/tasks", tasks::router(state.clone()))
        .nest("/events", events::router(state.clone()))
        .nest("/dashboard", dashboard::router(state.clone()))
        .nest("/reports", reports::router(state))
}

/// Parses an optional `YYYY-MM-DD` query value.
pub(crate) fn parse_date(field: &str, raw: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{field} must be YYYY-MM-DD, got {value:?}"))),
    }
}

/// Parses an optional enum query value such as `status=late`.
pub(crate) fn parse_enum<T>(field: &str, raw: Option<&str>) -> AppResult<Option<T>>
where
    T: for<'a> TryFrom<&'a str, Error = ()>,
{
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => T::try_from(value)
            .map(Some)
            .map_err(|_| AppError::Validation(format!("unknown {field}: {value:?}"))),
    }
}

pub(crate) async fn ensure_user(state: &SharedState, user_id: Uuid) -> AppResult<()> {
    state
        .store
        .find_user(user_id)
        .await?
        .map(|_| ())
        .ok_or(AppError::NotFound("user"))
}
