use super::{ensure_user, parse_enum};
use crate::analytics::task_stats::{task_stats, TaskStats};
use crate::db::TaskFilter;
use crate::domain::models::{Task, TaskPriority, TaskStatus};
use crate::domain::tasks::{self, CreateTask, UpdateTask};
use crate::error::AppResult;
use crate::state::SharedState;
use super::extract::{Json, Path, Query};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize, Default)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

impl TaskQuery {
    fn into_filter(self, user_id: Option<Uuid>) -> AppResult<TaskFilter> {
        Ok(TaskFilter {
            user_id,
            status: parse_enum::<TaskStatus>("status", self.status.as_deref())?,
            priority: parse_enum::<TaskPriority>("priority", self.priority.as_deref())?,
            category: self.category.filter(|c| !c.trim().is_empty()),
            ..TaskFilter::default()
        })
    }
}

#[derive(Serialize)]
pub struct Deleted {
    pub id: Uuid,
    pub deleted: bool,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/user/:user_id", get(user_tasks))
        .route("/stats/:user_id", get(stats))
        .route("/:id", put(update_task).delete(delete_task))
        .with_state(state)
}

async fn create_task(
    State(state): State<SharedState>,
    Json(req): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let task = tasks::create_task(state.store.as_ref(), &state.zone, req, state.now()).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn list_tasks(
    State(state): State<SharedState>,
    Query(query): Query<TaskQuery>,
) -> AppResult<Json<Vec<Task>>> {
    let filter = query.into_filter(None)?;
    Ok(Json(state.store.list_tasks(&filter).await?))
}

async fn user_tasks(
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<TaskQuery>,
) -> AppResult<Json<Vec<Task>>> {
    ensure_user(&state, user_id).await?;
    let filter = query.into_filter(Some(user_id))?;
    Ok(Json(state.store.list_tasks(&filter).await?))
}

async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdateTask>,
) -> AppResult<Json<Task>> {
    let task =
        tasks::update_task(state.store.as_ref(), &state.zone, id, update, state.now()).await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Deleted>> {
    tasks::delete_task(state.store.as_ref(), id).await?;
    Ok(Json(Deleted { id, deleted: true }))
}

async fn stats(
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<TaskStats>> {
    ensure_user(&state, user_id).await?;
    let filter = TaskFilter {
        user_id: Some(user_id),
        ..TaskFilter::default()
    };
    let rows = state.store.list_tasks(&filter).await?;
    Ok(Json(task_stats(&rows)))
}
