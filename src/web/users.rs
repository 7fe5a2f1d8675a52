use crate::db::StoreError;
use crate::domain::models::{Gender, NewUser, User};
use crate::domain::similarity::encode_embedding;
use crate::error::{AppError, AppResult};
use crate::state::SharedState;
use super::extract::{Json, Path};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub gender: Option<Gender>,
    pub face_embedding: Option<Vec<f64>>,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
}

#[derive(Deserialize)]
pub struct UpdateEmbedding {
    pub face_embedding: Vec<f64>,
}

/// Public view of a user; the stored template never leaves the service.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub has_face_embedding: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            has_face_embedding: user.is_enrolled(),
            id: user.id,
            name: user.name,
            email: user.email,
            gender: user.gender,
            created_at: user.created_at,
        }
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user))
        .route("/:id/face-embedding", put(update_embedding))
        .with_state(state)
}

fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::Validation(format!("invalid email: {raw:?}"))),
    }
}

fn required_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    Ok(name.to_string())
}

fn encode_template(values: &[f64]) -> AppResult<String> {
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return Err(AppError::Validation(
            "face_embedding must be a non-empty list of finite numbers".into(),
        ));
    }
    encode_embedding(values).map_err(|e| AppError::Internal(e.into()))
}

fn email_conflict(email: String) -> impl FnOnce(StoreError) -> AppError {
    move |err| match err {
        StoreError::UniqueViolation(_) => AppError::EmailTaken(email),
        other => other.into(),
    }
}

async fn create_user(
    State(state): State<SharedState>,
    Json(req): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let name = required_name(&req.name)?;
    let email = normalize_email(&req.email)?;
    let face_embedding = req
        .face_embedding
        .as_deref()
        .map(encode_template)
        .transpose()?;

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::EmailTaken(email));
    }

    let gender = req
        .gender
        .unwrap_or_else(|| state.gender.classify(&name));
    let user = state
        .store
        .insert_user(NewUser {
            name,
            email: email.clone(),
            gender,
            face_embedding,
        })
        .await
        .map_err(email_conflict(email))?;

    tracing::info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn list_users(State(state): State<SharedState>) -> AppResult<Json<Vec<UserView>>> {
    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

async fn load_user(state: &SharedState, id: Uuid) -> AppResult<User> {
    state
        .store
        .find_user(id)
        .await?
        .ok_or(AppError::NotFound("user"))
}

async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserView>> {
    Ok(Json(load_user(&state, id).await?.into()))
}

async fn update_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUser>,
) -> AppResult<Json<UserView>> {
    let mut user = load_user(&state, id).await?;

    if let Some(name) = req.name {
        user.name = required_name(&name)?;
    }
    if let Some(raw) = req.email {
        let email = normalize_email(&raw)?;
        if email != user.email {
            if let Some(other) = state.store.find_user_by_email(&email).await? {
                if other.id != user.id {
                    return Err(AppError::EmailTaken(email));
                }
            }
            user.email = email;
        }
    }
    if let Some(gender) = req.gender {
        user.gender = gender;
    }

    let email = user.email.clone();
    let user = state
        .store
        .update_user(&user)
        .await
        .map_err(email_conflict(email))?;
    Ok(Json(user.into()))
}

async fn update_embedding(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEmbedding>,
) -> AppResult<Json<UserView>> {
    let mut user = load_user(&state, id).await?;
    user.face_embedding = Some(encode_template(&req.face_embedding)?);
    let user = state.store.update_user(&user).await?;
    tracing::info!("Enrolled face embedding for user {}", user.id);
    Ok(Json(user.into()))
}
