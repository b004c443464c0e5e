use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use memeplayers_types::api::{CreateUserRequest, UpdateUserRequest};
use memeplayers_types::models::User;

use crate::auth::hash_password_blocking;
use crate::error::{ApiError, AppJson, AppPath};
use crate::middleware::Actor;
use crate::policy::{Action, Resource, authorize};
use crate::state::{AppState, run_db};
use crate::validate::Validate;

pub async fn list_users(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<User>>, ApiError> {
    authorize(&actor, Resource::Users, Action::List, None)?;
    let users = run_db(&state, |db| db.list_users()).await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    authorize(&actor, Resource::Users, Action::Create, None)?;
    req.validate()?;

    let hash = hash_password_blocking(req.password.clone()).await?;
    let user = run_db(&state, move |db| db.create_user(&req, &hash)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<User>, ApiError> {
    authorize(&actor, Resource::Users, Action::Retrieve, None)?;
    let user = run_db(&state, move |db| db.get_user(id))
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;
    Ok(Json(user))
}

/// The acting user's own profile. Open to every role.
pub async fn me(State(state): State<AppState>, actor: Actor) -> Result<Json<User>, ApiError> {
    let user = run_db(&state, move |db| db.get_user(actor.id))
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    authorize(&actor, Resource::Users, Action::Update, None)?;
    req.validate()?;

    let hash = match req.password.clone() {
        Some(password) => Some(hash_password_blocking(password).await?),
        None => None,
    };
    let user = run_db(&state, move |db| db.update_user(id, &req, hash.as_deref()))
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&actor, Resource::Users, Action::Delete, None)?;
    if !run_db(&state, move |db| db.delete_user(id)).await? {
        return Err(ApiError::not_found("user"));
    }
    Ok(StatusCode::NO_CONTENT)
}
