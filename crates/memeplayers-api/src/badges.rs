use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use memeplayers_types::api::{BadgeRequest, UserBadgeRequest};
use memeplayers_types::models::{Badge, UserBadge};

use crate::error::{ApiError, AppJson, AppPath};
use crate::middleware::Actor;
use crate::policy::{Action, Resource, authorize};
use crate::state::{AppState, run_db};
use crate::validate::Validate;

// -- Badges --

pub async fn list_badges(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<Badge>>, ApiError> {
    authorize(&actor, Resource::Badges, Action::List, None)?;
    Ok(Json(run_db(&state, |db| db.list_badges()).await?))
}

pub async fn create_badge(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<BadgeRequest>,
) -> Result<(StatusCode, Json<Badge>), ApiError> {
    authorize(&actor, Resource::Badges, Action::Create, None)?;
    req.validate()?;
    let badge = run_db(&state, move |db| db.create_badge(&req)).await?;
    Ok((StatusCode::CREATED, Json(badge)))
}

pub async fn get_badge(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Badge>, ApiError> {
    authorize(&actor, Resource::Badges, Action::Retrieve, None)?;
    let badge = run_db(&state, move |db| db.get_badge(id))
        .await?
        .ok_or_else(|| ApiError::not_found("badge"))?;
    Ok(Json(badge))
}

pub async fn update_badge(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<BadgeRequest>,
) -> Result<Json<Badge>, ApiError> {
    authorize(&actor, Resource::Badges, Action::Update, None)?;
    req.validate()?;
    let badge = run_db(&state, move |db| db.update_badge(id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("badge"))?;
    Ok(Json(badge))
}

pub async fn delete_badge(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&actor, Resource::Badges, Action::Delete, None)?;
    if !run_db(&state, move |db| db.delete_badge(id)).await? {
        return Err(ApiError::not_found("badge"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// -- Badge awards --

pub async fn list_user_badges(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<UserBadge>>, ApiError> {
    authorize(&actor, Resource::UserBadges, Action::List, None)?;
    Ok(Json(run_db(&state, |db| db.list_user_badges()).await?))
}

pub async fn create_user_badge(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<UserBadgeRequest>,
) -> Result<(StatusCode, Json<UserBadge>), ApiError> {
    authorize(&actor, Resource::UserBadges, Action::Create, None)?;
    let award = run_db(&state, move |db| db.award_badge(&req)).await?;
    Ok((StatusCode::CREATED, Json(award)))
}

pub async fn get_user_badge(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<UserBadge>, ApiError> {
    authorize(&actor, Resource::UserBadges, Action::Retrieve, None)?;
    let award = run_db(&state, move |db| db.get_user_badge(id))
        .await?
        .ok_or_else(|| ApiError::not_found("user badge"))?;
    Ok(Json(award))
}

pub async fn update_user_badge(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UserBadgeRequest>,
) -> Result<Json<UserBadge>, ApiError> {
    authorize(&actor, Resource::UserBadges, Action::Update, None)?;
    let award = run_db(&state, move |db| db.update_user_badge(id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("user badge"))?;
    Ok(Json(award))
}

pub async fn delete_user_badge(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&actor, Resource::UserBadges, Action::Delete, None)?;
    if !run_db(&state, move |db| db.delete_user_badge(id)).await? {
        return Err(ApiError::not_found("user badge"));
    }
    Ok(StatusCode::NO_CONTENT)
}
