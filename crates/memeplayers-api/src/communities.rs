use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use memeplayers_types::api::{CommunityRequest, Paginated};
use memeplayers_types::models::Community;

use crate::error::{ApiError, AppJson, AppPath, AppQuery};
use crate::middleware::Actor;
use crate::pagination::Page;
use crate::policy::{Action, Resource, authorize};
use crate::state::{AppState, run_db};
use crate::validate::Validate;

#[derive(Debug, Deserialize)]
pub struct CommunityQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

pub async fn list_communities(
    State(state): State<AppState>,
    actor: Actor,
    AppQuery(query): AppQuery<CommunityQuery>,
) -> Result<Json<Paginated<Community>>, ApiError> {
    authorize(&actor, Resource::Communities, Action::List, None)?;
    let page = Page::new(query.page, query.page_size)?;
    let search = query.search.filter(|s| !s.trim().is_empty());

    let listing = run_db(&state, move |db| {
        db.list_communities(search.as_deref(), page.window())
    })
    .await?;
    Ok(Json(page.wrap(listing)?))
}

pub async fn create_community(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<CommunityRequest>,
) -> Result<(StatusCode, Json<Community>), ApiError> {
    authorize(&actor, Resource::Communities, Action::Create, None)?;
    req.validate()?;

    let community = run_db(&state, move |db| db.create_community(actor.id, &req)).await?;
    Ok((StatusCode::CREATED, Json(community)))
}

pub async fn get_community(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Community>, ApiError> {
    authorize(&actor, Resource::Communities, Action::Retrieve, None)?;
    let community = run_db(&state, move |db| db.get_community(id))
        .await?
        .ok_or_else(|| ApiError::not_found("community"))?;
    Ok(Json(community))
}

pub async fn update_community(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<CommunityRequest>,
) -> Result<Json<Community>, ApiError> {
    authorize(&actor, Resource::Communities, Action::Update, None)?;
    req.validate()?;

    let community = run_db(&state, move |db| db.update_community(id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("community"))?;
    Ok(Json(community))
}

pub async fn delete_community(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&actor, Resource::Communities, Action::Delete, None)?;
    if !run_db(&state, move |db| db.delete_community(id)).await? {
        return Err(ApiError::not_found("community"));
    }

    info!("Community {} deleted by {}", id, actor.username);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn join_community(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Community>, ApiError> {
    let user_id = actor.id;
    let community = run_db(&state, move |db| db.join_community(id, user_id))
        .await?
        .ok_or_else(|| ApiError::not_found("community"))?;
    Ok(Json(community))
}

pub async fn leave_community(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Community>, ApiError> {
    let user_id = actor.id;
    let community = run_db(&state, move |db| db.leave_community(id, user_id))
        .await?
        .ok_or_else(|| ApiError::not_found("community"))?;
    Ok(Json(community))
}
