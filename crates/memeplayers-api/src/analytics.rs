use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use memeplayers_types::api::AnalyticsRequest;
use memeplayers_types::models::Analytics;

use crate::error::{ApiError, AppJson, AppPath};
use crate::middleware::Actor;
use crate::policy::{Action, Resource, authorize};
use crate::state::{AppState, run_db};
use crate::validate::Validate;

pub async fn list_analytics(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<Analytics>>, ApiError> {
    authorize(&actor, Resource::Analytics, Action::List, None)?;
    Ok(Json(run_db(&state, |db| db.list_analytics()).await?))
}

/// One analytics row per coin; a second one for the same coin is a conflict.
pub async fn create_analytics(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<AnalyticsRequest>,
) -> Result<(StatusCode, Json<Analytics>), ApiError> {
    authorize(&actor, Resource::Analytics, Action::Create, None)?;
    req.validate()?;
    let row = run_db(&state, move |db| db.create_analytics(&req)).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn get_analytics(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Analytics>, ApiError> {
    authorize(&actor, Resource::Analytics, Action::Retrieve, None)?;
    let row = run_db(&state, move |db| db.get_analytics(id))
        .await?
        .ok_or_else(|| ApiError::not_found("analytics"))?;
    Ok(Json(row))
}

pub async fn update_analytics(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<AnalyticsRequest>,
) -> Result<Json<Analytics>, ApiError> {
    authorize(&actor, Resource::Analytics, Action::Update, None)?;
    req.validate()?;
    let row = run_db(&state, move |db| db.update_analytics(id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("analytics"))?;
    Ok(Json(row))
}

pub async fn delete_analytics(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&actor, Resource::Analytics, Action::Delete, None)?;
    if !run_db(&state, move |db| db.delete_analytics(id)).await? {
        return Err(ApiError::not_found("analytics"));
    }
    Ok(StatusCode::NO_CONTENT)
}
