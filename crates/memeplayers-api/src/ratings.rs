use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use memeplayers_types::api::RatingRequest;
use memeplayers_types::models::Rating;

use crate::error::{ApiError, AppJson, AppPath};
use crate::middleware::Actor;
use crate::policy::{Action, Resource, authorize};
use crate::state::{AppState, run_db};
use crate::validate::Validate;

fn check_rating(rater: Uuid, req: &RatingRequest) -> Result<(), ApiError> {
    req.validate()?;
    if req.rated_user == rater {
        return Err(ApiError::validation("rated_user: you cannot rate yourself"));
    }
    Ok(())
}

pub async fn list_ratings(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<Rating>>, ApiError> {
    authorize(&actor, Resource::Ratings, Action::List, None)?;
    Ok(Json(run_db(&state, |db| db.list_ratings()).await?))
}

pub async fn create_rating(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<RatingRequest>,
) -> Result<(StatusCode, Json<Rating>), ApiError> {
    authorize(&actor, Resource::Ratings, Action::Create, None)?;
    check_rating(actor.id, &req)?;

    let rating = run_db(&state, move |db| db.create_rating(actor.id, &req)).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

pub async fn get_rating(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Rating>, ApiError> {
    authorize(&actor, Resource::Ratings, Action::Retrieve, None)?;
    Ok(Json(fetch_rating(&state, id).await?))
}

pub async fn update_rating(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<RatingRequest>,
) -> Result<Json<Rating>, ApiError> {
    let rating = fetch_rating(&state, id).await?;
    authorize(&actor, Resource::Ratings, Action::Update, Some(rating.user))?;
    // The rater stays the same even when an admin edits.
    check_rating(rating.user, &req)?;

    let rating = run_db(&state, move |db| db.update_rating(id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("rating"))?;
    Ok(Json(rating))
}

pub async fn delete_rating(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let rating = fetch_rating(&state, id).await?;
    authorize(&actor, Resource::Ratings, Action::Delete, Some(rating.user))?;

    if !run_db(&state, move |db| db.delete_rating(id)).await? {
        return Err(ApiError::not_found("rating"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_rating(state: &AppState, id: Uuid) -> Result<Rating, ApiError> {
    run_db(state, move |db| db.get_rating(id))
        .await?
        .ok_or_else(|| ApiError::not_found("rating"))
}
