use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use memeplayers_db::{VoteChange, Window};
use memeplayers_types::api::{CastVoteRequest, CastVoteResponse, UpdateVoteRequest, VoteOutcome};
use memeplayers_types::models::Vote;

use crate::error::{ApiError, AppJson, AppPath};
use crate::middleware::Actor;
use crate::policy::{Action, Resource, authorize};
use crate::state::{AppState, run_db};

fn response(change: VoteChange) -> CastVoteResponse {
    CastVoteResponse {
        outcome: change.outcome,
        vote: change.vote,
        coin: change.coin,
        total_votes: change.total_votes,
    }
}

pub async fn list_votes(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<Vote>>, ApiError> {
    authorize(&actor, Resource::Votes, Action::List, None)?;
    let listing = run_db(&state, |db| db.list_votes(Window::ALL)).await?;
    Ok(Json(listing.items))
}

/// Toggle the actor's vote on a coin. Only a newly created vote answers 201.
pub async fn cast_vote(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<CastVoteRequest>,
) -> Result<(StatusCode, Json<CastVoteResponse>), ApiError> {
    authorize(&actor, Resource::Votes, Action::Create, None)?;
    state.vote_throttle.check(actor.id)?;

    let user_id = actor.id;
    let change = run_db(&state, move |db| db.cast_vote(user_id, req.coin, req.vote_type)).await?;

    let status = match change.outcome {
        VoteOutcome::Created => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(response(change))))
}

pub async fn get_vote(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Vote>, ApiError> {
    authorize(&actor, Resource::Votes, Action::Retrieve, None)?;
    let vote = fetch_vote(&state, id).await?;
    Ok(Json(vote))
}

/// Set an existing vote's direction. Never retracts.
pub async fn update_vote(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateVoteRequest>,
) -> Result<Json<CastVoteResponse>, ApiError> {
    let vote = fetch_vote(&state, id).await?;
    authorize(&actor, Resource::Votes, Action::Update, Some(vote.user))?;

    let change = run_db(&state, move |db| db.set_vote_direction(id, req.vote_type))
        .await?
        .ok_or_else(|| ApiError::not_found("vote"))?;
    Ok(Json(response(change)))
}

/// Retract a vote by id, undoing its contribution to the coin.
pub async fn delete_vote(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let vote = fetch_vote(&state, id).await?;
    authorize(&actor, Resource::Votes, Action::Delete, Some(vote.user))?;

    run_db(&state, move |db| db.retract_vote(id))
        .await?
        .ok_or_else(|| ApiError::not_found("vote"))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_vote(state: &AppState, id: Uuid) -> Result<Vote, ApiError> {
    run_db(state, move |db| db.get_vote(id))
        .await?
        .ok_or_else(|| ApiError::not_found("vote"))
}
