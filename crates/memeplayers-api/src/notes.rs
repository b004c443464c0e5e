use axum::{Json, extract::State, http::StatusCode};
use tracing::info;
use uuid::Uuid;

use memeplayers_types::api::{NoteRequest, NotificationRequest};
use memeplayers_types::models::{Note, Notification};

use crate::error::{ApiError, AppJson, AppPath};
use crate::middleware::Actor;
use crate::policy::{Action, Resource, authorize};
use crate::state::{AppState, run_db};
use crate::validate::Validate;

// Notes and notifications are private. Every call is keyed by the actor, so
// someone else's record answers 404.

// -- Notes --

pub async fn list_notes(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<Note>>, ApiError> {
    authorize(&actor, Resource::Notes, Action::List, None)?;
    let notes = run_db(&state, move |db| db.list_notes(actor.id)).await?;
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<NoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    authorize(&actor, Resource::Notes, Action::Create, None)?;
    req.validate()?;
    let note = run_db(&state, move |db| db.create_note(actor.id, &req)).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn get_note(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Note>, ApiError> {
    authorize(&actor, Resource::Notes, Action::Retrieve, None)?;
    let note = run_db(&state, move |db| db.get_note(actor.id, id))
        .await?
        .ok_or_else(|| ApiError::not_found("note"))?;
    Ok(Json(note))
}

pub async fn update_note(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<NoteRequest>,
) -> Result<Json<Note>, ApiError> {
    authorize(&actor, Resource::Notes, Action::Update, None)?;
    req.validate()?;
    let note = run_db(&state, move |db| db.update_note(actor.id, id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("note"))?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&actor, Resource::Notes, Action::Delete, None)?;
    let owner = actor.id;
    if !run_db(&state, move |db| db.delete_note(owner, id)).await? {
        return Err(ApiError::not_found("note"));
    }

    info!("Note {} deleted by {}", id, actor.username);
    Ok(StatusCode::NO_CONTENT)
}

// -- Notifications --

pub async fn list_notifications(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<Notification>>, ApiError> {
    authorize(&actor, Resource::Notifications, Action::List, None)?;
    let items = run_db(&state, move |db| db.list_notifications(actor.id)).await?;
    Ok(Json(items))
}

pub async fn create_notification(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<NotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    authorize(&actor, Resource::Notifications, Action::Create, None)?;
    req.validate()?;
    let item = run_db(&state, move |db| db.create_notification(actor.id, &req)).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_notification(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    authorize(&actor, Resource::Notifications, Action::Retrieve, None)?;
    let item = run_db(&state, move |db| db.get_notification(actor.id, id))
        .await?
        .ok_or_else(|| ApiError::not_found("notification"))?;
    Ok(Json(item))
}

pub async fn update_notification(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<NotificationRequest>,
) -> Result<Json<Notification>, ApiError> {
    authorize(&actor, Resource::Notifications, Action::Update, None)?;
    req.validate()?;
    let item = run_db(&state, move |db| db.update_notification(actor.id, id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("notification"))?;
    Ok(Json(item))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&actor, Resource::Notifications, Action::Delete, None)?;
    if !run_db(&state, move |db| db.delete_notification(actor.id, id)).await? {
        return Err(ApiError::not_found("notification"));
    }
    Ok(StatusCode::NO_CONTENT)
}
