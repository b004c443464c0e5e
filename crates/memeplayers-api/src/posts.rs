use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use memeplayers_db::PostOrdering;
use memeplayers_types::api::{CommentRequest, Paginated, PostRequest};
use memeplayers_types::models::{Comment, Post};

use crate::error::{ApiError, AppJson, AppPath, AppQuery};
use crate::middleware::Actor;
use crate::pagination::Page;
use crate::policy::{Action, Resource, authorize};
use crate::state::{AppState, run_db};
use crate::validate::Validate;

#[derive(Debug, Deserialize)]
pub struct PostQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// -- Posts --

pub async fn list_posts(
    State(state): State<AppState>,
    actor: Actor,
    AppQuery(query): AppQuery<PostQuery>,
) -> Result<Json<Paginated<Post>>, ApiError> {
    authorize(&actor, Resource::Posts, Action::List, None)?;
    let page = Page::new(query.page, query.page_size)?;
    let ordering = match query.ordering.as_deref() {
        None | Some("") => PostOrdering::default(),
        Some(raw) => PostOrdering::parse(raw)
            .ok_or_else(|| ApiError::validation(format!("ordering: unknown field '{}'", raw)))?,
    };
    let search = query.search.filter(|s| !s.trim().is_empty());

    let listing = run_db(&state, move |db| {
        db.list_posts(search.as_deref(), ordering, page.window())
    })
    .await?;
    Ok(Json(page.wrap(listing)?))
}

pub async fn create_post(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<PostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    authorize(&actor, Resource::Posts, Action::Create, None)?;
    req.validate()?;
    state.post_throttle.check(actor.id)?;

    let author = actor.id;
    let post = run_db(&state, move |db| db.create_post(author, &req)).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Post>, ApiError> {
    authorize(&actor, Resource::Posts, Action::Retrieve, None)?;
    Ok(Json(fetch_post(&state, id).await?))
}

pub async fn update_post(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<PostRequest>,
) -> Result<Json<Post>, ApiError> {
    let post = fetch_post(&state, id).await?;
    authorize(&actor, Resource::Posts, Action::Update, Some(post.author))?;
    req.validate()?;

    let post = run_db(&state, move |db| db.update_post(id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("post"))?;
    Ok(Json(post))
}

/// Removes the post and its comments.
pub async fn delete_post(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let post = fetch_post(&state, id).await?;
    authorize(&actor, Resource::Posts, Action::Delete, Some(post.author))?;

    if !run_db(&state, move |db| db.delete_post(id)).await? {
        return Err(ApiError::not_found("post"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_post(state: &AppState, id: Uuid) -> Result<Post, ApiError> {
    run_db(state, move |db| db.get_post(id))
        .await?
        .ok_or_else(|| ApiError::not_found("post"))
}

// -- Comments --

pub async fn list_comments(
    State(state): State<AppState>,
    actor: Actor,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Paginated<Comment>>, ApiError> {
    authorize(&actor, Resource::Comments, Action::List, None)?;
    let page = Page::new(query.page, query.page_size)?;
    let listing = run_db(&state, move |db| db.list_comments(page.window())).await?;
    Ok(Json(page.wrap(listing)?))
}

pub async fn create_comment(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    authorize(&actor, Resource::Comments, Action::Create, None)?;
    req.validate()?;

    let author = actor.id;
    let comment = run_db(&state, move |db| db.create_comment(author, &req)).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_comment(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Comment>, ApiError> {
    authorize(&actor, Resource::Comments, Action::Retrieve, None)?;
    Ok(Json(fetch_comment(&state, id).await?))
}

pub async fn update_comment(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<CommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    let comment = fetch_comment(&state, id).await?;
    authorize(&actor, Resource::Comments, Action::Update, Some(comment.author))?;
    req.validate()?;

    let comment = run_db(&state, move |db| db.update_comment(id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("comment"))?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let comment = fetch_comment(&state, id).await?;
    authorize(&actor, Resource::Comments, Action::Delete, Some(comment.author))?;

    if !run_db(&state, move |db| db.delete_comment(id)).await? {
        return Err(ApiError::not_found("comment"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_comment(state: &AppState, id: Uuid) -> Result<Comment, ApiError> {
    run_db(state, move |db| db.get_comment(id))
        .await?
        .ok_or_else(|| ApiError::not_found("comment"))
}
