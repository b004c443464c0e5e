use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use memeplayers_db::{CoinFilter, CoinOrdering, Window};
use memeplayers_types::api::CoinRequest;
use memeplayers_types::models::{Coin, CoinCategory};

use crate::error::{ApiError, AppJson, AppPath, AppQuery};
use crate::middleware::Actor;
use crate::policy::{Action, Resource, authorize};
use crate::state::{AppState, run_db};
use crate::validate::Validate;

#[derive(Debug, Deserialize)]
pub struct CoinQuery {
    pub category: Option<CoinCategory>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl CoinQuery {
    fn into_filter(self) -> Result<CoinFilter, ApiError> {
        let ordering = match self.ordering.as_deref() {
            None | Some("") => CoinOrdering::default(),
            Some(raw) => CoinOrdering::parse(raw)
                .ok_or_else(|| ApiError::validation(format!("ordering: unknown field '{}'", raw)))?,
        };
        Ok(CoinFilter {
            category: self.category,
            search: self.search.filter(|s| !s.trim().is_empty()),
            ordering,
        })
    }
}

pub async fn list_coins(
    State(state): State<AppState>,
    actor: Actor,
    AppQuery(query): AppQuery<CoinQuery>,
) -> Result<Json<Vec<Coin>>, ApiError> {
    authorize(&actor, Resource::Coins, Action::List, None)?;
    let filter = query.into_filter()?;
    let listing = run_db(&state, move |db| db.list_coins(&filter, Window::ALL)).await?;
    Ok(Json(listing.items))
}

pub async fn create_coin(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(req): AppJson<CoinRequest>,
) -> Result<(StatusCode, Json<Coin>), ApiError> {
    authorize(&actor, Resource::Coins, Action::Create, None)?;
    req.validate()?;

    let creator = actor.id;
    let coin = run_db(&state, move |db| db.create_coin(creator, &req)).await?;
    Ok((StatusCode::CREATED, Json(coin)))
}

pub async fn get_coin(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Coin>, ApiError> {
    authorize(&actor, Resource::Coins, Action::Retrieve, None)?;
    let coin = fetch_coin(&state, id).await?;
    Ok(Json(coin))
}

pub async fn update_coin(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<CoinRequest>,
) -> Result<Json<Coin>, ApiError> {
    let coin = fetch_coin(&state, id).await?;
    authorize(&actor, Resource::Coins, Action::Update, Some(coin.created_by))?;
    req.validate()?;

    let coin = run_db(&state, move |db| db.update_coin(id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("coin"))?;
    Ok(Json(coin))
}

/// Removes the coin with its votes and analytics.
pub async fn delete_coin(
    State(state): State<AppState>,
    actor: Actor,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let coin = fetch_coin(&state, id).await?;
    authorize(&actor, Resource::Coins, Action::Delete, Some(coin.created_by))?;

    if !run_db(&state, move |db| db.delete_coin(id)).await? {
        return Err(ApiError::not_found("coin"));
    }
    info!("Coin {} ({}) deleted by {}", coin.symbol, id, actor.username);
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_coin(state: &AppState, id: Uuid) -> Result<Coin, ApiError> {
    run_db(state, move |db| db.get_coin(id))
        .await?
        .ok_or_else(|| ApiError::not_found("coin"))
}
