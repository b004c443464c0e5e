use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use memeplayers_types::api::TokenType;
use memeplayers_types::models::{Role, User};

use crate::auth::decode_token;
use crate::error::ApiError;
use crate::state::{AppState, run_db};

/// The authenticated user behind a request.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<User> for Actor {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

/// Extract and validate the access token from the Authorization header, then
/// load the user so role changes and deletions take effect immediately.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("authentication credentials were not provided".into()))?;

    let claims = decode_token(&state.jwt_secret, token, TokenType::Access)?;

    let user = run_db(&state, move |db| db.get_user(claims.sub))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user not found".into()))?;

    req.extensions_mut().insert(Actor::from(user));
    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("authentication required".into()))
    }
}
