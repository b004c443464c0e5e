use std::time::Duration;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Value, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use memeplayers_types::api::{
    AccessTokenResponse, Claims, TokenObtainRequest, TokenPairResponse, TokenRefreshRequest,
    TokenType, TokenVerifyRequest,
};

use crate::error::{ApiError, AppJson};
use crate::state::{AppState, run_blocking, run_db};

/// Well-formed Argon2id hash with default cost that matches no password.
/// Unknown usernames are checked against it so a failed login always costs
/// one Argon2 verification.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a password with Argon2id.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal
        })
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
    run_blocking(move || hash_password(&password)).await
}

fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn create_token(
    secret: &str,
    ttl: Duration,
    user_id: Uuid,
    username: &str,
    token_type: TokenType,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        token_type,
        exp: (chrono::Utc::now().timestamp() + ttl.as_secs() as i64) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!("Token encoding failed: {}", e);
        ApiError::Internal
    })
}

/// Decode and validate a token, rejecting the wrong token type.
pub fn decode_token(secret: &str, token: &str, expected: TokenType) -> Result<Claims, ApiError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("token is invalid or expired".into()))?
    .claims;

    if claims.token_type != expected {
        return Err(ApiError::Unauthorized("token has wrong type".into()));
    }
    Ok(claims)
}

pub async fn obtain_token(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenObtainRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let username = req.username.clone();
    let row = run_db(&state, move |db| db.get_user_by_username(&username)).await?;

    let password = req.password;
    let row = run_blocking(move || {
        let stored = row.as_ref().map_or(DUMMY_HASH, |row| row.password.as_str());
        let valid = verify_password(&password, stored);
        Ok(row.filter(|_| valid))
    })
    .await?;

    let Some(row) = row else {
        warn!("Failed login for {}", req.username);
        return Err(ApiError::Unauthorized(
            "no active account found with the given credentials".into(),
        ));
    };

    let user = row.user;
    let access = create_token(
        &state.jwt_secret,
        state.access_ttl,
        user.id,
        &user.username,
        TokenType::Access,
    )?;
    let refresh = create_token(
        &state.jwt_secret,
        state.refresh_ttl,
        user.id,
        &user.username,
        TokenType::Refresh,
    )?;

    info!("Issued token pair for {}", user.username);
    Ok(Json(TokenPairResponse { access, refresh }))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenRefreshRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let claims = decode_token(&state.jwt_secret, &req.refresh, TokenType::Refresh)?;

    // The account may have been deleted since the refresh token was issued.
    let user = run_db(&state, move |db| db.get_user(claims.sub))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))?;

    let access = create_token(
        &state.jwt_secret,
        state.access_ttl,
        user.id,
        &user.username,
        TokenType::Access,
    )?;
    Ok(Json(AccessTokenResponse { access }))
}

pub async fn verify_token(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenVerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    decode_token(&state.jwt_secret, &req.token, TokenType::Access)?;
    Ok(Json(json!({})))
}
