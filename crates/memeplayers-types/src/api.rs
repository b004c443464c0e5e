use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CoinCategory, Role, Vote, VoteDirection};

// -- JWT Claims --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims for both access and refresh tokens. `token_type` keeps the two
/// from being used interchangeably.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub token_type: TokenType,
    pub exp: usize,
}

// -- Tokens --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenObtainRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenRefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenVerifyRequest {
    pub token: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub activity_points: i64,
    #[serde(default)]
    pub role: Role,
}

/// Full replace of a user profile. `password` resets the password when present.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub activity_points: i64,
    pub role: Role,
    #[serde(default)]
    pub password: Option<String>,
}

// -- Coins --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoinRequest {
    pub name: String,
    pub symbol: String,
    pub description: String,
    #[serde(default)]
    pub category: CoinCategory,
    #[serde(default)]
    pub logo: Option<String>,
}

// -- Votes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CastVoteRequest {
    pub coin: Uuid,
    pub vote_type: VoteDirection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateVoteRequest {
    pub vote_type: VoteDirection,
}

/// What a vote mutation did to the (user, coin) vote slot. `Unchanged` only
/// comes from setting a vote to the direction it already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteOutcome {
    Created,
    Flipped,
    Retracted,
    Unchanged,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CastVoteResponse {
    pub outcome: VoteOutcome,
    pub vote: Option<Vote>,
    pub coin: Uuid,
    pub total_votes: i64,
}

// -- Communities --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommunityRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub members: Vec<Uuid>,
}

// -- Posts & comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentRequest {
    pub content: String,
    pub post: Uuid,
}

// -- Notes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoteRequest {
    pub title: String,
    pub content: String,
}

// -- Ratings --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RatingRequest {
    pub rated_user: Uuid,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

// -- Badges --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BadgeRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserBadgeRequest {
    pub user: Uuid,
    pub badge: Uuid,
}

// -- Notifications --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationRequest {
    pub content: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub read: bool,
}

// -- Analytics --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsRequest {
    pub coin: Uuid,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub total_votes: i64,
}

// -- Listing --

/// One page of a paginated collection. `next`/`previous` are page numbers.
#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}
