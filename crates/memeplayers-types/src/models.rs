use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Returned when a stored or submitted enum value is not one of the known variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    #[default]
    User,
}

string_enum!(Role, "role", {
    Admin => "admin",
    Moderator => "moderator",
    User => "user",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinCategory {
    #[default]
    Meme,
    Utility,
}

string_enum!(CoinCategory, "category", {
    Meme => "meme",
    Utility => "utility",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Upvote,
    Downvote,
}

string_enum!(VoteDirection, "vote_type", {
    Upvote => "upvote",
    Downvote => "downvote",
});

impl VoteDirection {
    /// Signed contribution of one active vote to `Coin::total_votes`.
    pub fn weight(self) -> i64 {
        match self {
            Self::Upvote => 1,
            Self::Downvote => -1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub bio: String,
    pub activity_points: i64,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A user-created token concept. Not a blockchain asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub id: Uuid,
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub category: CoinCategory,
    pub logo: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    /// Signed sum of active votes, maintained by the voting engine only.
    pub total_votes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub user: Uuid,
    pub coin: Uuid,
    pub vote_type: VoteDirection,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: Uuid,
    pub members: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author: Uuid,
    pub post: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub user: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub user: Uuid,
    pub rated_user: Uuid,
    pub rating: i64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBadge {
    pub id: Uuid,
    pub user: Uuid,
    pub badge: Uuid,
    pub awarded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user: Uuid,
    pub content: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analytics {
    pub id: Uuid,
    pub coin: Uuid,
    pub views: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub total_votes: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_their_wire_names() {
        assert_eq!("moderator".parse::<Role>().unwrap(), Role::Moderator);
        assert_eq!("utility".parse::<CoinCategory>().unwrap(), CoinCategory::Utility);
        assert_eq!("downvote".parse::<VoteDirection>().unwrap(), VoteDirection::Downvote);

        let err = "sideways".parse::<VoteDirection>().unwrap_err();
        assert_eq!(err.kind, "vote_type");
        assert_eq!(err.to_string(), "invalid vote_type 'sideways'");
    }

    #[test]
    fn serde_matches_as_str() {
        let json = serde_json::to_string(&VoteDirection::Upvote).unwrap();
        assert_eq!(json, "\"upvote\"");
        assert_eq!(Role::default(), Role::User);
        assert_eq!(CoinCategory::default().as_str(), "meme");
    }

    #[test]
    fn vote_weights_are_signed_units() {
        assert_eq!(VoteDirection::Upvote.weight(), 1);
        assert_eq!(VoteDirection::Downvote.weight(), -1);
    }
}
