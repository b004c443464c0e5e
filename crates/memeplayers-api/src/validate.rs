//! Field validation for request bodies. Each request type checks its own
//! required fields and length limits before anything reaches the store.

use memeplayers_types::api::{
    AnalyticsRequest, BadgeRequest, CoinRequest, CommentRequest, CommunityRequest,
    CreateUserRequest, NoteRequest, NotificationRequest, PostRequest, RatingRequest,
    UpdateUserRequest,
};

use url::Url;

use crate::error::ApiError;

pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;
const EMAIL_MAX: usize = 254;
const PASSWORD_MIN: usize = 8;
const URL_MAX: usize = 200;

pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

fn required(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{}: this field may not be blank", field)));
    }
    max_len(field, value, max)
}

fn max_len(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::validation(format!(
            "{}: ensure this field has no more than {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Image fields hold a URL when set.
fn optional_url(field: &str, value: Option<&str>) -> Result<(), ApiError> {
    match value {
        Some(v) if !v.is_empty() => url(field, v),
        _ => Ok(()),
    }
}

fn non_negative(field: &str, value: i64) -> Result<(), ApiError> {
    if value < 0 {
        return Err(ApiError::validation(format!("{}: must not be negative", field)));
    }
    Ok(())
}

fn username(value: &str) -> Result<(), ApiError> {
    if !USERNAME_LEN.contains(&value.chars().count()) {
        return Err(ApiError::validation(format!(
            "username: must be {} to {} characters",
            USERNAME_LEN.start(),
            USERNAME_LEN.end()
        )));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !value.chars().all(allowed) {
        return Err(ApiError::validation(
            "username: only letters, digits and @/./+/-/_ are allowed",
        ));
    }
    Ok(())
}

fn email(value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Ok(());
    }
    max_len("email", value, EMAIL_MAX)?;
    match value.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !value.contains(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err(ApiError::validation("email: enter a valid email address")),
    }
}

fn password(value: &str) -> Result<(), ApiError> {
    if value.chars().count() < PASSWORD_MIN {
        return Err(ApiError::validation(format!(
            "password: must be at least {} characters",
            PASSWORD_MIN
        )));
    }
    Ok(())
}

/// An absolute http(s) URL with a host and no whitespace.
pub fn url(field: &str, value: &str) -> Result<(), ApiError> {
    max_len(field, value, URL_MAX)?;
    let invalid = || ApiError::validation(format!("{}: enter a valid URL", field));

    // Url::parse trims surrounding spaces, so reject them up front.
    if value.contains(char::is_whitespace) {
        return Err(invalid());
    }
    let parsed = Url::parse(value).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        username(&self.username)?;
        password(&self.password)?;
        email(&self.email)?;
        optional_url("avatar", self.avatar.as_deref())?;
        non_negative("activity_points", self.activity_points)
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        username(&self.username)?;
        if let Some(p) = &self.password {
            password(p)?;
        }
        email(&self.email)?;
        optional_url("avatar", self.avatar.as_deref())?;
        non_negative("activity_points", self.activity_points)
    }
}

impl Validate for CoinRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("name", &self.name, 100)?;
        required("symbol", &self.symbol, 100)?;
        required("description", &self.description, usize::MAX)?;
        optional_url("logo", self.logo.as_deref())
    }
}

impl Validate for CommunityRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("name", &self.name, 100)?;
        required("description", &self.description, usize::MAX)
    }
}

impl Validate for PostRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("title", &self.title, 200)?;
        required("content", &self.content, usize::MAX)
    }
}

impl Validate for CommentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("content", &self.content, usize::MAX)
    }
}

impl Validate for NoteRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("title", &self.title, 100)?;
        required("content", &self.content, usize::MAX)
    }
}

impl Validate for RatingRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if !RATING_RANGE.contains(&self.rating) {
            return Err(ApiError::validation(format!(
                "rating: must be between {} and {}",
                RATING_RANGE.start(),
                RATING_RANGE.end()
            )));
        }
        Ok(())
    }
}

impl Validate for BadgeRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("name", &self.name, 50)?;
        required("description", &self.description, usize::MAX)?;
        optional_url("icon", self.icon.as_deref())
    }
}

impl Validate for NotificationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        required("content", &self.content, usize::MAX)?;
        optional_url("link", self.link.as_deref())
    }
}

impl Validate for AnalyticsRequest {
    fn validate(&self) -> Result<(), ApiError> {
        non_negative("views", self.views)?;
        non_negative("upvotes", self.upvotes)?;
        non_negative("downvotes", self.downvotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn rating_range_is_enforced() {
        let mut req = RatingRequest {
            rated_user: Uuid::new_v4(),
            rating: 5,
            comment: String::new(),
        };
        assert!(req.validate().is_ok());
        for bad in [0, 6, -1] {
            req.rating = bad;
            assert!(matches!(req.validate(), Err(ApiError::Validation(_))));
        }
    }

    #[test]
    fn blank_and_oversized_fields() {
        let mut coin = CoinRequest {
            name: "Test Coin".into(),
            symbol: "TC".into(),
            description: "A test coin".into(),
            category: Default::default(),
            logo: None,
        };
        assert!(coin.validate().is_ok());

        coin.name = "   ".into();
        assert!(coin.validate().is_err());

        coin.name = "x".repeat(101);
        assert!(coin.validate().is_err());
    }

    #[test]
    fn link_must_look_like_a_url() {
        assert!(url("link", "https://example.com/coins/1").is_ok());
        assert!(url("link", "http://localhost:8000").is_ok());
        assert!(url("link", "ftp://example.com").is_err());
        assert!(url("link", "https://").is_err());
        assert!(url("link", "https://exa mple.com").is_err());
        assert!(url("link", "not a url").is_err());
        assert!(url("link", " https://example.com").is_err());
        assert!(url("link", &format!("https://example.com/{}", "a".repeat(200))).is_err());
    }

    #[test]
    fn malformed_urls_are_rejected() {
        for bad in [
            "http://[::1",
            "https://@",
            "http://:",
            "http://exa%mple..com:99999",
            "https://exa<mple.com",
            "mailto:someone@example.com",
        ] {
            assert!(url("link", bad).is_err(), "{:?} should be rejected", bad);
        }
        assert!(url("link", "http://[::1]:8000/icon.png").is_ok());
    }

    #[test]
    fn user_fields() {
        let req = CreateUserRequest {
            username: "bad name".into(),
            password: "testpass123".into(),
            email: String::new(),
            avatar: None,
            bio: String::new(),
            activity_points: 0,
            role: Default::default(),
        };
        assert!(req.validate().is_err());
        assert!(username("ab").is_err());
        assert!(username(&"a".repeat(33)).is_err());
        assert!(username("test.user+1").is_ok());
        assert!(email("test@example.com").is_ok());
        assert!(email("nope").is_err());
        assert!(password("short").is_err());
    }
}
