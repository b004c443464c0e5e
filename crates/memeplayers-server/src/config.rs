use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

use memeplayers_api::ApiSettings;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "changeme",
    "secret",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub api: ApiSettings,
    /// Username and password of an admin to create on first start.
    pub bootstrap_admin: Option<(String, String)>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = lookup("MEMEPLAYERS_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("MEMEPLAYERS_JWT_SECRET is unset or still a placeholder");
        }

        let access_secs: u64 = parse_or(&lookup, "MEMEPLAYERS_ACCESS_TTL_SECS", 300)?;
        let refresh_secs: u64 = parse_or(&lookup, "MEMEPLAYERS_REFRESH_TTL_SECS", 86_400)?;
        let vote_rate = rate(&lookup, "MEMEPLAYERS_VOTE_RATE_PER_MIN", 30)?;
        let post_rate = rate(&lookup, "MEMEPLAYERS_POST_RATE_PER_MIN", 10)?;

        let bootstrap_admin = match (
            lookup("MEMEPLAYERS_ADMIN_USERNAME"),
            lookup("MEMEPLAYERS_ADMIN_PASSWORD"),
        ) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        };

        Ok(Self {
            host: lookup("MEMEPLAYERS_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "MEMEPLAYERS_PORT", 8000)?,
            db_path: lookup("MEMEPLAYERS_DB_PATH")
                .unwrap_or_else(|| "memeplayers.db".into())
                .into(),
            api: ApiSettings {
                jwt_secret,
                access_ttl: Duration::from_secs(access_secs),
                refresh_ttl: Duration::from_secs(refresh_secs),
                vote_rate_per_min: vote_rate,
                post_rate_per_min: post_rate,
            },
            bootstrap_admin,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn rate(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> anyhow::Result<NonZeroU32> {
    let per_min: u32 = parse_or(lookup, key, default)?;
    NonZeroU32::new(per_min).with_context(|| format!("{} must be at least 1", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[("MEMEPLAYERS_JWT_SECRET", "s3cr3t-for-tests")])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.db_path, PathBuf::from("memeplayers.db"));
        assert_eq!(config.api.access_ttl, Duration::from_secs(300));
        assert_eq!(config.api.refresh_ttl, Duration::from_secs(86_400));
        assert_eq!(config.api.vote_rate_per_min.get(), 30);
        assert_eq!(config.api.post_rate_per_min.get(), 10);
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("MEMEPLAYERS_JWT_SECRET", "dev-secret-change-me")])).is_err());
    }

    #[test]
    fn invalid_numbers_abort() {
        let bad_port = lookup(&[("MEMEPLAYERS_JWT_SECRET", "x1"), ("MEMEPLAYERS_PORT", "eighty")]);
        assert!(Config::from_lookup(bad_port).is_err());

        let zero_rate = lookup(&[("MEMEPLAYERS_JWT_SECRET", "x1"), ("MEMEPLAYERS_VOTE_RATE_PER_MIN", "0")]);
        assert!(Config::from_lookup(zero_rate).is_err());
    }

    #[test]
    fn overrides_and_admin() {
        let config = Config::from_lookup(lookup(&[
            ("MEMEPLAYERS_JWT_SECRET", "x1"),
            ("MEMEPLAYERS_PORT", "9000"),
            ("MEMEPLAYERS_POST_RATE_PER_MIN", "3"),
            ("MEMEPLAYERS_ADMIN_USERNAME", "root"),
            ("MEMEPLAYERS_ADMIN_PASSWORD", "rootpass123"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.api.post_rate_per_min.get(), 3);
        assert_eq!(
            config.bootstrap_admin,
            Some(("root".to_string(), "rootpass123".to_string()))
        );
    }
}
