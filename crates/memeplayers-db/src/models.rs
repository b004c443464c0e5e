//! Database row types and column decoding helpers.
//! Rows whose shape matches the public model decode straight into
//! `memeplayers_types::models`; only users carry extra private columns.

use std::str::FromStr;

use memeplayers_types::models::User;
use rusqlite::Row;
use rusqlite::types::Type;

/// A user together with the stored argon2 hash. Never serialized.
pub struct UserRow {
    pub user: User,
    pub password: String,
}

/// Decode a TEXT column through `FromStr` (UUIDs and the string enums).
pub(crate) fn parse_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
