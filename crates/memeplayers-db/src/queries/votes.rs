use memeplayers_types::models::Vote;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use super::{Listing, Window};
use crate::error::OptionalExt;
use crate::models::parse_col;
use crate::{Database, Result};

pub(crate) const VOTE_COLUMNS: &str = "id, user_id, coin_id, vote_type, created_at";

pub(crate) fn vote_row(row: &Row<'_>) -> rusqlite::Result<Vote> {
    Ok(Vote {
        id: parse_col(row, 0)?,
        user: parse_col(row, 1)?,
        coin: parse_col(row, 2)?,
        vote_type: parse_col(row, 3)?,
        created_at: row.get(4)?,
    })
}

pub(crate) fn query_vote(conn: &Connection, id: Uuid) -> Result<Option<Vote>> {
    let sql = format!("SELECT {} FROM votes WHERE id = ?1", VOTE_COLUMNS);
    conn.query_row(&sql, [id.to_string()], vote_row).optional()
}

pub(crate) fn query_vote_for(conn: &Connection, user_id: Uuid, coin_id: Uuid) -> Result<Option<Vote>> {
    let sql = format!(
        "SELECT {} FROM votes WHERE user_id = ?1 AND coin_id = ?2",
        VOTE_COLUMNS
    );
    conn.query_row(&sql, params![user_id.to_string(), coin_id.to_string()], vote_row)
        .optional()
}

impl Database {
    // -- Votes (reads; writes live in the voting engine) --

    pub fn get_vote(&self, id: Uuid) -> Result<Option<Vote>> {
        self.with_conn(|conn| query_vote(conn, id))
    }

    pub fn get_vote_for(&self, user_id: Uuid, coin_id: Uuid) -> Result<Option<Vote>> {
        self.with_conn(|conn| query_vote_for(conn, user_id, coin_id))
    }

    pub fn list_votes(&self, window: Window) -> Result<Listing<Vote>> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM votes", [], |r| r.get(0))?;
            let sql = format!(
                "SELECT {} FROM votes ORDER BY created_at, id LIMIT ?1 OFFSET ?2",
                VOTE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(params![window.limit as i64, window.offset as i64], vote_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Listing {
                items,
                total: total as u64,
            })
        })
    }
}
