use chrono::Utc;
use memeplayers_types::api::AnalyticsRequest;
use memeplayers_types::models::Analytics;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use crate::error::OptionalExt;
use crate::models::parse_col;
use crate::{Database, Result};

const ANALYTICS_COLUMNS: &str = "id, coin_id, views, upvotes, downvotes, total_votes, created_at";

fn analytics_row(row: &Row<'_>) -> rusqlite::Result<Analytics> {
    Ok(Analytics {
        id: parse_col(row, 0)?,
        coin: parse_col(row, 1)?,
        views: row.get(2)?,
        upvotes: row.get(3)?,
        downvotes: row.get(4)?,
        total_votes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn query_analytics(conn: &Connection, id: Uuid) -> Result<Option<Analytics>> {
    let sql = format!("SELECT {} FROM analytics WHERE id = ?1", ANALYTICS_COLUMNS);
    conn.query_row(&sql, [id.to_string()], analytics_row).optional()
}

impl Database {
    // -- Analytics (one row per coin) --

    pub fn create_analytics(&self, req: &AnalyticsRequest) -> Result<Analytics> {
        let analytics = Analytics {
            id: Uuid::new_v4(),
            coin: req.coin,
            views: req.views,
            upvotes: req.upvotes,
            downvotes: req.downvotes,
            total_votes: req.total_votes,
            created_at: Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO analytics (id, coin_id, views, upvotes, downvotes, total_votes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    analytics.id.to_string(),
                    req.coin.to_string(),
                    req.views,
                    req.upvotes,
                    req.downvotes,
                    req.total_votes,
                    analytics.created_at,
                ],
            )?;
            Ok(())
        })?;
        Ok(analytics)
    }

    pub fn get_analytics(&self, id: Uuid) -> Result<Option<Analytics>> {
        self.with_conn(|conn| query_analytics(conn, id))
    }

    pub fn list_analytics(&self) -> Result<Vec<Analytics>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM analytics ORDER BY created_at, id", ANALYTICS_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], analytics_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_analytics(&self, id: Uuid, req: &AnalyticsRequest) -> Result<Option<Analytics>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE analytics SET coin_id = ?2, views = ?3, upvotes = ?4, downvotes = ?5, total_votes = ?6
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    req.coin.to_string(),
                    req.views,
                    req.upvotes,
                    req.downvotes,
                    req.total_votes,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_analytics(conn, id)
        })
    }

    pub fn delete_analytics(&self, id: Uuid) -> Result<bool> {
        let n = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM analytics WHERE id = ?1", [id.to_string()])?)
        })?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;
    use crate::test_support::{coin, user};

    #[test]
    fn one_analytics_row_per_coin() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "testuser");
        let c = coin(&db, &owner, "TC");
        let req = AnalyticsRequest {
            coin: c.id,
            views: 100,
            upvotes: 50,
            downvotes: 10,
            total_votes: 60,
        };

        let created = db.create_analytics(&req).unwrap();
        assert_eq!(created.views, 100);
        assert_eq!(created.total_votes, 60);

        let err = db.create_analytics(&req).unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }
}
