use chrono::Utc;
use memeplayers_types::api::RatingRequest;
use memeplayers_types::models::Rating;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use crate::error::OptionalExt;
use crate::models::parse_col;
use crate::{Database, Result};

const RATING_COLUMNS: &str = "id, user_id, rated_user_id, rating, comment, created_at";

fn rating_row(row: &Row<'_>) -> rusqlite::Result<Rating> {
    Ok(Rating {
        id: parse_col(row, 0)?,
        user: parse_col(row, 1)?,
        rated_user: parse_col(row, 2)?,
        rating: row.get(3)?,
        comment: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn query_rating(conn: &Connection, id: Uuid) -> Result<Option<Rating>> {
    let sql = format!("SELECT {} FROM ratings WHERE id = ?1", RATING_COLUMNS);
    conn.query_row(&sql, [id.to_string()], rating_row).optional()
}

impl Database {
    // -- Ratings --

    pub fn create_rating(&self, rater: Uuid, req: &RatingRequest) -> Result<Rating> {
        let rating = Rating {
            id: Uuid::new_v4(),
            user: rater,
            rated_user: req.rated_user,
            rating: req.rating,
            comment: req.comment.clone(),
            created_at: Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO ratings (id, user_id, rated_user_id, rating, comment, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    rating.id.to_string(),
                    rater.to_string(),
                    req.rated_user.to_string(),
                    rating.rating,
                    rating.comment,
                    rating.created_at,
                ],
            )?;
            Ok(())
        })?;
        Ok(rating)
    }

    pub fn get_rating(&self, id: Uuid) -> Result<Option<Rating>> {
        self.with_conn(|conn| query_rating(conn, id))
    }

    pub fn list_ratings(&self) -> Result<Vec<Rating>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM ratings ORDER BY created_at, id", RATING_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], rating_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_rating(&self, id: Uuid, req: &RatingRequest) -> Result<Option<Rating>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE ratings SET rated_user_id = ?2, rating = ?3, comment = ?4 WHERE id = ?1",
                params![id.to_string(), req.rated_user.to_string(), req.rating, req.comment],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_rating(conn, id)
        })
    }

    pub fn delete_rating(&self, id: Uuid) -> Result<bool> {
        let n = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM ratings WHERE id = ?1", [id.to_string()])?)
        })?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user;

    #[test]
    fn rating_links_two_users_without_uniqueness() {
        let db = Database::open_in_memory().unwrap();
        let rater = user(&db, "testuser");
        let rated = user(&db, "rateduser");
        let req = RatingRequest {
            rated_user: rated.id,
            rating: 5,
            comment: "Great user".into(),
        };

        let first = db.create_rating(rater.id, &req).unwrap();
        db.create_rating(rater.id, &req).unwrap();
        assert_eq!(db.list_ratings().unwrap().len(), 2);

        let stored = db.get_rating(first.id).unwrap().unwrap();
        assert_eq!(stored.user, rater.id);
        assert_eq!(stored.rated_user, rated.id);
        assert_eq!(stored.rating, 5);
        assert_eq!(stored.comment, "Great user");

        assert!(db.delete_user(rated.id).unwrap());
        assert!(db.list_ratings().unwrap().is_empty());
    }
}
