use chrono::Utc;
use memeplayers_types::api::{BadgeRequest, UserBadgeRequest};
use memeplayers_types::models::{Badge, UserBadge};
use rusqlite::{Connection, Row, params};
use tracing::info;
use uuid::Uuid;

use crate::error::OptionalExt;
use crate::models::parse_col;
use crate::{Database, Result};

const BADGE_COLUMNS: &str = "id, name, description, icon, created_at";
const USER_BADGE_COLUMNS: &str = "id, user_id, badge_id, awarded_at, created_at";

fn badge_row(row: &Row<'_>) -> rusqlite::Result<Badge> {
    Ok(Badge {
        id: parse_col(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn user_badge_row(row: &Row<'_>) -> rusqlite::Result<UserBadge> {
    Ok(UserBadge {
        id: parse_col(row, 0)?,
        user: parse_col(row, 1)?,
        badge: parse_col(row, 2)?,
        awarded_at: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn query_badge(conn: &Connection, id: Uuid) -> Result<Option<Badge>> {
    let sql = format!("SELECT {} FROM badges WHERE id = ?1", BADGE_COLUMNS);
    conn.query_row(&sql, [id.to_string()], badge_row).optional()
}

fn query_user_badge(conn: &Connection, id: Uuid) -> Result<Option<UserBadge>> {
    let sql = format!("SELECT {} FROM user_badges WHERE id = ?1", USER_BADGE_COLUMNS);
    conn.query_row(&sql, [id.to_string()], user_badge_row).optional()
}

impl Database {
    // -- Badges --

    pub fn create_badge(&self, req: &BadgeRequest) -> Result<Badge> {
        let badge = Badge {
            id: Uuid::new_v4(),
            name: req.name.clone(),
            description: req.description.clone(),
            icon: req.icon.clone(),
            created_at: Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO badges (id, name, description, icon, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    badge.id.to_string(),
                    badge.name,
                    badge.description,
                    badge.icon,
                    badge.created_at,
                ],
            )?;
            Ok(())
        })?;

        info!("Badge created: {}", badge.name);
        Ok(badge)
    }

    pub fn get_badge(&self, id: Uuid) -> Result<Option<Badge>> {
        self.with_conn(|conn| query_badge(conn, id))
    }

    pub fn list_badges(&self) -> Result<Vec<Badge>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM badges ORDER BY created_at, id", BADGE_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], badge_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_badge(&self, id: Uuid, req: &BadgeRequest) -> Result<Option<Badge>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE badges SET name = ?2, description = ?3, icon = ?4 WHERE id = ?1",
                params![id.to_string(), req.name, req.description, req.icon],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_badge(conn, id)
        })
    }

    /// Deleting a badge also revokes every award of it.
    pub fn delete_badge(&self, id: Uuid) -> Result<bool> {
        let n = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM badges WHERE id = ?1", [id.to_string()])?)
        })?;
        Ok(n > 0)
    }

    // -- Badge awards --

    pub fn award_badge(&self, req: &UserBadgeRequest) -> Result<UserBadge> {
        let now = Utc::now();
        let award = UserBadge {
            id: Uuid::new_v4(),
            user: req.user,
            badge: req.badge,
            awarded_at: now,
            created_at: now,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO user_badges (id, user_id, badge_id, awarded_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    award.id.to_string(),
                    req.user.to_string(),
                    req.badge.to_string(),
                    award.awarded_at,
                    award.created_at,
                ],
            )?;
            Ok(())
        })?;

        info!("Badge {} awarded to {}", req.badge, req.user);
        Ok(award)
    }

    pub fn get_user_badge(&self, id: Uuid) -> Result<Option<UserBadge>> {
        self.with_conn(|conn| query_user_badge(conn, id))
    }

    pub fn list_user_badges(&self) -> Result<Vec<UserBadge>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM user_badges ORDER BY awarded_at, id",
                USER_BADGE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], user_badge_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_user_badge(&self, id: Uuid, req: &UserBadgeRequest) -> Result<Option<UserBadge>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE user_badges SET user_id = ?2, badge_id = ?3 WHERE id = ?1",
                params![id.to_string(), req.user.to_string(), req.badge.to_string()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user_badge(conn, id)
        })
    }

    pub fn delete_user_badge(&self, id: Uuid) -> Result<bool> {
        let n = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM user_badges WHERE id = ?1", [id.to_string()])?)
        })?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user;

    #[test]
    fn deleting_badge_revokes_awards() {
        let db = Database::open_in_memory().unwrap();
        let holder = user(&db, "testuser");
        let badge = db
            .create_badge(&BadgeRequest {
                name: "Test Badge".into(),
                description: "Test Description".into(),
                icon: None,
            })
            .unwrap();
        let award = db
            .award_badge(&UserBadgeRequest {
                user: holder.id,
                badge: badge.id,
            })
            .unwrap();
        assert_eq!(db.list_user_badges().unwrap().len(), 1);

        assert!(db.delete_badge(badge.id).unwrap());
        assert!(db.get_user_badge(award.id).unwrap().is_none());
    }
}
