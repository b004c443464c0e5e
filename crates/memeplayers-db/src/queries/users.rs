use chrono::Utc;
use memeplayers_types::api::{CreateUserRequest, UpdateUserRequest};
use memeplayers_types::models::User;
use rusqlite::{Connection, Row, params};
use tracing::info;
use uuid::Uuid;

use crate::error::OptionalExt;
use crate::models::{UserRow, parse_col};
use crate::{Database, Result, voting};

const USER_COLUMNS: &str =
    "id, username, email, avatar, bio, activity_points, role, created_at, password";

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        user: User {
            id: parse_col(row, 0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            avatar: row.get(3)?,
            bio: row.get(4)?,
            activity_points: row.get(5)?,
            role: parse_col(row, 6)?,
            created_at: row.get(7)?,
        },
        password: row.get(8)?,
    })
}

pub(crate) fn query_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    let row = conn
        .query_row(&sql, [id.to_string()], user_row)
        .optional()?;
    Ok(row.map(|r| r.user))
}

impl Database {
    // -- Users --

    pub fn create_user(&self, req: &CreateUserRequest, password_hash: &str) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: req.username.clone(),
            email: req.email.clone(),
            avatar: req.avatar.clone(),
            bio: req.bio.clone(),
            activity_points: req.activity_points,
            role: req.role,
            created_at: Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, avatar, bio, activity_points, role, created_at, password)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    user.id.to_string(),
                    user.username,
                    user.email,
                    user.avatar,
                    user.bio,
                    user.activity_points,
                    user.role.as_str(),
                    user.created_at,
                    password_hash,
                ],
            )?;
            Ok(())
        })?;

        info!("User created: {} ({})", user.username, user.role);
        Ok(user)
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
            conn.query_row(&sql, [username], user_row).optional()
        })
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users ORDER BY created_at, id", USER_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], user_row)?
                .map(|r| r.map(|row| row.user))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Full replace of the profile. The password is only touched when a new
    /// hash is supplied.
    pub fn update_user(
        &self,
        id: Uuid,
        req: &UpdateUserRequest,
        password_hash: Option<&str>,
    ) -> Result<Option<User>> {
        self.transaction(|tx| {
            let changed = tx.execute(
                "UPDATE users SET username = ?2, email = ?3, avatar = ?4, bio = ?5,
                        activity_points = ?6, role = ?7
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    req.username,
                    req.email,
                    req.avatar,
                    req.bio,
                    req.activity_points,
                    req.role.as_str(),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            if let Some(hash) = password_hash {
                tx.execute(
                    "UPDATE users SET password = ?2 WHERE id = ?1",
                    params![id.to_string(), hash],
                )?;
            }
            query_user(tx, id)
        })
    }

    /// Delete a user and everything that references them. Their votes are
    /// released from each coin's counter before the cascade removes the rows.
    pub fn delete_user(&self, id: Uuid) -> Result<bool> {
        let deleted = self.transaction(|tx| {
            voting::release_user_votes(tx, id)?;
            let n = tx.execute("DELETE FROM users WHERE id = ?1", [id.to_string()])?;
            Ok(n > 0)
        })?;

        if deleted {
            info!("User deleted: {}", id);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use memeplayers_types::api::NoteRequest;
    use memeplayers_types::models::Role;

    use super::*;
    use crate::DbError;
    use crate::test_support::new_user;

    #[test]
    fn duplicate_username_is_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("testuser"), "hash").unwrap();

        let err = db.create_user(&new_user("testuser"), "hash").unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[test]
    fn update_replaces_profile_and_keeps_password() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(&new_user("testuser"), "hash").unwrap();

        let update = UpdateUserRequest {
            username: "renamed".into(),
            email: "r@example.com".into(),
            avatar: None,
            bio: "hello".into(),
            activity_points: 7,
            role: Role::Moderator,
            password: None,
        };
        let updated = db.update_user(user.id, &update, None).unwrap().unwrap();
        assert_eq!(updated.username, "renamed");
        assert_eq!(updated.role, Role::Moderator);
        assert_eq!(updated.activity_points, 7);

        let row = db.get_user_by_username("renamed").unwrap().unwrap();
        assert_eq!(row.password, "hash");

        assert!(db.update_user(Uuid::new_v4(), &update, None).unwrap().is_none());
    }

    #[test]
    fn deleting_user_removes_their_notes_and_notifications() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(&new_user("testuser"), "hash").unwrap();
        let note = NoteRequest {
            title: "Test Note".into(),
            content: "Test Content".into(),
        };
        db.create_note(user.id, &note).unwrap();
        db.create_notification(
            user.id,
            &memeplayers_types::api::NotificationRequest {
                content: "Test Notification".into(),
                link: None,
                read: false,
            },
        )
        .unwrap();

        assert!(db.delete_user(user.id).unwrap());
        assert!(db.get_user(user.id).unwrap().is_none());

        let (notes, notifications): (i64, i64) = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT (SELECT COUNT(*) FROM notes), (SELECT COUNT(*) FROM notifications)",
                    [],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )?)
            })
            .unwrap();
        assert_eq!(notes, 0);
        assert_eq!(notifications, 0);

        assert!(!db.delete_user(user.id).unwrap());
    }
}
