use chrono::Utc;
use memeplayers_types::api::NotificationRequest;
use memeplayers_types::models::Notification;
use rusqlite::{Row, params};
use uuid::Uuid;

use crate::error::OptionalExt;
use crate::models::parse_col;
use crate::{Database, Result};

const NOTIFICATION_COLUMNS: &str = "id, user_id, content, link, read, created_at";

fn notification_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: parse_col(row, 0)?,
        user: parse_col(row, 1)?,
        content: row.get(2)?,
        link: row.get(3)?,
        read: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Like notes, notifications are only ever addressed through their owner.
impl Database {
    pub fn create_notification(&self, owner: Uuid, req: &NotificationRequest) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user: owner,
            content: req.content.clone(),
            link: req.link.clone(),
            read: req.read,
            created_at: Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, user_id, content, link, read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    notification.id.to_string(),
                    owner.to_string(),
                    notification.content,
                    notification.link,
                    notification.read,
                    notification.created_at,
                ],
            )?;
            Ok(())
        })?;
        Ok(notification)
    }

    pub fn get_notification(&self, owner: Uuid, id: Uuid) -> Result<Option<Notification>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM notifications WHERE id = ?1 AND user_id = ?2",
                NOTIFICATION_COLUMNS
            );
            conn.query_row(&sql, params![id.to_string(), owner.to_string()], notification_row)
                .optional()
        })
    }

    pub fn list_notifications(&self, owner: Uuid) -> Result<Vec<Notification>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC, id",
                NOTIFICATION_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner.to_string()], notification_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_notification(
        &self,
        owner: Uuid,
        id: Uuid,
        req: &NotificationRequest,
    ) -> Result<Option<Notification>> {
        let changed = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE notifications SET content = ?3, link = ?4, read = ?5
                 WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), owner.to_string(), req.content, req.link, req.read],
            )?)
        })?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_notification(owner, id)
    }

    pub fn delete_notification(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let n = self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM notifications WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), owner.to_string()],
            )?)
        })?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user;

    #[test]
    fn mark_read_through_full_replace() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let mut req = NotificationRequest {
            content: "Your coin trended".into(),
            link: Some("https://example.com/coins/1".into()),
            read: false,
        };
        let n = db.create_notification(alice.id, &req).unwrap();
        assert!(!n.read);

        req.read = true;
        assert!(db.update_notification(bob.id, n.id, &req).unwrap().is_none());
        let updated = db.update_notification(alice.id, n.id, &req).unwrap().unwrap();
        assert!(updated.read);
        assert_eq!(updated.link.as_deref(), Some("https://example.com/coins/1"));
        assert!(db.list_notifications(bob.id).unwrap().is_empty());
    }
}
