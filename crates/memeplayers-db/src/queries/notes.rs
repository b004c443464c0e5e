use chrono::Utc;
use memeplayers_types::api::NoteRequest;
use memeplayers_types::models::Note;
use rusqlite::{Row, params};
use tracing::info;
use uuid::Uuid;

use crate::error::OptionalExt;
use crate::models::parse_col;
use crate::{Database, Result};

const NOTE_COLUMNS: &str = "id, user_id, title, content, created_at, updated_at";

fn note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: parse_col(row, 0)?,
        user: parse_col(row, 1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Notes are private: every read and write is keyed by (owner, id), so a
/// note belonging to someone else looks exactly like a missing one.
impl Database {
    pub fn create_note(&self, owner: Uuid, req: &NoteRequest) -> Result<Note> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            user: owner,
            title: req.title.clone(),
            content: req.content.clone(),
            created_at: now,
            updated_at: now,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notes (id, user_id, title, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    note.id.to_string(),
                    owner.to_string(),
                    note.title,
                    note.content,
                    note.created_at,
                    note.updated_at,
                ],
            )?;
            Ok(())
        })?;

        info!("Note created: {} by {}", note.title, owner);
        Ok(note)
    }

    pub fn get_note(&self, owner: Uuid, id: Uuid) -> Result<Option<Note>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM notes WHERE id = ?1 AND user_id = ?2", NOTE_COLUMNS);
            conn.query_row(&sql, params![id.to_string(), owner.to_string()], note_row)
                .optional()
        })
    }

    pub fn list_notes(&self, owner: Uuid) -> Result<Vec<Note>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM notes WHERE user_id = ?1 ORDER BY created_at, id",
                NOTE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner.to_string()], note_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_note(&self, owner: Uuid, id: Uuid, req: &NoteRequest) -> Result<Option<Note>> {
        let changed = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE notes SET title = ?3, content = ?4, updated_at = ?5
                 WHERE id = ?1 AND user_id = ?2",
                params![
                    id.to_string(),
                    owner.to_string(),
                    req.title,
                    req.content,
                    Utc::now(),
                ],
            )?)
        })?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_note(owner, id)
    }

    pub fn delete_note(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let n = self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
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
    fn notes_are_scoped_to_their_owner() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let req = NoteRequest {
            title: "Test Note".into(),
            content: "Test Content".into(),
        };
        let note = db.create_note(alice.id, &req).unwrap();

        assert_eq!(db.list_notes(alice.id).unwrap().len(), 1);
        assert!(db.list_notes(bob.id).unwrap().is_empty());
        assert!(db.get_note(bob.id, note.id).unwrap().is_none());
        assert!(db.update_note(bob.id, note.id, &req).unwrap().is_none());
        assert!(!db.delete_note(bob.id, note.id).unwrap());

        let edited = NoteRequest {
            title: "Edited".into(),
            content: "Still mine".into(),
        };
        let updated = db.update_note(alice.id, note.id, &edited).unwrap().unwrap();
        assert_eq!(updated.title, "Edited");
        assert!(updated.updated_at >= note.updated_at);
        assert!(db.delete_note(alice.id, note.id).unwrap());
    }
}
