use chrono::Utc;
use memeplayers_types::api::CommunityRequest;
use memeplayers_types::models::Community;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params, params_from_iter};
use tracing::info;
use uuid::Uuid;

use super::{Listing, Window, count_rows, window_clause};
use crate::error::OptionalExt;
use crate::models::parse_col;
use crate::{Database, Result};

const COMMUNITY_COLUMNS: &str = "id, name, description, created_by, created_at";

/// Decodes everything but `members`, which lives in its own table.
fn community_row(row: &Row<'_>) -> rusqlite::Result<Community> {
    Ok(Community {
        id: parse_col(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_by: parse_col(row, 3)?,
        members: Vec::new(),
        created_at: row.get(4)?,
    })
}

fn query_members(conn: &Connection, community_id: Uuid) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT user_id FROM community_members WHERE community_id = ?1 ORDER BY joined_at, user_id",
    )?;
    let members = stmt
        .query_map([community_id.to_string()], |row| parse_col(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(members)
}

fn insert_members(conn: &Connection, community_id: Uuid, members: &[Uuid]) -> Result<()> {
    let now = Utc::now();
    for user_id in members {
        conn.execute(
            "INSERT OR IGNORE INTO community_members (community_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
            params![community_id.to_string(), user_id.to_string(), now],
        )?;
    }
    Ok(())
}

fn query_community(conn: &Connection, id: Uuid) -> Result<Option<Community>> {
    let sql = format!("SELECT {} FROM communities WHERE id = ?1", COMMUNITY_COLUMNS);
    let Some(mut community) = conn
        .query_row(&sql, [id.to_string()], community_row)
        .optional()?
    else {
        return Ok(None);
    };
    community.members = query_members(conn, id)?;
    Ok(Some(community))
}

impl Database {
    // -- Communities --

    pub fn create_community(&self, creator: Uuid, req: &CommunityRequest) -> Result<Community> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let community = self.transaction(|tx| {
            tx.execute(
                "INSERT INTO communities (id, name, description, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.to_string(),
                    req.name,
                    req.description,
                    creator.to_string(),
                    created_at,
                ],
            )?;
            insert_members(tx, id, &req.members)?;
            Ok(Community {
                id,
                name: req.name.clone(),
                description: req.description.clone(),
                created_by: creator,
                members: query_members(tx, id)?,
                created_at,
            })
        })?;

        info!("Community created: {} by {}", community.name, creator);
        Ok(community)
    }

    pub fn get_community(&self, id: Uuid) -> Result<Option<Community>> {
        self.with_conn(|conn| query_community(conn, id))
    }

    /// Page of communities, optionally narrowed by a case-insensitive search
    /// over name and description.
    pub fn list_communities(&self, search: Option<&str>, window: Window) -> Result<Listing<Community>> {
        let mut args = Vec::new();
        let from_where = match search.filter(|t| !t.is_empty()) {
            Some(term) => {
                args.push(Value::Text(term.to_ascii_lowercase()));
                "FROM communities WHERE instr(lower(name), ?1) > 0 OR instr(lower(description), ?1) > 0"
            }
            None => "FROM communities",
        };

        self.with_conn(|conn| {
            let total = count_rows(conn, from_where, &args)?;

            let mut args = args.clone();
            let limit = window_clause(window, &mut args);
            let sql = format!(
                "SELECT {} {} ORDER BY created_at, id{}",
                COMMUNITY_COLUMNS, from_where, limit
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut items = stmt
                .query_map(params_from_iter(args.iter()), community_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for community in &mut items {
                community.members = query_members(conn, community.id)?;
            }

            Ok(Listing { items, total })
        })
    }

    /// Full replace: name, description and the member set.
    pub fn update_community(&self, id: Uuid, req: &CommunityRequest) -> Result<Option<Community>> {
        self.transaction(|tx| {
            let changed = tx.execute(
                "UPDATE communities SET name = ?2, description = ?3 WHERE id = ?1",
                params![id.to_string(), req.name, req.description],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            tx.execute(
                "DELETE FROM community_members WHERE community_id = ?1",
                [id.to_string()],
            )?;
            insert_members(tx, id, &req.members)?;
            query_community(tx, id)
        })
    }

    pub fn delete_community(&self, id: Uuid) -> Result<bool> {
        let n = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM communities WHERE id = ?1", [id.to_string()])?)
        })?;
        Ok(n > 0)
    }

    pub fn join_community(&self, id: Uuid, user_id: Uuid) -> Result<Option<Community>> {
        self.transaction(|tx| {
            if query_community(tx, id)?.is_none() {
                return Ok(None);
            }
            insert_members(tx, id, &[user_id])?;
            query_community(tx, id)
        })
    }

    pub fn leave_community(&self, id: Uuid, user_id: Uuid) -> Result<Option<Community>> {
        self.transaction(|tx| {
            tx.execute(
                "DELETE FROM community_members WHERE community_id = ?1 AND user_id = ?2",
                params![id.to_string(), user_id.to_string()],
            )?;
            query_community(tx, id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user;

    fn request(name: &str, members: Vec<Uuid>) -> CommunityRequest {
        CommunityRequest {
            name: name.to_string(),
            description: format!("{} Description", name),
            members,
        }
    }

    #[test]
    fn create_with_members_and_join_leave() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner");
        let other = user(&db, "other");

        let community = db
            .create_community(owner.id, &request("Doge Fans", vec![owner.id, owner.id]))
            .unwrap();
        assert_eq!(community.created_by, owner.id);
        assert_eq!(community.members, vec![owner.id]);

        let joined = db.join_community(community.id, other.id).unwrap().unwrap();
        assert_eq!(joined.members.len(), 2);

        let left = db.leave_community(community.id, owner.id).unwrap().unwrap();
        assert_eq!(left.members, vec![other.id]);

        assert!(db.join_community(Uuid::new_v4(), other.id).unwrap().is_none());
    }

    #[test]
    fn list_searches_and_windows() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner");
        for name in ["Doge Fans", "Pepe Club", "Moon Boys"] {
            db.create_community(owner.id, &request(name, vec![])).unwrap();
        }

        let found = db.list_communities(Some("PEPE"), Window::ALL).unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].name, "Pepe Club");

        db.create_community(owner.id, &request("Ñandú Riders", vec![])).unwrap();
        let accented = db.list_communities(Some("ÑAND"), Window::ALL).unwrap();
        assert_eq!(accented.total, 1);
        assert_eq!(accented.items[0].name, "Ñandú Riders");

        let page = db
            .list_communities(None, Window { limit: 2, offset: 2 })
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn update_replaces_members() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner");
        let other = user(&db, "other");
        let community = db
            .create_community(owner.id, &request("Doge Fans", vec![owner.id]))
            .unwrap();

        let updated = db
            .update_community(community.id, &request("Doge Army", vec![other.id]))
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Doge Army");
        assert_eq!(updated.members, vec![other.id]);
        assert_eq!(updated.created_by, owner.id);
    }
}
