use chrono::Utc;
use memeplayers_types::api::{CommentRequest, PostRequest};
use memeplayers_types::models::{Comment, Post};
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params, params_from_iter};
use tracing::info;
use uuid::Uuid;

use super::{Listing, Window, count_rows, window_clause};
use crate::error::OptionalExt;
use crate::models::parse_col;
use crate::{Database, Result};

const POST_COLUMNS: &str = "id, title, content, author_id, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, content, author_id, post_id, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrdering {
    #[default]
    CreatedAsc,
    CreatedDesc,
}

impl PostOrdering {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "created_at" => Some(Self::CreatedAsc),
            "-created_at" => Some(Self::CreatedDesc),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::CreatedAsc => "created_at ASC, id",
            Self::CreatedDesc => "created_at DESC, id",
        }
    }
}

fn post_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: parse_col(row, 0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        author: parse_col(row, 3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn comment_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: parse_col(row, 0)?,
        content: row.get(1)?,
        author: parse_col(row, 2)?,
        post: parse_col(row, 3)?,
        created_at: row.get(4)?,
    })
}

fn query_post(conn: &Connection, id: Uuid) -> Result<Option<Post>> {
    let sql = format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS);
    conn.query_row(&sql, [id.to_string()], post_row).optional()
}

fn query_comment(conn: &Connection, id: Uuid) -> Result<Option<Comment>> {
    let sql = format!("SELECT {} FROM comments WHERE id = ?1", COMMENT_COLUMNS);
    conn.query_row(&sql, [id.to_string()], comment_row).optional()
}

impl Database {
    // -- Posts --

    pub fn create_post(&self, author: Uuid, req: &PostRequest) -> Result<Post> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: req.title.clone(),
            content: req.content.clone(),
            author,
            created_at: now,
            updated_at: now,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, title, content, author_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    post.id.to_string(),
                    post.title,
                    post.content,
                    author.to_string(),
                    post.created_at,
                    post.updated_at,
                ],
            )?;
            Ok(())
        })?;

        info!("Post created: {} by {}", post.title, author);
        Ok(post)
    }

    pub fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    pub fn list_posts(
        &self,
        search: Option<&str>,
        ordering: PostOrdering,
        window: Window,
    ) -> Result<Listing<Post>> {
        let mut args = Vec::new();
        let from_where = match search.filter(|t| !t.is_empty()) {
            Some(term) => {
                args.push(Value::Text(term.to_ascii_lowercase()));
                "FROM posts WHERE instr(lower(title), ?1) > 0 OR instr(lower(content), ?1) > 0"
            }
            None => "FROM posts",
        };

        self.with_conn(|conn| {
            let total = count_rows(conn, from_where, &args)?;

            let mut args = args.clone();
            let limit = window_clause(window, &mut args);
            let sql = format!(
                "SELECT {} {} ORDER BY {}{}",
                POST_COLUMNS,
                from_where,
                ordering.sql(),
                limit
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(params_from_iter(args.iter()), post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Listing { items, total })
        })
    }

    /// Full replace of title and content; `updated_at` moves to now.
    pub fn update_post(&self, id: Uuid, req: &PostRequest) -> Result<Option<Post>> {
        let post = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET title = ?2, content = ?3, updated_at = ?4 WHERE id = ?1",
                params![id.to_string(), req.title, req.content, Utc::now()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_post(conn, id)
        })?;

        if let Some(ref p) = post {
            info!("Post updated: {}", p.title);
        }
        Ok(post)
    }

    pub fn delete_post(&self, id: Uuid) -> Result<bool> {
        let n = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [id.to_string()])?)
        })?;
        if n > 0 {
            info!("Post deleted: {}", id);
        }
        Ok(n > 0)
    }

    // -- Comments --

    pub fn create_comment(&self, author: Uuid, req: &CommentRequest) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            content: req.content.clone(),
            author,
            post: req.post,
            created_at: Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, content, author_id, post_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    comment.id.to_string(),
                    comment.content,
                    author.to_string(),
                    req.post.to_string(),
                    comment.created_at,
                ],
            )?;
            Ok(())
        })?;

        info!("Comment created on post {} by {}", req.post, author);
        Ok(comment)
    }

    pub fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        self.with_conn(|conn| query_comment(conn, id))
    }

    pub fn list_comments(&self, window: Window) -> Result<Listing<Comment>> {
        self.with_conn(|conn| {
            let total = count_rows(conn, "FROM comments", &[])?;
            let mut args = Vec::new();
            let limit = window_clause(window, &mut args);
            let sql = format!(
                "SELECT {} FROM comments ORDER BY created_at, id{}",
                COMMENT_COLUMNS, limit
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(params_from_iter(args.iter()), comment_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Listing { items, total })
        })
    }

    /// Full replace of content and target post. The author never changes.
    pub fn update_comment(&self, id: Uuid, req: &CommentRequest) -> Result<Option<Comment>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE comments SET content = ?2, post_id = ?3 WHERE id = ?1",
                params![id.to_string(), req.content, req.post.to_string()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_comment(conn, id)
        })
    }

    pub fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let n = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM comments WHERE id = ?1", [id.to_string()])?)
        })?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;
    use crate::test_support::user;

    fn post(title: &str) -> PostRequest {
        PostRequest {
            title: title.to_string(),
            content: format!("{} content", title),
        }
    }

    #[test]
    fn update_refreshes_updated_at_only() {
        let db = Database::open_in_memory().unwrap();
        let author = user(&db, "author");
        let created = db.create_post(author.id, &post("First")).unwrap();

        let updated = db.update_post(created.id, &post("Edited")).unwrap().unwrap();
        assert_eq!(updated.title, "Edited");
        assert_eq!(updated.author, author.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn list_searches_and_orders() {
        let db = Database::open_in_memory().unwrap();
        let author = user(&db, "author");
        let first = db.create_post(author.id, &post("Doge to the moon")).unwrap();
        let second = db.create_post(author.id, &post("Pepe rising")).unwrap();

        let found = db
            .list_posts(Some("MOON"), PostOrdering::default(), Window::ALL)
            .unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].id, first.id);

        let newest_first = db
            .list_posts(None, PostOrdering::CreatedDesc, Window::ALL)
            .unwrap();
        assert_eq!(newest_first.items[0].id, second.id);
    }

    #[test]
    fn comment_on_missing_post_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let author = user(&db, "author");
        let err = db
            .create_comment(
                author.id,
                &CommentRequest {
                    content: "hello".into(),
                    post: Uuid::new_v4(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[test]
    fn deleting_post_removes_comments() {
        let db = Database::open_in_memory().unwrap();
        let author = user(&db, "author");
        let p = db.create_post(author.id, &post("Test Post")).unwrap();
        let c = db
            .create_comment(
                author.id,
                &CommentRequest {
                    content: "Test Comment".into(),
                    post: p.id,
                },
            )
            .unwrap();

        assert!(db.delete_post(p.id).unwrap());
        assert!(db.get_comment(c.id).unwrap().is_none());
    }
}
