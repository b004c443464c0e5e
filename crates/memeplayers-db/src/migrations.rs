use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL DEFAULT '',
                password        TEXT NOT NULL,
                avatar          TEXT,
                bio             TEXT NOT NULL DEFAULT '',
                activity_points INTEGER NOT NULL DEFAULT 0,
                role            TEXT NOT NULL DEFAULT 'user'
                                CHECK (role IN ('admin', 'moderator', 'user')),
                created_at      TEXT NOT NULL
            );

            CREATE TABLE coins (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                symbol      TEXT NOT NULL,
                description TEXT NOT NULL,
                category    TEXT NOT NULL DEFAULT 'meme'
                            CHECK (category IN ('meme', 'utility')),
                logo        TEXT,
                created_by  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                total_votes INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE votes (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                coin_id     TEXT NOT NULL REFERENCES coins(id) ON DELETE CASCADE,
                vote_type   TEXT NOT NULL CHECK (vote_type IN ('upvote', 'downvote')),
                created_at  TEXT NOT NULL,
                UNIQUE(user_id, coin_id)
            );

            CREATE INDEX idx_votes_coin ON votes(coin_id);

            CREATE TABLE communities (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT NOT NULL,
                created_by  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE community_members (
                community_id TEXT NOT NULL REFERENCES communities(id) ON DELETE CASCADE,
                user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                joined_at    TEXT NOT NULL,
                PRIMARY KEY (community_id, user_id)
            );

            CREATE TABLE posts (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                content     TEXT NOT NULL,
                author_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_posts_created ON posts(created_at);

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                content     TEXT NOT NULL,
                author_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_post ON comments(post_id);

            CREATE TABLE notes (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title       TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_notes_user ON notes(user_id);

            CREATE TABLE ratings (
                id            TEXT PRIMARY KEY,
                user_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                rated_user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                rating        INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comment       TEXT NOT NULL DEFAULT '',
                created_at    TEXT NOT NULL,
                CHECK (user_id <> rated_user_id)
            );

            CREATE TABLE badges (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT NOT NULL,
                icon        TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE user_badges (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                badge_id    TEXT NOT NULL REFERENCES badges(id) ON DELETE CASCADE,
                awarded_at  TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE notifications (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                link        TEXT,
                read        INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_notifications_user ON notifications(user_id);

            CREATE TABLE analytics (
                id          TEXT PRIMARY KEY,
                coin_id     TEXT NOT NULL UNIQUE REFERENCES coins(id) ON DELETE CASCADE,
                views       INTEGER NOT NULL DEFAULT 0,
                upvotes     INTEGER NOT NULL DEFAULT 0,
                downvotes   INTEGER NOT NULL DEFAULT 0,
                total_votes INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
