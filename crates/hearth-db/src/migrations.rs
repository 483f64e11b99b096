use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, social graph, content)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                password        TEXT NOT NULL,
                follower_count  INTEGER NOT NULL DEFAULT 0,
                flag_count      INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL
            );

            -- seq keeps follower/following lists in insertion order
            CREATE TABLE follows (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                follower    TEXT NOT NULL REFERENCES users(username),
                followee    TEXT NOT NULL REFERENCES users(username),
                created_at  TEXT NOT NULL,
                UNIQUE(follower, followee),
                CHECK(follower <> followee)
            );

            CREATE INDEX idx_follows_followee ON follows(followee, seq);

            CREATE TABLE blocks (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                blocker     TEXT NOT NULL REFERENCES users(username),
                blocked     TEXT NOT NULL REFERENCES users(username),
                created_at  TEXT NOT NULL,
                UNIQUE(blocker, blocked),
                CHECK(blocker <> blocked)
            );

            CREATE INDEX idx_blocks_blocked ON blocks(blocked, seq);

            CREATE TABLE stories (
                id               TEXT PRIMARY KEY,
                author_username  TEXT NOT NULL,
                title            TEXT NOT NULL,
                content          TEXT NOT NULL,
                preview          TEXT NOT NULL,
                like_count       INTEGER NOT NULL DEFAULT 0,
                dislike_count    INTEGER NOT NULL DEFAULT 0,
                score            INTEGER NOT NULL DEFAULT 0,
                created_at       TEXT NOT NULL,
                updated_at       TEXT NOT NULL
            );

            CREATE INDEX idx_stories_author ON stories(author_username);

            CREATE TABLE comments (
                id               TEXT PRIMARY KEY,
                story_id         TEXT NOT NULL,
                author_username  TEXT NOT NULL,
                content          TEXT NOT NULL,
                like_count       INTEGER NOT NULL DEFAULT 0,
                dislike_count    INTEGER NOT NULL DEFAULT 0,
                created_at       TEXT NOT NULL
            );

            CREATE INDEX idx_comments_story ON comments(story_id, created_at);

            CREATE TABLE replies (
                id               TEXT PRIMARY KEY,
                comment_id       TEXT NOT NULL,
                author_username  TEXT NOT NULL,
                content          TEXT NOT NULL,
                like_count       INTEGER NOT NULL DEFAULT 0,
                dislike_count    INTEGER NOT NULL DEFAULT 0,
                created_at       TEXT NOT NULL
            );

            CREATE INDEX idx_replies_comment ON replies(comment_id, created_at);

            -- One row per (entity, user): a user either likes or dislikes, never both
            CREATE TABLE reactions (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_id   TEXT NOT NULL,
                username    TEXT NOT NULL,
                kind        TEXT NOT NULL CHECK(kind IN ('like', 'dislike')),
                UNIQUE(entity_id, username)
            );

            CREATE INDEX idx_reactions_entity ON reactions(entity_id, kind, seq);

            CREATE TABLE flags (
                id           TEXT PRIMARY KEY,
                flagger_id   TEXT NOT NULL,
                target_kind  TEXT NOT NULL CHECK(target_kind IN ('story', 'comment', 'reply', 'user')),
                target       TEXT NOT NULL,
                reason       TEXT NOT NULL,
                created_at   TEXT NOT NULL,
                UNIQUE(flagger_id, target)
            );

            CREATE INDEX idx_flags_target ON flags(target);

            CREATE TABLE read_later (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL,
                story_id    TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                UNIQUE(username, story_id)
            );

            CREATE INDEX idx_read_later_story ON read_later(story_id);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (direct messages)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE messages (
                id          TEXT PRIMARY KEY,
                sender      TEXT NOT NULL,
                recipient   TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            -- One document per (owner, peer); each side of a pair has its own
            CREATE TABLE conversations (
                id            TEXT PRIMARY KEY,
                owner         TEXT NOT NULL,
                peer          TEXT NOT NULL,
                unread_count  INTEGER NOT NULL DEFAULT 0,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL,
                UNIQUE(owner, peer),
                CHECK(owner <> peer)
            );

            CREATE TABLE conversation_messages (
                seq              INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id  TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                message_id       TEXT NOT NULL REFERENCES messages(id),
                read             INTEGER NOT NULL DEFAULT 0,
                UNIQUE(conversation_id, message_id)
            );

            CREATE INDEX idx_conversation_messages_message ON conversation_messages(message_id);

            INSERT INTO schema_version (version) VALUES (2);

            COMMIT;
            ",
        )?;
    }

    if version < 3 {
        info!("Running migration v3 (content edits)");
        conn.execute_batch(
            "
            BEGIN;

            ALTER TABLE stories ADD COLUMN edited INTEGER NOT NULL DEFAULT 0;
            ALTER TABLE comments ADD COLUMN edited INTEGER NOT NULL DEFAULT 0;
            ALTER TABLE comments ADD COLUMN updated_at TEXT NOT NULL DEFAULT '';
            ALTER TABLE replies ADD COLUMN edited INTEGER NOT NULL DEFAULT 0;
            ALTER TABLE replies ADD COLUMN updated_at TEXT NOT NULL DEFAULT '';

            UPDATE comments SET updated_at = created_at;
            UPDATE replies SET updated_at = created_at;

            INSERT INTO schema_version (version) VALUES (3);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
