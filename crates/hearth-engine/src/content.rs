//! Creation, author edits and read views for stories, comments and
//! replies.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use hearth_db::models::{
    COMMENT_COLUMNS, REPLY_COLUMNS, STORY_COLUMNS, comment_from_row, reply_from_row,
    story_from_row, timestamp,
};
use hearth_db::queries::string_list;
use hearth_types::models::{Actor, Comment, Reactable, ReactableKind, Reply, Story};

use crate::error::{EngineError, Result};
use crate::sql::{author_of, table};
use crate::{Deadline, Engine, require_text};

const PREVIEW_CHARS: usize = 160;

/// First 160 characters of `content`, with an ellipsis when cut.
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

impl Engine {
    pub fn create_story(
        &self,
        author: &Actor,
        title: &str,
        content: &str,
        deadline: Deadline,
    ) -> Result<Story> {
        let title = require_text("title", title, self.config.max_title_len)?;
        let content = require_text("content", content, self.config.max_content_len)?;

        let now = Utc::now();
        let story = Story {
            id: Uuid::new_v4(),
            author_username: author.username.clone(),
            title: title.to_string(),
            content: content.to_string(),
            preview: preview(content),
            like_count: 0,
            dislike_count: 0,
            score: 0,
            edited: false,
            created_at: now,
            updated_at: now,
        };

        self.write("create_story", deadline, |tx| {
            tx.execute(
                "INSERT INTO stories (id, author_username, title, content, preview, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                (
                    story.id.to_string(),
                    &story.author_username,
                    &story.title,
                    &story.content,
                    &story.preview,
                    timestamp(now),
                ),
            )?;
            Ok(())
        })?;
        Ok(story)
    }

    pub fn create_comment(
        &self,
        author: &Actor,
        story_id: Uuid,
        content: &str,
        deadline: Deadline,
    ) -> Result<Comment> {
        let content = require_text("content", content, self.config.max_content_len)?;
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            story_id,
            author_username: author.username.clone(),
            content: content.to_string(),
            like_count: 0,
            dislike_count: 0,
            edited: false,
            created_at: now,
            updated_at: now,
        };

        self.write("create_comment", deadline, |tx| {
            if author_of(tx, ReactableKind::Story, &story_id.to_string())?.is_none() {
                return Err(EngineError::NotFound("story"));
            }
            tx.execute(
                "INSERT INTO comments (id, story_id, author_username, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                (
                    comment.id.to_string(),
                    story_id.to_string(),
                    &comment.author_username,
                    &comment.content,
                    timestamp(comment.created_at),
                ),
            )?;
            Ok(())
        })?;
        Ok(comment)
    }

    pub fn create_reply(
        &self,
        author: &Actor,
        comment_id: Uuid,
        content: &str,
        deadline: Deadline,
    ) -> Result<Reply> {
        let content = require_text("content", content, self.config.max_content_len)?;
        let now = Utc::now();
        let reply = Reply {
            id: Uuid::new_v4(),
            comment_id,
            author_username: author.username.clone(),
            content: content.to_string(),
            like_count: 0,
            dislike_count: 0,
            edited: false,
            created_at: now,
            updated_at: now,
        };

        self.write("create_reply", deadline, |tx| {
            if author_of(tx, ReactableKind::Comment, &comment_id.to_string())?.is_none() {
                return Err(EngineError::NotFound("comment"));
            }
            tx.execute(
                "INSERT INTO replies (id, comment_id, author_username, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                (
                    reply.id.to_string(),
                    comment_id.to_string(),
                    &reply.author_username,
                    &reply.content,
                    timestamp(reply.created_at),
                ),
            )?;
            Ok(())
        })?;
        Ok(reply)
    }

    /// Replace the title and content of a story written by `requester`.
    /// The preview is rebuilt and the story is marked edited.
    pub fn update_story(
        &self,
        story_id: Uuid,
        requester: &str,
        title: &str,
        content: &str,
        deadline: Deadline,
    ) -> Result<Story> {
        let title = require_text("title", title, self.config.max_title_len)?;
        let content = require_text("content", content, self.config.max_content_len)?;
        let sql = format!(
            "UPDATE stories
             SET title = ?1, content = ?2, preview = ?3, edited = 1, updated_at = ?4
             WHERE id = ?5 AND author_username = ?6
             RETURNING {STORY_COLUMNS}"
        );

        self.write("update_story", deadline, |tx| {
            tx.query_row(
                &sql,
                (
                    title,
                    content,
                    preview(content),
                    timestamp(Utc::now()),
                    story_id.to_string(),
                    requester,
                ),
                story_from_row,
            )
            .optional()?
            .ok_or(EngineError::NotAuthorOrNotFound)
        })
    }

    pub fn update_comment(
        &self,
        comment_id: Uuid,
        requester: &str,
        content: &str,
        deadline: Deadline,
    ) -> Result<Comment> {
        let content = require_text("content", content, self.config.max_content_len)?;
        self.write("update_comment", deadline, |tx| {
            edit_content(
                tx,
                ReactableKind::Comment,
                COMMENT_COLUMNS,
                comment_id,
                requester,
                content,
                comment_from_row,
            )
        })
    }

    pub fn update_reply(
        &self,
        reply_id: Uuid,
        requester: &str,
        content: &str,
        deadline: Deadline,
    ) -> Result<Reply> {
        let content = require_text("content", content, self.config.max_content_len)?;
        self.write("update_reply", deadline, |tx| {
            edit_content(
                tx,
                ReactableKind::Reply,
                REPLY_COLUMNS,
                reply_id,
                requester,
                content,
                reply_from_row,
            )
        })
    }

    pub fn story(&self, id: Uuid, deadline: Deadline) -> Result<Story> {
        self.read(deadline, |conn| {
            load_story(conn, &id.to_string())?.ok_or(EngineError::NotFound("story"))
        })
    }

    /// Comments on a story, oldest first.
    pub fn comments_for(&self, story_id: Uuid, deadline: Deadline) -> Result<Vec<Comment>> {
        self.read(deadline, |conn| {
            let key = story_id.to_string();
            if author_of(conn, ReactableKind::Story, &key)?.is_none() {
                return Err(EngineError::NotFound("story"));
            }
            let sql = format!(
                "SELECT {COMMENT_COLUMNS} FROM comments WHERE story_id = ?1 ORDER BY created_at, rowid"
            );
            let mut stmt = conn.prepare(&sql)?;
            let comments = stmt
                .query_map([&key], comment_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(comments)
        })
    }

    /// Replies to a comment, oldest first.
    pub fn replies_for(&self, comment_id: Uuid, deadline: Deadline) -> Result<Vec<Reply>> {
        self.read(deadline, |conn| {
            let key = comment_id.to_string();
            if author_of(conn, ReactableKind::Comment, &key)?.is_none() {
                return Err(EngineError::NotFound("comment"));
            }
            let sql = format!(
                "SELECT {REPLY_COLUMNS} FROM replies WHERE comment_id = ?1 ORDER BY created_at, rowid"
            );
            let mut stmt = conn.prepare(&sql)?;
            let replies = stmt
                .query_map([&key], reply_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(replies)
        })
    }

    /// Reaction state of any reactable, including who liked and disliked it.
    pub fn reactable(&self, kind: ReactableKind, id: Uuid, deadline: Deadline) -> Result<Reactable> {
        self.read(deadline, |conn| load_reactable(conn, kind, id))
    }
}

/// Rewrite the content of a comment or reply matched by `(id, author)`.
/// No match means the requester is not the author or the row is gone.
fn edit_content<T>(
    conn: &Connection,
    kind: ReactableKind,
    columns: &str,
    id: Uuid,
    requester: &str,
    content: &str,
    from_row: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<T> {
    let sql = format!(
        "UPDATE {} SET content = ?1, edited = 1, updated_at = ?2
         WHERE id = ?3 AND author_username = ?4
         RETURNING {columns}",
        table(kind)
    );
    conn.query_row(
        &sql,
        (content, timestamp(Utc::now()), id.to_string(), requester),
        from_row,
    )
    .optional()?
    .ok_or(EngineError::NotAuthorOrNotFound)
}

pub(crate) fn load_story(conn: &Connection, id: &str) -> rusqlite::Result<Option<Story>> {
    let sql = format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?1");
    conn.query_row(&sql, [id], story_from_row).optional()
}

pub(crate) fn load_reactable(conn: &Connection, kind: ReactableKind, id: Uuid) -> Result<Reactable> {
    let key = id.to_string();
    let sql = format!(
        "SELECT author_username, like_count, dislike_count FROM {} WHERE id = ?1",
        table(kind)
    );
    let (author_username, like_count, dislike_count): (String, u32, u32) = conn
        .query_row(&sql, [&key], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .optional()?
        .ok_or(EngineError::NotFound(kind.as_str()))?;

    let likes = string_list(
        conn,
        "SELECT username FROM reactions WHERE entity_id = ?1 AND kind = 'like' ORDER BY seq",
        &key,
    )?;
    let dislikes = string_list(
        conn,
        "SELECT username FROM reactions WHERE entity_id = ?1 AND kind = 'dislike' ORDER BY seq",
        &key,
    )?;

    Ok(Reactable {
        id,
        kind,
        author_username,
        likes,
        dislikes,
        like_count,
        dislike_count,
    })
}
