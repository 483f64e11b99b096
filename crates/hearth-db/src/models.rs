//! Row types and column codecs. Ids are stored as hyphenated UUID text and
//! timestamps as RFC 3339 text with microsecond precision, so both sort
//! lexically.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use hearth_types::models::{Comment, Message, Reply, Story};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub const STORY_COLUMNS: &str =
    "id, author_username, title, content, preview, like_count, dislike_count, score, edited, created_at, updated_at";

pub fn story_from_row(row: &Row<'_>) -> rusqlite::Result<Story> {
    Ok(Story {
        id: uuid_column(row, 0)?,
        author_username: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        preview: row.get(4)?,
        like_count: row.get(5)?,
        dislike_count: row.get(6)?,
        score: row.get(7)?,
        edited: row.get(8)?,
        created_at: time_column(row, 9)?,
        updated_at: time_column(row, 10)?,
    })
}

pub const COMMENT_COLUMNS: &str =
    "id, story_id, author_username, content, like_count, dislike_count, edited, created_at, updated_at";

pub fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: uuid_column(row, 0)?,
        story_id: uuid_column(row, 1)?,
        author_username: row.get(2)?,
        content: row.get(3)?,
        like_count: row.get(4)?,
        dislike_count: row.get(5)?,
        edited: row.get(6)?,
        created_at: time_column(row, 7)?,
        updated_at: time_column(row, 8)?,
    })
}

pub const REPLY_COLUMNS: &str =
    "id, comment_id, author_username, content, like_count, dislike_count, edited, created_at, updated_at";

pub fn reply_from_row(row: &Row<'_>) -> rusqlite::Result<Reply> {
    Ok(Reply {
        id: uuid_column(row, 0)?,
        comment_id: uuid_column(row, 1)?,
        author_username: row.get(2)?,
        content: row.get(3)?,
        like_count: row.get(4)?,
        dislike_count: row.get(5)?,
        edited: row.get(6)?,
        created_at: time_column(row, 7)?,
        updated_at: time_column(row, 8)?,
    })
}

/// Columns for a message as seen through one conversation copy:
/// `m` is `messages`, `cm` is `conversation_messages`.
pub const CONVERSATION_MESSAGE_COLUMNS: &str =
    "m.id, m.content, m.sender, m.recipient, cm.read, m.created_at";

pub fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: uuid_column(row, 0)?,
        content: row.get(1)?,
        from: row.get(2)?,
        to: row.get(3)?,
        read: row.get(4)?,
        created_at: time_column(row, 5)?,
    })
}
