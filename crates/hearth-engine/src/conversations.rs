//! Direct messages. Every pair of users has up to two conversation
//! documents, one per owner. A message is stored once and linked into both
//! documents inside the same transaction, each link carrying that owner's
//! read flag. Deletes are per owner and never touch the peer's copy;
//! message bodies go away once no conversation links them.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use tracing::debug;
use uuid::Uuid;

use hearth_db::models::{
    CONVERSATION_MESSAGE_COLUMNS, message_from_row, time_column, timestamp, uuid_column,
};
use hearth_db::queries::{blocked_either_way, user_exists};
use hearth_types::events::Notice;
use hearth_types::models::{Conversation, ConversationPreview};

use crate::error::{EngineError, Result};
use crate::sql::{execute_in, placeholders};
use crate::{Deadline, Engine, require_text};

impl Engine {
    /// Deliver a message from `from` to `to` and return the sender's copy of
    /// the conversation. Only the recipient's unread count moves.
    pub fn send_message(
        &self,
        from: &str,
        to: &str,
        content: &str,
        deadline: Deadline,
    ) -> Result<Conversation> {
        if from == to {
            return Err(EngineError::SelfConversation);
        }
        let content = require_text("message", content, self.config.max_message_len)?;
        let message_id = Uuid::new_v4();

        let conversation = self.write("send_message", deadline, |tx| {
            if !user_exists(tx, to)? {
                return Err(EngineError::NotFound("user"));
            }
            if blocked_either_way(tx, from, to)? {
                return Err(EngineError::Blocked);
            }

            let now = timestamp(Utc::now());
            tx.execute(
                "INSERT INTO messages (id, sender, recipient, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (message_id.to_string(), from, to, content, &now),
            )?;

            let sender_copy = upsert_conversation(tx, from, to, 0, &now)?;
            let recipient_copy = upsert_conversation(tx, to, from, 1, &now)?;
            link_message(tx, &sender_copy, message_id, true)?;
            link_message(tx, &recipient_copy, message_id, false)?;

            load_conversation(tx, &sender_copy)
        })?;

        self.notify(Notice::MessageSent {
            message_id,
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(conversation)
    }

    /// Open `owner`'s conversation with `other`.
    ///
    /// This read marks every message in the owner's copy as read and resets
    /// its unread count to zero. The peer's copy is untouched.
    pub fn find_conversation(
        &self,
        owner: &str,
        other: &str,
        deadline: Deadline,
    ) -> Result<Conversation> {
        if owner == other {
            return Err(EngineError::SelfConversation);
        }

        self.write("find_conversation", deadline, |tx| {
            if blocked_either_way(tx, owner, other)? {
                return Err(EngineError::Blocked);
            }
            let id: String = tx
                .query_row(
                    "SELECT id FROM conversations WHERE owner = ?1 AND peer = ?2",
                    [owner, other],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or(EngineError::NotFound("conversation"))?;

            let marked = tx.execute(
                "UPDATE conversation_messages SET read = 1 WHERE conversation_id = ?1 AND read = 0",
                [&id],
            )?;
            tx.execute(
                "UPDATE conversations SET unread_count = 0 WHERE id = ?1",
                [&id],
            )?;
            if marked > 0 {
                debug!(owner, other, marked, "conversation marked read");
            }

            load_conversation(tx, &id)
        })
    }

    /// Latest message of every conversation `owner` holds, most recently
    /// active first. Conversations whose messages were all deleted are
    /// left out.
    pub fn list_previews(&self, owner: &str, deadline: Deadline) -> Result<Vec<ConversationPreview>> {
        self.read(deadline, |conn| {
            let sql = format!(
                "SELECT {CONVERSATION_MESSAGE_COLUMNS}, c.id, c.owner, c.peer, c.unread_count, c.updated_at
                 FROM conversations c
                 JOIN conversation_messages cm ON cm.seq =
                     (SELECT MAX(seq) FROM conversation_messages WHERE conversation_id = c.id)
                 JOIN messages m ON m.id = cm.message_id
                 WHERE c.owner = ?1
                 ORDER BY c.updated_at DESC, c.id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let previews = stmt
                .query_map([owner], |row| {
                    Ok(ConversationPreview {
                        preview_message: message_from_row(row)?,
                        id: uuid_column(row, 6)?,
                        owner: row.get(7)?,
                        to: row.get(8)?,
                        unread_count: row.get(9)?,
                        updated_at: time_column(row, 10)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(previews)
        })
    }

    /// Remove messages from `owner`'s copies only. Returns how many were
    /// removed.
    pub fn delete_messages(&self, owner: &str, ids: &[Uuid], deadline: Deadline) -> Result<usize> {
        if ids.is_empty() {
            return Err(EngineError::invalid("no message ids given"));
        }
        let keys: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        self.write("delete_messages", deadline, |tx| {
            let mut removed = 0;
            for chunk in keys.chunks(500) {
                let sql = format!(
                    "DELETE FROM conversation_messages
                     WHERE conversation_id IN (SELECT id FROM conversations WHERE owner = ?)
                       AND message_id IN ({})",
                    placeholders(chunk.len())
                );
                let params = std::iter::once(owner).chain(chunk.iter().map(String::as_str));
                removed += tx.execute(&sql, params_from_iter(params))?;
            }
            if removed == 0 {
                return Err(EngineError::NotFound("message"));
            }

            tx.execute(
                "UPDATE conversations SET unread_count =
                     (SELECT COUNT(*) FROM conversation_messages
                      WHERE conversation_id = conversations.id AND read = 0)
                 WHERE owner = ?1",
                [owner],
            )?;
            execute_in(
                tx,
                "DELETE FROM messages
                 WHERE NOT EXISTS (SELECT 1 FROM conversation_messages WHERE message_id = messages.id)
                   AND id IN",
                &keys,
            )?;
            Ok(removed)
        })
    }

    /// Drop `owner`'s copy of a conversation. The peer keeps theirs.
    pub fn delete_conversation(
        &self,
        owner: &str,
        conversation_id: Uuid,
        deadline: Deadline,
    ) -> Result<()> {
        self.write("delete_conversation", deadline, |tx| {
            let removed = tx.execute(
                "DELETE FROM conversations WHERE id = ?1 AND owner = ?2",
                [conversation_id.to_string().as_str(), owner],
            )?;
            if removed == 0 {
                return Err(EngineError::NotFound("conversation"));
            }
            tx.execute(
                "DELETE FROM messages
                 WHERE (sender = ?1 OR recipient = ?1)
                   AND NOT EXISTS (SELECT 1 FROM conversation_messages WHERE message_id = messages.id)",
                [owner],
            )?;
            Ok(())
        })
    }
}

/// Create `owner`'s copy if missing, otherwise bump it. Returns its id.
fn upsert_conversation(
    conn: &Connection,
    owner: &str,
    peer: &str,
    unread: u32,
    now: &str,
) -> rusqlite::Result<String> {
    conn.query_row(
        "INSERT INTO conversations (id, owner, peer, unread_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)
         ON CONFLICT(owner, peer) DO UPDATE SET
             unread_count = unread_count + excluded.unread_count,
             updated_at = excluded.updated_at
         RETURNING id",
        (Uuid::new_v4().to_string(), owner, peer, unread, now),
        |row| row.get(0),
    )
}

fn link_message(
    conn: &Connection,
    conversation_id: &str,
    message_id: Uuid,
    read: bool,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO conversation_messages (conversation_id, message_id, read) VALUES (?1, ?2, ?3)",
        (conversation_id, message_id.to_string(), read),
    )?;
    Ok(())
}

fn load_conversation(conn: &Connection, id: &str) -> Result<Conversation> {
    let (owner, to, unread_count, created_at, updated_at): (
        String,
        String,
        u32,
        DateTime<Utc>,
        DateTime<Utc>,
    ) = conn
        .query_row(
            "SELECT owner, peer, unread_count, created_at, updated_at FROM conversations WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    time_column(row, 3)?,
                    time_column(row, 4)?,
                ))
            },
        )
        .optional()?
        .ok_or(EngineError::NotFound("conversation"))?;

    let sql = format!(
        "SELECT {CONVERSATION_MESSAGE_COLUMNS}
         FROM conversation_messages cm
         JOIN messages m ON m.id = cm.message_id
         WHERE cm.conversation_id = ?1
         ORDER BY cm.seq"
    );
    let mut stmt = conn.prepare(&sql)?;
    let messages = stmt
        .query_map([id], message_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let id = Uuid::parse_str(id).map_err(|e| EngineError::Internal(e.to_string()))?;
    Ok(Conversation {
        id,
        owner,
        to,
        messages,
        unread_count,
        created_at,
        updated_at,
    })
}
