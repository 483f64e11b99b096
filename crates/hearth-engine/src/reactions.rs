//! Like/dislike toggling. A user holds at most one reaction per entity, so
//! switching sides replaces the old row and the counters are re-derived from
//! the reaction rows in the same transaction.

use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use hearth_types::events::Notice;
use hearth_types::models::{ReactableKind, Reaction, ReactionTally};

use crate::error::{EngineError, Result, is_unique_violation};
use crate::sql::{author_of, table};
use crate::{Deadline, Engine};

impl Engine {
    pub fn like(
        &self,
        kind: ReactableKind,
        entity_id: Uuid,
        actor: &str,
        deadline: Deadline,
    ) -> Result<ReactionTally> {
        self.react(kind, entity_id, actor, Reaction::Like, deadline)
    }

    pub fn dislike(
        &self,
        kind: ReactableKind,
        entity_id: Uuid,
        actor: &str,
        deadline: Deadline,
    ) -> Result<ReactionTally> {
        self.react(kind, entity_id, actor, Reaction::Dislike, deadline)
    }

    fn react(
        &self,
        kind: ReactableKind,
        entity_id: Uuid,
        actor: &str,
        reaction: Reaction,
        deadline: Deadline,
    ) -> Result<ReactionTally> {
        let key = entity_id.to_string();

        let (author, tally) = self.write("react", deadline, |tx| {
            let author = author_of(tx, kind, &key)?.ok_or(EngineError::NotFound(kind.as_str()))?;

            let current: Option<String> = tx
                .query_row(
                    "SELECT kind FROM reactions WHERE entity_id = ?1 AND username = ?2",
                    [key.as_str(), actor],
                    |row| row.get(0),
                )
                .optional()?;

            match current.as_deref() {
                Some(existing) if existing == reaction.as_str() => {
                    return Err(EngineError::AlreadyReacted);
                }
                // Switching sides: the user moves to the end of the other list
                Some(_) => {
                    tx.execute(
                        "DELETE FROM reactions WHERE entity_id = ?1 AND username = ?2",
                        [key.as_str(), actor],
                    )?;
                }
                None => {}
            }

            tx.execute(
                "INSERT INTO reactions (entity_id, username, kind) VALUES (?1, ?2, ?3)",
                [key.as_str(), actor, reaction.as_str()],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    EngineError::AlreadyReacted
                } else {
                    e.into()
                }
            })?;

            let tally = refresh_counts(tx, kind, &key)?;
            Ok((author, tally))
        })?;

        self.notify(Notice::Reacted {
            actor: actor.to_string(),
            author,
            kind,
            entity_id,
            reaction,
        });
        Ok(tally)
    }
}

/// Re-derive the counters of an entity from its reaction rows.
fn refresh_counts(conn: &Connection, kind: ReactableKind, key: &str) -> rusqlite::Result<ReactionTally> {
    const LIKES: &str = "(SELECT COUNT(*) FROM reactions WHERE entity_id = ?1 AND kind = 'like')";
    const DISLIKES: &str =
        "(SELECT COUNT(*) FROM reactions WHERE entity_id = ?1 AND kind = 'dislike')";

    let score = match kind {
        ReactableKind::Story => format!(", score = {LIKES} - {DISLIKES}"),
        ReactableKind::Comment | ReactableKind::Reply => String::new(),
    };
    let sql = format!(
        "UPDATE {} SET like_count = {LIKES}, dislike_count = {DISLIKES}{score}
         WHERE id = ?1 RETURNING like_count, dislike_count",
        table(kind)
    );

    conn.query_row(&sql, [key], |row| {
        Ok(ReactionTally {
            like_count: row.get(0)?,
            dislike_count: row.get(1)?,
        })
    })
}
