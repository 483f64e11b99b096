//! Author-only deletion of a story, comment or reply together with
//! everything hanging off it.
//!
//! A cascade runs inside one write transaction in three steps:
//!
//! 1. Delete the primary row matched by `(id, author_username)`. No match
//!    means the requester is not the author or the entity does not exist.
//! 2. Plan the dependents. Lookups fan out over the reader pool on bounded
//!    workers. Readers see the last committed state, which cannot move
//!    while the writer holds its reservation.
//! 3. Delete the planned rows plus every flag and reaction pointing at any
//!    removed entity. A dependent delete that does not remove exactly what
//!    was planned aborts the whole transaction.
//!
//! Any error in any step drops the transaction, so either the full cascade
//! commits or nothing does.

use rusqlite::Transaction;
use tracing::info;
use uuid::Uuid;

use hearth_db::queries::string_list;
use hearth_types::events::Notice;

use crate::error::{EngineError, Result};
use crate::fanout::{self, Job};
use crate::sql::execute_in;
use crate::{Deadline, Engine};

/// Rows removed by one cascade, not counting the primary entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub comments: usize,
    pub replies: usize,
    pub flags: usize,
    pub reactions: usize,
    pub read_later: usize,
}

/// Dependents found during planning.
#[derive(Default)]
struct Doomed {
    comments: Vec<String>,
    replies: Vec<String>,
    read_later: Vec<String>,
}

impl Engine {
    pub fn delete_story(
        &self,
        story_id: Uuid,
        requester: &str,
        deadline: Deadline,
    ) -> Result<CascadeSummary> {
        let key = story_id.to_string();

        let summary = self.write("delete_story", deadline, |tx| {
            remove_primary(tx, "stories", &key, requester)?;

            let mut found = fanout::run_bounded(
                self.config.cascade_workers,
                deadline,
                vec![
                    self.lookup("SELECT id FROM comments WHERE story_id = ?1", &key),
                    self.lookup("SELECT id FROM read_later WHERE story_id = ?1", &key),
                ],
            )?;
            let read_later = found.pop().unwrap_or_default();
            let comments = found.pop().unwrap_or_default();

            let replies = self.replies_of(&comments, deadline)?;
            let doomed = Doomed {
                comments,
                replies,
                read_later,
            };
            deadline.check()?;
            apply(tx, &key, &doomed)
        })?;

        info!(
            %story_id,
            comments = summary.comments,
            replies = summary.replies,
            flags = summary.flags,
            "story deleted"
        );
        self.notify(Notice::StoryDeleted {
            story_id,
            author: requester.to_string(),
            comments: summary.comments,
            replies: summary.replies,
        });
        Ok(summary)
    }

    pub fn delete_comment(
        &self,
        comment_id: Uuid,
        requester: &str,
        deadline: Deadline,
    ) -> Result<CascadeSummary> {
        let key = comment_id.to_string();

        let summary = self.write("delete_comment", deadline, |tx| {
            remove_primary(tx, "comments", &key, requester)?;
            let replies = self.replies_of(std::slice::from_ref(&key), deadline)?;
            let doomed = Doomed {
                replies,
                ..Doomed::default()
            };
            deadline.check()?;
            apply(tx, &key, &doomed)
        })?;

        info!(%comment_id, replies = summary.replies, flags = summary.flags, "comment deleted");
        self.notify(Notice::CommentDeleted {
            comment_id,
            author: requester.to_string(),
            replies: summary.replies,
        });
        Ok(summary)
    }

    pub fn delete_reply(
        &self,
        reply_id: Uuid,
        requester: &str,
        deadline: Deadline,
    ) -> Result<CascadeSummary> {
        let key = reply_id.to_string();
        self.write("delete_reply", deadline, |tx| {
            remove_primary(tx, "replies", &key, requester)?;
            apply(tx, &key, &Doomed::default())
        })
    }

    /// Ids of every reply to any of `comments`, one lookup job per comment.
    fn replies_of(&self, comments: &[String], deadline: Deadline) -> Result<Vec<String>> {
        let jobs = comments
            .iter()
            .map(|id| self.lookup("SELECT id FROM replies WHERE comment_id = ?1", id))
            .collect();
        let per_comment = fanout::run_bounded(self.config.cascade_workers, deadline, jobs)?;
        Ok(per_comment.into_iter().flatten().collect())
    }

    fn lookup<'a>(&'a self, sql: &'static str, key: &'a str) -> Job<'a, Vec<String>> {
        Box::new(move || -> Result<Vec<String>> {
            self.db.with_conn(|conn| Ok(string_list(conn, sql, key)?))
        })
    }
}

fn remove_primary(tx: &Transaction<'_>, table: &str, id: &str, requester: &str) -> Result<()> {
    let sql = format!("DELETE FROM {table} WHERE id = ?1 AND author_username = ?2");
    if tx.execute(&sql, [id, requester])? == 0 {
        return Err(EngineError::NotAuthorOrNotFound);
    }
    Ok(())
}

fn apply(tx: &Transaction<'_>, primary: &str, doomed: &Doomed) -> Result<CascadeSummary> {
    let mut entities = Vec::with_capacity(1 + doomed.comments.len() + doomed.replies.len());
    entities.push(primary.to_string());
    entities.extend(doomed.comments.iter().cloned());
    entities.extend(doomed.replies.iter().cloned());

    let replies = expect_removed(tx, "DELETE FROM replies WHERE id IN", &doomed.replies)?;
    let comments = expect_removed(tx, "DELETE FROM comments WHERE id IN", &doomed.comments)?;
    let read_later = expect_removed(tx, "DELETE FROM read_later WHERE id IN", &doomed.read_later)?;

    let flags = execute_in(
        tx,
        "DELETE FROM flags WHERE target_kind <> 'user' AND target IN",
        &entities,
    )?;
    let reactions = execute_in(tx, "DELETE FROM reactions WHERE entity_id IN", &entities)?;

    Ok(CascadeSummary {
        comments,
        replies,
        flags,
        reactions,
        read_later,
    })
}

fn expect_removed(tx: &Transaction<'_>, prefix: &str, ids: &[String]) -> Result<usize> {
    let removed = execute_in(tx, prefix, ids)?;
    if removed != ids.len() {
        return Err(EngineError::TransactionAborted(format!(
            "cascade removed {removed} of {} planned rows",
            ids.len()
        )));
    }
    Ok(removed)
}
