//! Follow and block edges. Each edge is a single row, so both directions of
//! a relationship (`following`/`followers`, `blockList`/`blockByList`) are
//! views of the same fact and cannot disagree.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use hearth_db::models::timestamp;
use hearth_db::queries::{blocked_either_way, string_list, user_exists};
use hearth_types::events::Notice;
use hearth_types::models::{Actor, UserEdges};

use crate::error::{EngineError, Result, is_unique_violation};
use crate::{Deadline, Engine};

impl Engine {
    pub fn follow(&self, follower: &str, target: &str, deadline: Deadline) -> Result<()> {
        if follower == target {
            return Err(EngineError::SelfFollow);
        }

        self.write("follow", deadline, |tx| {
            require_user(tx, target)?;
            require_user(tx, follower)?;
            if blocked_either_way(tx, follower, target)? {
                return Err(EngineError::Blocked);
            }

            tx.execute(
                "INSERT INTO follows (follower, followee, created_at) VALUES (?1, ?2, ?3)",
                (follower, target, timestamp(Utc::now())),
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    EngineError::AlreadyFollowing
                } else {
                    e.into()
                }
            })?;

            refresh_follower_count(tx, target)
        })?;

        self.notify(Notice::Followed {
            follower: follower.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }

    pub fn unfollow(&self, follower: &str, target: &str, deadline: Deadline) -> Result<()> {
        self.write("unfollow", deadline, |tx| {
            require_user(tx, target)?;
            let removed = tx.execute(
                "DELETE FROM follows WHERE follower = ?1 AND followee = ?2",
                [follower, target],
            )?;
            if removed == 0 {
                return Err(EngineError::NotFollowing);
            }
            refresh_follower_count(tx, target)
        })?;

        self.notify(Notice::Unfollowed {
            follower: follower.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }

    /// Block `target` on behalf of `actor`. The blocker's username is
    /// resolved from the actor's id.
    pub fn block(&self, actor: &Actor, target: &str, deadline: Deadline) -> Result<()> {
        self.write("block", deadline, |tx| {
            let blocker = username_for(tx, actor)?;
            if blocker == target {
                return Err(EngineError::SelfBlock);
            }
            require_user(tx, target)?;

            tx.execute(
                "INSERT INTO blocks (blocker, blocked, created_at) VALUES (?1, ?2, ?3)",
                (&blocker, target, timestamp(Utc::now())),
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    EngineError::AlreadyBlocked
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    pub fn unblock(&self, actor: &Actor, target: &str, deadline: Deadline) -> Result<()> {
        self.write("unblock", deadline, |tx| {
            let blocker = username_for(tx, actor)?;
            let removed = tx.execute(
                "DELETE FROM blocks WHERE blocker = ?1 AND blocked = ?2",
                [blocker.as_str(), target],
            )?;
            if removed == 0 {
                return Err(EngineError::NotBlocked);
            }
            Ok(())
        })
    }

    /// Both sides of every edge touching `username`, lists in the order the
    /// edges were made.
    pub fn user_edges(&self, username: &str, deadline: Deadline) -> Result<UserEdges> {
        self.read(deadline, |conn| {
            let (follower_count, flag_count): (u32, u32) = conn
                .query_row(
                    "SELECT follower_count, flag_count FROM users WHERE username = ?1",
                    [username],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?
                .ok_or(EngineError::NotFound("user"))?;

            Ok(UserEdges {
                username: username.to_string(),
                followers: string_list(
                    conn,
                    "SELECT follower FROM follows WHERE followee = ?1 ORDER BY seq",
                    username,
                )?,
                following: string_list(
                    conn,
                    "SELECT followee FROM follows WHERE follower = ?1 ORDER BY seq",
                    username,
                )?,
                follower_count,
                flag_count,
                block_list: string_list(
                    conn,
                    "SELECT blocked FROM blocks WHERE blocker = ?1 ORDER BY seq",
                    username,
                )?,
                block_by_list: string_list(
                    conn,
                    "SELECT blocker FROM blocks WHERE blocked = ?1 ORDER BY seq",
                    username,
                )?,
            })
        })
    }
}

fn require_user(conn: &Connection, username: &str) -> Result<()> {
    if !user_exists(conn, username)? {
        return Err(EngineError::NotFound("user"));
    }
    Ok(())
}

fn username_for(conn: &Connection, actor: &Actor) -> Result<String> {
    conn.query_row(
        "SELECT username FROM users WHERE id = ?1",
        [actor.id.to_string()],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(EngineError::NotFound("user"))
}

/// The counter is always the number of follow rows, never a running tally.
fn refresh_follower_count(conn: &Connection, username: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET follower_count =
             (SELECT COUNT(*) FROM follows WHERE followee = ?1)
         WHERE username = ?1",
        [username],
    )?;
    Ok(())
}
