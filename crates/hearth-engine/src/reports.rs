use chrono::Utc;
use uuid::Uuid;

use hearth_db::models::timestamp;
use hearth_db::queries::user_exists;
use hearth_types::events::Notice;
use hearth_types::models::{Actor, Flag, FlagTarget, ReactableKind};

use crate::error::{EngineError, Result, is_unique_violation};
use crate::sql::author_of;
use crate::{Deadline, Engine, require_text};

impl Engine {
    /// File a flag against a piece of content or a user. Each flagger may
    /// report a given target once; reporting a user also refreshes that
    /// user's `flag_count`.
    pub fn report(
        &self,
        flagger: &Actor,
        target: FlagTarget,
        reason: &str,
        deadline: Deadline,
    ) -> Result<Flag> {
        let reason = require_text("reason", reason, self.config.max_reason_len)?;
        let flag = Flag {
            id: Uuid::new_v4(),
            flagger_id: flagger.id,
            target,
            reason: reason.to_string(),
            created_at: Utc::now(),
        };
        let key = flag.target.key();

        self.write("report", deadline, |tx| {
            let exists = match &flag.target {
                FlagTarget::Story(_) => author_of(tx, ReactableKind::Story, &key)?.is_some(),
                FlagTarget::Comment(_) => author_of(tx, ReactableKind::Comment, &key)?.is_some(),
                FlagTarget::Reply(_) => author_of(tx, ReactableKind::Reply, &key)?.is_some(),
                FlagTarget::User(username) => user_exists(tx, username)?,
            };
            if !exists {
                return Err(EngineError::NotFound(flag.target.kind_str()));
            }

            tx.execute(
                "INSERT INTO flags (id, flagger_id, target_kind, target, reason, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (
                    flag.id.to_string(),
                    flag.flagger_id.to_string(),
                    flag.target.kind_str(),
                    &key,
                    &flag.reason,
                    timestamp(flag.created_at),
                ),
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    EngineError::DuplicateReport
                } else {
                    e.into()
                }
            })?;

            if let FlagTarget::User(username) = &flag.target {
                tx.execute(
                    "UPDATE users SET flag_count =
                         (SELECT COUNT(*) FROM flags WHERE target_kind = 'user' AND target = ?1)
                     WHERE username = ?1",
                    [username],
                )?;
            }
            Ok(())
        })?;

        self.notify(Notice::Reported {
            flagger_id: flag.flagger_id,
            target: flag.target.clone(),
            reason: flag.reason.clone(),
        });
        Ok(flag)
    }
}
