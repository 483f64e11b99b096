//! Interaction & consistency engine: every operation that mutates shared
//! documents under concurrent access. Each public operation is one unit of
//! work against the store and either commits completely or not at all.

pub mod cascade;
pub mod content;
pub mod conversations;
pub mod deadline;
pub mod error;
pub mod fanout;
pub mod notifier;
pub mod reactions;
pub mod read_later;
pub mod reports;
pub mod social;

mod sql;

use std::sync::Arc;

use rusqlite::{Connection, Transaction};
use tracing::{debug, warn};

use hearth_db::Database;
use hearth_types::events::Notice;

pub use deadline::Deadline;
pub use error::{EngineError, ErrorKind, Result};
pub use notifier::Notifier;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Upper bound on parallel workers used by cascading deletes.
    pub cascade_workers: usize,
    pub max_title_len: usize,
    pub max_content_len: usize,
    pub max_message_len: usize,
    pub max_reason_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cascade_workers: 4,
            max_title_len: 200,
            max_content_len: 10_000,
            max_message_len: 2_000,
            max_reason_len: 500,
        }
    }
}

#[derive(Clone)]
pub struct Engine {
    db: Arc<Database>,
    notifier: Notifier,
    config: EngineConfig,
}

impl Engine {
    pub fn new(db: Arc<Database>, notifier: Notifier, config: EngineConfig) -> Self {
        Self {
            db,
            notifier,
            config,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Run `f` in a write transaction bounded by `deadline`. The deadline is
    /// checked once the writer is held and again right before commit.
    pub(crate) fn write<T>(
        &self,
        op: &'static str,
        deadline: Deadline,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        deadline.check()?;
        let result: Result<T> = self.db.transaction(|tx| {
            deadline.check()?;
            let value = f(tx)?;
            deadline.check()?;
            Ok(value)
        });

        match &result {
            Ok(_) => debug!(op, "committed"),
            Err(e) if matches!(e.kind(), ErrorKind::TransactionAborted | ErrorKind::Internal) => {
                warn!(op, error = %e, "transaction rolled back")
            }
            Err(e) => debug!(op, error = %e, "rejected"),
        }
        result
    }

    /// Run `f` against one consistent snapshot of committed state.
    pub(crate) fn read<T>(
        &self,
        deadline: Deadline,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        deadline.check()?;
        self.db.with_snapshot(f)
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.notifier.publish(notice);
    }
}

/// Trim `value` and enforce a non-empty, bounded length in characters.
pub(crate) fn require_text<'a>(field: &str, value: &'a str, max_chars: usize) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::invalid(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(EngineError::invalid(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed)
}
