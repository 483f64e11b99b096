use std::time::{Duration, Instant};

use crate::error::{EngineError, Result};

/// Point in time after which an operation must give up and roll back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// No deadline at all.
    pub const fn none() -> Self {
        Self(None)
    }

    pub fn expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.0.map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn check(&self) -> Result<()> {
        if self.expired() {
            return Err(EngineError::DeadlineExceeded);
        }
        Ok(())
    }
}
