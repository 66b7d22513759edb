// packages/engine/src/runtime/deadline.rs
//! Per-round deadlines
//!
//! A round's deadline only bounds how long the coordinator waits for results.
//! It never cancels actor work; that is the job of the global cancellation token.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Default deadline plus optional per-round overrides
///
/// `per_round[i]` applies to round `i + 1`. A zero entry, or a missing one,
/// falls back to the default; a zero default means no deadline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlinePolicy {
    pub default: Duration,
    pub per_round: Vec<Duration>,
}

impl DeadlinePolicy {
    /// No deadline for any round
    pub fn none() -> Self {
        Self::default()
    }

    pub fn uniform(deadline: Duration) -> Self {
        Self {
            default: deadline,
            per_round: Vec::new(),
        }
    }

    pub fn with_overrides(mut self, per_round: Vec<Duration>) -> Self {
        self.per_round = per_round;
        self
    }

    /// Deadline for a 1-based round number
    pub fn deadline_for(&self, round: u32) -> Option<Duration> {
        let index = (round as usize).checked_sub(1)?;

        self.per_round
            .get(index)
            .copied()
            .filter(|d| !d.is_zero())
            .or_else(|| Some(self.default).filter(|d| !d.is_zero()))
    }
}

/// Deadline scope opened for one round and closed before the next
#[derive(Debug)]
pub struct RoundScope {
    round: u32,
    deadline: Option<Duration>,
    opened_at: Instant,
    expires_at: Option<Instant>,
}

impl RoundScope {
    /// Open a scope; a deadline too far out to represent behaves as none
    pub fn open(round: u32, deadline: Option<Duration>) -> Self {
        let opened_at = Instant::now();
        Self {
            round,
            deadline,
            opened_at,
            expires_at: deadline.and_then(|d| opened_at.checked_add(d)),
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn elapsed(&self) -> Duration {
        self.opened_at.elapsed()
    }

    /// Resolves when the deadline passes; pending forever without one
    pub async fn expired(&self) {
        match self.expires_at {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Close the scope, returning how long the round lasted
    pub fn close(self) -> Duration {
        self.elapsed()
    }
}
