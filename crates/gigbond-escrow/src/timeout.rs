//! # Timeout Policy
//!
//! The talent has a fixed response window, measured from the moment the
//! brief was sent, to accept it. Once the window has elapsed the customer
//! may reclaim the deposit. Nothing fires proactively; the check runs
//! when the customer calls `process_timeout`.
//!
//! Only [`BriefSent`](crate::ProposalStatus::BriefSent) is timed. A
//! proposal waiting on the customer in `ProposalSent` has no deadline.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use gigbond_core::{ProposalId, Timestamp};

use crate::error::EscrowError;

/// Default response window: 24 hours.
pub const DEFAULT_RESPONSE_WINDOW_SECS: u64 = 24 * 60 * 60;

/// Computes whether the response window has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    window_secs: i64,
}

impl TimeoutPolicy {
    /// A policy with the given window. Windows longer than `i64::MAX`
    /// seconds are clamped.
    pub fn new(window_secs: u64) -> Self {
        Self {
            window_secs: i64::try_from(window_secs).unwrap_or(i64::MAX),
        }
    }

    /// The response window.
    pub fn window(&self) -> Duration {
        Duration::try_seconds(self.window_secs).unwrap_or(Duration::MAX)
    }

    /// Whether the window anchored at `entered_at` has elapsed at `now`.
    /// Elapsed means `now - entered_at >= window`.
    pub fn has_elapsed(&self, entered_at: &Timestamp, now: &Timestamp) -> bool {
        now.elapsed_since(entered_at) >= self.window()
    }

    /// Seconds left in the window; zero once elapsed.
    pub fn remaining_secs(&self, entered_at: &Timestamp, now: &Timestamp) -> i64 {
        let remaining = self.window() - now.elapsed_since(entered_at);
        remaining.num_seconds().max(0)
    }

    /// When the window anchored at `entered_at` elapses.
    pub fn deadline(&self, entered_at: &Timestamp) -> Option<Timestamp> {
        entered_at.checked_add(self.window())
    }

    /// Require the window to have elapsed.
    ///
    /// # Errors
    ///
    /// [`EscrowError::TimeoutNotElapsed`] with the remaining seconds.
    pub fn require_elapsed(
        &self,
        proposal_id: ProposalId,
        entered_at: &Timestamp,
        now: &Timestamp,
    ) -> Result<(), EscrowError> {
        if self.has_elapsed(entered_at, now) {
            return Ok(());
        }
        Err(EscrowError::TimeoutNotElapsed {
            proposal_id,
            remaining_secs: self.remaining_secs(entered_at, now).max(1),
        })
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONSE_WINDOW_SECS)
    }
}
