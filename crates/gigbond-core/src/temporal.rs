//! # Time
//!
//! The host ledger stamps every call with one [`Timestamp`]. Proposals keep
//! the stamp of the call that moved them into their current stage, and the
//! response window is measured from that anchor.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Point in time, always UTC. Renders as `2026-01-15T12:00:00Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wall-clock now.
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// Wrap an existing UTC datetime.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        dt.into()
    }

    /// `None` when `secs` lies outside chrono's range.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self)
    }

    /// Underlying chrono value.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// How long after `earlier` this instant falls. Clamped to zero when
    /// `earlier` is actually the later of the two.
    pub fn elapsed_since(&self, earlier: &Timestamp) -> Duration {
        self.0
            .signed_duration_since(earlier.0)
            .max(Duration::zero())
    }

    /// Shift forward by `duration`; `None` on overflow.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        self.0.checked_add_signed(duration).map(Self)
    }

    /// Whole-second RFC 3339 rendering with a `Z` suffix.
    pub fn to_canonical_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl FromStr for Timestamp {
    type Err = ValidationError;

    /// Accepts RFC 3339 with any offset, or a bare count of unix seconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rejected = |detail: String| ValidationError::InvalidTimestamp {
            input: s.to_owned(),
            detail,
        };
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            let secs: i64 = s.parse().map_err(|e| rejected(format!("{e}")))?;
            return Self::from_unix_secs(secs)
                .ok_or_else(|| rejected("outside the representable range".to_owned()));
        }
        let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| rejected(e.to_string()))?;
        Ok(Self(parsed.with_timezone(&Utc)))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
