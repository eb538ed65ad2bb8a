//! # Identity Newtypes
//!
//! Identifiers for the two things the escrow protocol names: the parties
//! that call it ([`AccountId`]) and the negotiations they open
//! ([`ProposalId`]).
//!
//! ## Trust Model
//!
//! The host ledger authenticates every caller before the state machine
//! sees the call. An [`AccountId`] is therefore an opaque token; the
//! state machine only ever compares two of them for equality. Whatever the
//! host's scheme is (address, public key fingerprint, session principal),
//! it is rendered into this type at the boundary.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MAX_ACCOUNT_ID_LEN: usize = 128;

/// An authenticated party identity as supplied by the host ledger.
///
/// # Validation
///
/// - 1 to 128 characters
/// - No whitespace or control characters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Create a validated account identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let s = id.into();
        let valid = !s.is_empty()
            && s.chars().count() <= MAX_ACCOUNT_ID_LEN
            && !s.chars().any(|c| c.is_whitespace() || c.is_control());
        if !valid {
            return Err(ValidationError::InvalidAccountId(s));
        }
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl FromStr for AccountId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A proposal identifier, assigned by the registry in strictly increasing
/// order starting at 1.
///
/// The value `0` is never allocated; a lookup of `ProposalId(0)` always
/// yields the uninitialized record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProposalId(u64);

impl ProposalId {
    /// Wrap a raw identifier value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw numeric value.
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The identifier that follows this one, or `None` on overflow.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl FromStr for ProposalId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(v) if v > 0 => Ok(Self(v)),
            _ => Err(ValidationError::InvalidProposalId(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_accepts_plain_tokens() {
        let id = AccountId::new("0xA11CE").unwrap();
        assert_eq!(id.as_str(), "0xA11CE");
        assert_eq!(id.to_string(), "0xA11CE");
    }

    #[test]
    fn account_id_rejects_empty() {
        assert!(matches!(
            AccountId::new(""),
            Err(ValidationError::InvalidAccountId(_))
        ));
    }

    #[test]
    fn account_id_rejects_whitespace() {
        assert!(AccountId::new("alice smith").is_err());
        assert!(AccountId::new("alice\n").is_err());
    }

    #[test]
    fn account_id_rejects_overlong() {
        let long = "a".repeat(MAX_ACCOUNT_ID_LEN + 1);
        assert!(AccountId::new(long).is_err());
        let max = "a".repeat(MAX_ACCOUNT_ID_LEN);
        assert!(AccountId::new(max).is_ok());
    }

    #[test]
    fn account_id_deserialization_validates() {
        let ok: AccountId = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(ok.as_str(), "bob");
        let bad: Result<AccountId, _> = serde_json::from_str("\"b o b\"");
        assert!(bad.is_err());
    }

    #[test]
    fn proposal_id_parses_positive_only() {
        assert_eq!("7".parse::<ProposalId>().unwrap(), ProposalId::new(7));
        assert!("0".parse::<ProposalId>().is_err());
        assert!("-1".parse::<ProposalId>().is_err());
        assert!("seven".parse::<ProposalId>().is_err());
    }

    #[test]
    fn proposal_id_next_is_monotonic() {
        let id = ProposalId::new(41);
        assert_eq!(id.next(), Some(ProposalId::new(42)));
        assert!(ProposalId::new(42) > id);
        assert_eq!(ProposalId::new(u64::MAX).next(), None);
    }

    #[test]
    fn proposal_id_serializes_as_number() {
        let json = serde_json::to_string(&ProposalId::new(3)).unwrap();
        assert_eq!(json, "3");
    }
}
