//! # Call Context
//!
//! The authentication context the host ledger injects into every
//! operation: who is calling, how much value rides on the call, and what
//! time the host says it is. The state machine trusts all three.

use serde::{Deserialize, Serialize};

use gigbond_core::{AccountId, Amount, Timestamp};

/// Host-supplied facts about a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The authenticated caller.
    pub caller: AccountId,
    /// Value atomically attached to the call and already credited to
    /// custody by the host.
    pub attached_value: Amount,
    /// Host clock reading, monotonic non-decreasing across calls.
    pub now: Timestamp,
}

impl CallContext {
    /// A call carrying value.
    pub fn new(caller: AccountId, attached_value: Amount, now: Timestamp) -> Self {
        Self {
            caller,
            attached_value,
            now,
        }
    }

    /// A call carrying no value.
    pub fn without_value(caller: AccountId, now: Timestamp) -> Self {
        Self::new(caller, Amount::ZERO, now)
    }
}
