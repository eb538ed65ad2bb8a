//! # Escrow Error Types
//!
//! Every failed operation aborts with one of these variants and leaves the
//! proposal's status and escrow fields exactly as they were before the
//! call. No event is emitted for a failed call.
//!
//! Caller mistakes ([`Unauthorized`](EscrowError::Unauthorized),
//! [`InvalidState`](EscrowError::InvalidState),
//! [`ZeroDeposit`](EscrowError::ZeroDeposit),
//! [`TimeoutNotElapsed`](EscrowError::TimeoutNotElapsed),
//! [`ReentrantCall`](EscrowError::ReentrantCall)) are distinguished from
//! accounting faults that indicate a bug
//! ([`InsufficientCustodyBalance`](EscrowError::InsufficientCustodyBalance),
//! [`AccountingOverflow`](EscrowError::AccountingOverflow)) and from
//! recipient-side failures ([`TransferFailed`](EscrowError::TransferFailed)).

use thiserror::Error;

use gigbond_core::{AccountId, Amount, CanonicalizationError, ProposalId};

use crate::operation::Operation;
use crate::status::ProposalStatus;
use crate::transfer::PaymentFailure;

/// Errors arising from escrow operations.
#[derive(Error, Debug)]
pub enum EscrowError {
    /// The caller is not the party of record for this operation.
    #[error("{caller} is not authorized to {operation} proposal {proposal_id}")]
    Unauthorized {
        /// The proposal acted on.
        proposal_id: ProposalId,
        /// The attempted operation.
        operation: Operation,
        /// The authenticated caller.
        caller: AccountId,
    },

    /// The operation is not permitted from the proposal's current status.
    #[error("cannot {operation} proposal {proposal_id} in status {status}")]
    InvalidState {
        /// The proposal acted on.
        proposal_id: ProposalId,
        /// The attempted operation.
        operation: Operation,
        /// The status at the time of the call.
        status: ProposalStatus,
    },

    /// A deposit was required but no value was attached.
    #[error("{operation} requires a non-zero deposit")]
    ZeroDeposit {
        /// The attempted operation.
        operation: Operation,
    },

    /// The response window has not yet elapsed.
    #[error("response window for proposal {proposal_id} has {remaining_secs}s remaining")]
    TimeoutNotElapsed {
        /// The proposal acted on.
        proposal_id: ProposalId,
        /// Seconds until the window elapses.
        remaining_secs: i64,
    },

    /// Custody holds less than a payment requires. Unreachable while the
    /// solvency invariant holds; indicates an accounting bug.
    #[error("custody balance {available} is insufficient for {required}")]
    InsufficientCustodyBalance {
        /// The amount needed.
        required: Amount,
        /// The amount actually held.
        available: Amount,
    },

    /// The recipient did not accept an outbound payment.
    #[error("transfer of {amount} to {recipient} failed: {source}")]
    TransferFailed {
        /// The intended recipient.
        recipient: AccountId,
        /// The amount that could not be delivered.
        amount: Amount,
        /// The host's failure report.
        #[source]
        source: PaymentFailure,
    },

    /// Another operation on this proposal is still in flight.
    #[error("reentrant {operation} on proposal {proposal_id} rejected: a transition is in flight")]
    ReentrantCall {
        /// The proposal acted on.
        proposal_id: ProposalId,
        /// The attempted operation.
        operation: Operation,
    },

    /// Escrow totals or identifiers would overflow.
    #[error("accounting overflow during {operation}")]
    AccountingOverflow {
        /// The attempted operation.
        operation: Operation,
    },

    /// Event digest computation failed.
    #[error("event canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

impl EscrowError {
    /// Whether this error signals an internal accounting fault rather than
    /// a caller mistake or an external refusal.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::InsufficientCustodyBalance { .. }
                | Self::AccountingOverflow { .. }
                | Self::Canonicalization(_)
        )
    }
}
