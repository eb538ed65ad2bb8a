//! # Transition Authority
//!
//! Caller and status guards run before any mutation. Each guard either
//! passes or returns the error that aborts the operation; none of them
//! mutate state.
//!
//! Guards run in a fixed order:
//!
//! 1. in-flight check ([`EscrowError::ReentrantCall`])
//! 2. caller is the party of record ([`EscrowError::Unauthorized`])
//! 3. status permits the operation ([`EscrowError::InvalidState`])
//!
//! An unknown proposal has no parties of record, so every caller fails
//! step 2 with `Unauthorized`.

use gigbond_core::AccountId;

use crate::error::EscrowError;
use crate::operation::{Operation, Party};
use crate::proposal::Proposal;

/// Reject calls on a proposal whose disbursing transition is in flight.
pub fn require_idle(operation: Operation, proposal: &Proposal) -> Result<(), EscrowError> {
    if proposal.is_in_flight() {
        tracing::debug!(%operation, proposal_id = %proposal.id, "reentrant call rejected");
        return Err(EscrowError::ReentrantCall {
            proposal_id: proposal.id,
            operation,
        });
    }
    Ok(())
}

/// Require `caller` to be the `party` of record on `proposal`.
pub fn require_party(
    operation: Operation,
    proposal: &Proposal,
    party: Party,
    caller: &AccountId,
) -> Result<(), EscrowError> {
    if proposal.party(party) != Some(caller) {
        tracing::debug!(%operation, proposal_id = %proposal.id, %caller, %party, "caller is not the party of record");
        return Err(EscrowError::Unauthorized {
            proposal_id: proposal.id,
            operation,
            caller: caller.clone(),
        });
    }
    Ok(())
}

/// Require the proposal's status to be one `operation` may start from.
pub fn require_status(operation: Operation, proposal: &Proposal) -> Result<(), EscrowError> {
    if !operation.allowed_from().contains(&proposal.status) {
        tracing::debug!(%operation, proposal_id = %proposal.id, status = %proposal.status, "operation not permitted in status");
        return Err(EscrowError::InvalidState {
            proposal_id: proposal.id,
            operation,
            status: proposal.status,
        });
    }
    Ok(())
}

/// Run every guard for `operation` on an existing proposal.
pub fn authorize(
    operation: Operation,
    proposal: &Proposal,
    caller: &AccountId,
) -> Result<(), EscrowError> {
    require_idle(operation, proposal)?;
    if let Some(party) = operation.required_party() {
        require_party(operation, proposal, party, caller)?;
    }
    require_status(operation, proposal)
}

/// Both recorded identities of an authorized proposal.
pub fn parties(
    operation: Operation,
    proposal: &Proposal,
) -> Result<(AccountId, AccountId), EscrowError> {
    match (&proposal.customer, &proposal.talent) {
        (Some(customer), Some(talent)) => Ok((customer.clone(), talent.clone())),
        _ => Err(EscrowError::InvalidState {
            proposal_id: proposal.id,
            operation,
            status: proposal.status,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gigbond_core::{Amount, ProposalId};

    use crate::status::ProposalStatus;

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn brief() -> Proposal {
        Proposal {
            id: ProposalId::new(1),
            customer: Some(acct("alice")),
            talent: Some(acct("bob")),
            customer_escrow: Amount::new(100),
            status: ProposalStatus::BriefSent,
            ..Proposal::default()
        }
    }

    #[test]
    fn talent_may_accept_brief() {
        assert!(authorize(Operation::AcceptBrief, &brief(), &acct("bob")).is_ok());
    }

    #[test]
    fn customer_may_not_accept_brief() {
        let err = authorize(Operation::AcceptBrief, &brief(), &acct("alice")).unwrap_err();
        assert!(matches!(err, EscrowError::Unauthorized { .. }));
    }

    #[test]
    fn caller_checked_before_status() {
        // Wrong caller AND wrong status: the caller error wins.
        let err = authorize(Operation::AcceptProposal, &brief(), &acct("mallory")).unwrap_err();
        assert!(matches!(err, EscrowError::Unauthorized { .. }));
    }

    #[test]
    fn status_checked_for_rightful_caller() {
        let err = authorize(Operation::AcceptProposal, &brief(), &acct("alice")).unwrap_err();
        assert!(matches!(
            err,
            EscrowError::InvalidState {
                status: ProposalStatus::BriefSent,
                ..
            }
        ));
    }

    #[test]
    fn unknown_proposal_is_unauthorized_for_everyone() {
        let missing = Proposal::default();
        let err = authorize(Operation::ProcessTimeout, &missing, &acct("alice")).unwrap_err();
        assert!(matches!(err, EscrowError::Unauthorized { .. }));
    }

    #[test]
    fn in_flight_rejected_first() {
        let mut p = brief();
        p.in_flight = true;
        let err = authorize(Operation::AcceptBrief, &p, &acct("bob")).unwrap_err();
        assert!(matches!(err, EscrowError::ReentrantCall { .. }));
    }

    #[test]
    fn cancel_by_customer_from_both_open_statuses() {
        let mut p = brief();
        assert!(authorize(Operation::CancelByCustomer, &p, &acct("alice")).is_ok());
        p.status = ProposalStatus::ProposalSent;
        assert!(authorize(Operation::CancelByCustomer, &p, &acct("alice")).is_ok());
        p.status = ProposalStatus::Accepted;
        assert!(authorize(Operation::CancelByCustomer, &p, &acct("alice")).is_err());
    }
}
