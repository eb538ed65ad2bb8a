//! # Replay
//!
//! Rebuilds every proposal's status and escrow fields from the event log
//! alone. An observer holding only the log can therefore audit the
//! contract's state: [`ProposalProjection::replay`] over
//! [`EscrowContract::events`](crate::EscrowContract::events) must agree
//! with [`EscrowContract::proposals`](crate::EscrowContract::proposals).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gigbond_core::{AccountId, Amount, ProposalId};

use crate::event::{EscrowEvent, EventRecord};
use crate::operation::Operation;
use crate::proposal::Proposal;
use crate::status::ProposalStatus;

/// A proposal as reconstructed from events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedProposal {
    pub customer: AccountId,
    pub talent: AccountId,
    pub status: ProposalStatus,
    pub customer_escrow: Amount,
    pub talent_escrow: Amount,
}

impl ProjectedProposal {
    /// Whether this projection agrees with a stored record.
    pub fn matches(&self, proposal: &Proposal) -> bool {
        proposal.customer.as_ref() == Some(&self.customer)
            && proposal.talent.as_ref() == Some(&self.talent)
            && proposal.status == self.status
            && proposal.customer_escrow == self.customer_escrow
            && proposal.talent_escrow == self.talent_escrow
    }
}

/// Errors from replaying an inconsistent log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// An event refers to a proposal no earlier event created.
    #[error("event {sequence} refers to unknown proposal {proposal_id}")]
    UnknownProposal {
        sequence: u64,
        proposal_id: ProposalId,
    },
    /// An event implies a transition the status graph forbids.
    #[error("event {sequence} ({operation}) cannot move proposal {proposal_id} from {from}")]
    InvalidTransition {
        sequence: u64,
        proposal_id: ProposalId,
        operation: Operation,
        from: ProposalStatus,
    },
}

/// Every proposal reconstructed from a log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalProjection {
    proposals: BTreeMap<ProposalId, ProjectedProposal>,
}

impl ProposalProjection {
    /// Fold `records` in order.
    pub fn replay(records: &[EventRecord]) -> Result<Self, ReplayError> {
        let mut projection = Self::default();
        for record in records {
            projection.apply(record)?;
        }
        Ok(projection)
    }

    /// The projected proposal, if any event created it.
    pub fn get(&self, id: ProposalId) -> Option<&ProjectedProposal> {
        self.proposals.get(&id)
    }

    /// All projected proposals in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&ProposalId, &ProjectedProposal)> {
        self.proposals.iter()
    }

    /// Number of proposals seen in the log.
    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    /// True when the log opened no proposals.
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Sum of all projected escrow fields, or `None` on overflow.
    pub fn total_escrowed(&self) -> Option<Amount> {
        Amount::checked_sum(
            self.proposals
                .values()
                .flat_map(|p| [p.customer_escrow, p.talent_escrow]),
        )
    }

    /// Whether the projection agrees with every record in `proposals`,
    /// and covers no others.
    pub fn agrees_with<'a>(&self, proposals: impl IntoIterator<Item = &'a Proposal>) -> bool {
        let mut seen = 0;
        for proposal in proposals {
            match self.proposals.get(&proposal.id) {
                Some(projected) if projected.matches(proposal) => seen += 1,
                _ => return false,
            }
        }
        seen == self.proposals.len()
    }

    fn apply(&mut self, record: &EventRecord) -> Result<(), ReplayError> {
        let sequence = record.sequence;
        let operation = record.event.operation();

        if let EscrowEvent::BriefSent {
            proposal_id,
            customer,
            talent,
            amount,
            ..
        } = &record.event
        {
            if self.proposals.contains_key(proposal_id) {
                return Err(ReplayError::InvalidTransition {
                    sequence,
                    proposal_id: *proposal_id,
                    operation,
                    from: ProposalStatus::BriefSent,
                });
            }
            self.proposals.insert(
                *proposal_id,
                ProjectedProposal {
                    customer: customer.clone(),
                    talent: talent.clone(),
                    status: ProposalStatus::BriefSent,
                    customer_escrow: *amount,
                    talent_escrow: Amount::ZERO,
                },
            );
            return Ok(());
        }

        let Some(proposal_id) = record.event.proposal_id() else {
            // Unexpected deposits touch no proposal.
            return Ok(());
        };
        let projected = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(ReplayError::UnknownProposal {
                sequence,
                proposal_id,
            })?;

        let invalid = ReplayError::InvalidTransition {
            sequence,
            proposal_id,
            operation,
            from: projected.status,
        };
        let target = operation.target_status().ok_or(invalid.clone())?;
        if !projected.status.can_transition_to(target)
            || !operation.allowed_from().contains(&projected.status)
        {
            return Err(invalid);
        }

        match &record.event {
            EscrowEvent::BriefAccepted { amount, .. } => projected.talent_escrow = *amount,
            EscrowEvent::ProposalAccepted { .. } => {
                projected.customer_escrow = Amount::ZERO;
                projected.talent_escrow = Amount::ZERO;
            }
            EscrowEvent::CancelledByCustomer { .. } | EscrowEvent::BriefTimedOut { .. } => {
                projected.customer_escrow = Amount::ZERO;
            }
            EscrowEvent::CancelledByTalent { .. } => projected.talent_escrow = Amount::ZERO,
            EscrowEvent::BriefSent { .. } | EscrowEvent::UnexpectedDeposit { .. } => {}
        }
        projected.status = target;
        Ok(())
    }
}
