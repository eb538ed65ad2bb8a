//! # Proposal Registry
//!
//! Owns the mapping from [`ProposalId`] to [`Proposal`] and the identifier
//! sequence. Identifiers are allocated in strictly increasing order from 1
//! and are never reused; records are never removed, so terminal proposals
//! stay available for audit and replay.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gigbond_core::{AccountId, Amount, ProposalId, Timestamp};

use crate::error::EscrowError;
use crate::ledger::EscrowLedger;
use crate::operation::{Operation, Party};
use crate::proposal::Proposal;
use crate::status::ProposalStatus;

/// Storage for every proposal ever created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRegistry {
    last_id: ProposalId,
    proposals: BTreeMap<ProposalId, Proposal>,
}

impl ProposalRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a proposal in [`ProposalStatus::BriefSent`] holding
    /// `deposit` on the customer side.
    ///
    /// # Errors
    ///
    /// [`EscrowError::ZeroDeposit`] if `deposit` is zero;
    /// [`EscrowError::AccountingOverflow`] if the id sequence or the escrow
    /// total would overflow. Nothing is allocated on error.
    pub fn create(
        &mut self,
        ledger: &mut EscrowLedger,
        customer: AccountId,
        talent: AccountId,
        deposit: Amount,
        now: Timestamp,
    ) -> Result<ProposalId, EscrowError> {
        let proposal = self.prepare(ledger, customer, talent, deposit, now)?;
        let id = proposal.id;
        self.insert(proposal);
        Ok(id)
    }

    /// Build the record `create` would store, crediting the deposit to
    /// `ledger`, without allocating the identifier.
    pub(crate) fn prepare(
        &self,
        ledger: &mut EscrowLedger,
        customer: AccountId,
        talent: AccountId,
        deposit: Amount,
        now: Timestamp,
    ) -> Result<Proposal, EscrowError> {
        if deposit.is_zero() {
            return Err(EscrowError::ZeroDeposit {
                operation: Operation::SendBrief,
            });
        }
        let id = self.last_id.next().ok_or(EscrowError::AccountingOverflow {
            operation: Operation::SendBrief,
        })?;

        let mut proposal = Proposal {
            id,
            customer: Some(customer),
            talent: Some(talent),
            created_at: Some(now),
            stage_entered_at: Some(now),
            status: ProposalStatus::BriefSent,
            ..Proposal::default()
        };
        ledger.deposit(&mut proposal, Party::Customer, deposit, Operation::SendBrief)?;
        Ok(proposal)
    }

    /// Store a prepared record and advance the id sequence to it.
    pub(crate) fn insert(&mut self, proposal: Proposal) {
        self.last_id = self.last_id.max(proposal.id);
        self.proposals.insert(proposal.id, proposal);
    }

    /// Look up a proposal. Unknown identifiers yield the uninitialized
    /// record (status [`ProposalStatus::None`]) rather than an error.
    pub fn get(&self, id: ProposalId) -> Proposal {
        self.proposals.get(&id).cloned().unwrap_or_else(|| Proposal {
            id,
            ..Proposal::default()
        })
    }

    pub(crate) fn get_mut(&mut self, id: ProposalId) -> Option<&mut Proposal> {
        self.proposals.get_mut(&id)
    }

    /// The most recently allocated identifier (`0` if none).
    pub fn last_id(&self) -> ProposalId {
        self.last_id
    }

    /// Iterate over all proposals in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Number of proposals ever created.
    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    /// Whether no proposal has been created.
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn t0() -> Timestamp {
        "2026-05-01T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn create_allocates_increasing_ids() {
        let mut reg = ProposalRegistry::new();
        let mut ledger = EscrowLedger::new();
        let a = reg
            .create(&mut ledger, acct("c"), acct("t"), Amount::new(10), t0())
            .unwrap();
        let b = reg
            .create(&mut ledger, acct("c"), acct("t"), Amount::new(20), t0())
            .unwrap();
        assert_eq!(a, ProposalId::new(1));
        assert_eq!(b, ProposalId::new(2));
        assert_eq!(reg.last_id(), b);
        assert_eq!(ledger.total_escrowed(), Amount::new(30));
    }

    #[test]
    fn create_records_brief_sent() {
        let mut reg = ProposalRegistry::new();
        let mut ledger = EscrowLedger::new();
        let id = reg
            .create(&mut ledger, acct("c"), acct("t"), Amount::new(100), t0())
            .unwrap();
        let p = reg.get(id);
        assert_eq!(p.status, ProposalStatus::BriefSent);
        assert_eq!(p.customer_escrow, Amount::new(100));
        assert!(p.talent_escrow.is_zero());
        assert_eq!(p.stage_entered_at, Some(t0()));
        assert_eq!(p.talent, Some(acct("t")));
    }

    #[test]
    fn zero_deposit_allocates_nothing() {
        let mut reg = ProposalRegistry::new();
        let mut ledger = EscrowLedger::new();
        let err = reg
            .create(&mut ledger, acct("c"), acct("t"), Amount::ZERO, t0())
            .unwrap_err();
        assert!(matches!(err, EscrowError::ZeroDeposit { .. }));
        assert!(reg.is_empty());
        assert_eq!(reg.last_id(), ProposalId::new(0));
    }

    #[test]
    fn unknown_id_yields_default_record() {
        let reg = ProposalRegistry::new();
        let p = reg.get(ProposalId::new(99));
        assert_eq!(p.id, ProposalId::new(99));
        assert_eq!(p.status, ProposalStatus::None);
        assert_eq!(p.customer, None);
    }
}
