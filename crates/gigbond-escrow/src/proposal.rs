//! # Proposal Record
//!
//! One record per negotiation. Identities are fixed at creation; the
//! talent is named by the customer before the talent ever acts. Escrow
//! fields are written only through [`EscrowLedger`](crate::ledger::EscrowLedger).

use serde::{Deserialize, Serialize};

use gigbond_core::{AccountId, Amount, ProposalId, Timestamp};

use crate::operation::Party;
use crate::status::ProposalStatus;

/// A customer–talent negotiation and the deposits held against it.
///
/// The default value is the uninitialized record returned for unknown
/// identifiers: status [`ProposalStatus::None`], no parties, zero escrow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Registry-assigned identifier.
    pub id: ProposalId,
    /// The party that sent the brief.
    pub customer: Option<AccountId>,
    /// The party the brief was addressed to.
    pub talent: Option<AccountId>,
    /// Value custodied on behalf of the customer.
    pub customer_escrow: Amount,
    /// Value custodied on behalf of the talent.
    pub talent_escrow: Amount,
    /// When the proposal was created.
    pub created_at: Option<Timestamp>,
    /// When the current status was entered. Anchor for the response window.
    pub stage_entered_at: Option<Timestamp>,
    /// Current lifecycle status.
    pub status: ProposalStatus,
    /// Set while a disbursing transition has released the state lock to
    /// perform transfers. Never persisted.
    #[serde(skip)]
    pub(crate) in_flight: bool,
}

impl Proposal {
    /// Whether a proposal exists under this record's identifier.
    pub fn exists(&self) -> bool {
        self.status.exists()
    }

    /// Whether a disbursing transition on this proposal is in progress.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// The identity recorded for `party`, if any.
    pub fn party(&self, party: Party) -> Option<&AccountId> {
        match party {
            Party::Customer => self.customer.as_ref(),
            Party::Talent => self.talent.as_ref(),
        }
    }

    /// The escrow currently held for `party`.
    pub fn escrow_of(&self, party: Party) -> Amount {
        match party {
            Party::Customer => self.customer_escrow,
            Party::Talent => self.talent_escrow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_uninitialized() {
        let p = Proposal::default();
        assert!(!p.exists());
        assert_eq!(p.customer, None);
        assert_eq!(p.talent, None);
        assert!(p.customer_escrow.is_zero());
        assert!(p.talent_escrow.is_zero());
        assert!(!p.is_in_flight());
    }

    #[test]
    fn in_flight_is_not_serialized() {
        let p = Proposal {
            in_flight: true,
            ..Proposal::default()
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(!json.contains("in_flight"));
        let back: Proposal = serde_json::from_str(&json).unwrap();
        assert!(!back.is_in_flight());
    }

    #[test]
    fn party_accessors() {
        let p = Proposal {
            customer: Some(AccountId::new("alice").unwrap()),
            talent: Some(AccountId::new("bob").unwrap()),
            customer_escrow: Amount::new(100),
            talent_escrow: Amount::new(50),
            ..Proposal::default()
        };
        assert_eq!(p.party(Party::Talent).map(AccountId::as_str), Some("bob"));
        assert_eq!(p.escrow_of(Party::Customer), Amount::new(100));
        assert_eq!(p.escrow_of(Party::Talent), Amount::new(50));
    }
}
