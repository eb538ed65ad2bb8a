//! Operation and party names shared by the authority table, the error
//! hierarchy and the event log.

use serde::{Deserialize, Serialize};

use crate::status::ProposalStatus;

/// One of the two roles recorded on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// The party that sent the brief and funded the first deposit.
    Customer,
    /// The party the brief was addressed to.
    Talent,
}

impl Party {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Talent => "talent",
        }
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every externally callable operation on the escrow contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Customer opens a proposal with a deposit.
    SendBrief,
    /// Talent commits with a counter-deposit.
    AcceptBrief,
    /// Customer accepts the talent's proposal; both deposits are returned.
    AcceptProposal,
    /// Customer withdraws; forfeits to the talent once the talent has committed.
    CancelByCustomer,
    /// Talent withdraws after committing; forfeits to the customer.
    CancelByTalent,
    /// Customer reclaims the deposit after the response window lapses.
    ProcessTimeout,
    /// Value arrived without an operation.
    Receive,
}

impl Operation {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendBrief => "send_brief",
            Self::AcceptBrief => "accept_brief",
            Self::AcceptProposal => "accept_proposal",
            Self::CancelByCustomer => "cancel_by_customer",
            Self::CancelByTalent => "cancel_by_talent",
            Self::ProcessTimeout => "process_timeout",
            Self::Receive => "receive",
        }
    }

    /// The role that must invoke this operation on an existing proposal.
    ///
    /// `None` for operations that do not act on a proposal of record.
    pub fn required_party(&self) -> Option<Party> {
        match self {
            Self::AcceptBrief | Self::CancelByTalent => Some(Party::Talent),
            Self::AcceptProposal | Self::CancelByCustomer | Self::ProcessTimeout => {
                Some(Party::Customer)
            }
            Self::SendBrief | Self::Receive => None,
        }
    }

    /// The statuses from which this operation may be invoked.
    pub fn allowed_from(&self) -> &'static [ProposalStatus] {
        match self {
            Self::SendBrief => &[ProposalStatus::None],
            Self::AcceptBrief | Self::ProcessTimeout => &[ProposalStatus::BriefSent],
            Self::AcceptProposal | Self::CancelByTalent => &[ProposalStatus::ProposalSent],
            Self::CancelByCustomer => &[ProposalStatus::BriefSent, ProposalStatus::ProposalSent],
            Self::Receive => &[],
        }
    }

    /// The status this operation moves a proposal into.
    pub fn target_status(&self) -> Option<ProposalStatus> {
        match self {
            Self::SendBrief => Some(ProposalStatus::BriefSent),
            Self::AcceptBrief => Some(ProposalStatus::ProposalSent),
            Self::AcceptProposal => Some(ProposalStatus::Accepted),
            Self::CancelByCustomer => Some(ProposalStatus::CancelledByCustomer),
            Self::CancelByTalent => Some(ProposalStatus::CancelledByTalent),
            Self::ProcessTimeout => Some(ProposalStatus::Rejected),
            Self::Receive => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Operation; 7] = [
        Operation::SendBrief,
        Operation::AcceptBrief,
        Operation::AcceptProposal,
        Operation::CancelByCustomer,
        Operation::CancelByTalent,
        Operation::ProcessTimeout,
        Operation::Receive,
    ];

    #[test]
    fn every_target_is_a_valid_edge_from_every_allowed_status() {
        for op in ALL {
            let Some(target) = op.target_status() else {
                continue;
            };
            for from in op.allowed_from() {
                assert!(
                    from.can_transition_to(target),
                    "{op}: {from} → {target} missing from the status graph"
                );
            }
        }
    }

    #[test]
    fn talent_operations() {
        assert_eq!(Operation::AcceptBrief.required_party(), Some(Party::Talent));
        assert_eq!(Operation::CancelByTalent.required_party(), Some(Party::Talent));
    }

    #[test]
    fn customer_operations() {
        for op in [
            Operation::AcceptProposal,
            Operation::CancelByCustomer,
            Operation::ProcessTimeout,
        ] {
            assert_eq!(op.required_party(), Some(Party::Customer), "{op}");
        }
    }

    #[test]
    fn operation_names_are_snake_case() {
        let json = serde_json::to_string(&Operation::CancelByCustomer).unwrap();
        assert_eq!(json, "\"cancel_by_customer\"");
        assert_eq!(Operation::CancelByCustomer.as_str(), "cancel_by_customer");
    }
}
