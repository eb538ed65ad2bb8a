//! # Proposal Status
//!
//! The finite set of states a negotiation can occupy and the edges between
//! them. Status only ever advances along [`ProposalStatus::valid_transitions`];
//! terminal statuses have no outgoing edges, and nothing leads back to
//! [`ProposalStatus::None`].

use serde::{Deserialize, Serialize};

/// Lifecycle status of a proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// No proposal exists under this identifier.
    #[default]
    #[serde(rename = "NONE")]
    None,
    /// Customer has deposited and is waiting for the talent.
    #[serde(rename = "BRIEF_SENT")]
    BriefSent,
    /// Talent has deposited and is waiting for the customer.
    #[serde(rename = "PROPOSAL_SENT")]
    ProposalSent,
    /// Both deposits returned. Terminal.
    #[serde(rename = "ACCEPTED")]
    Accepted,
    /// Talent never answered the brief. Terminal.
    #[serde(rename = "REJECTED")]
    Rejected,
    /// Customer withdrew. Terminal.
    #[serde(rename = "CANCELLED_BY_CUSTOMER")]
    CancelledByCustomer,
    /// Talent withdrew after committing. Terminal.
    #[serde(rename = "CANCELLED_BY_TALENT")]
    CancelledByTalent,
}

impl ProposalStatus {
    /// All statuses, in declaration order.
    pub const ALL: [ProposalStatus; 7] = [
        Self::None,
        Self::BriefSent,
        Self::ProposalSent,
        Self::Accepted,
        Self::Rejected,
        Self::CancelledByCustomer,
        Self::CancelledByTalent,
    ];

    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::BriefSent => "BRIEF_SENT",
            Self::ProposalSent => "PROPOSAL_SENT",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::CancelledByCustomer => "CANCELLED_BY_CUSTOMER",
            Self::CancelledByTalent => "CANCELLED_BY_TALENT",
        }
    }

    /// Convert a canonical status name back to a `ProposalStatus`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// Whether no operation may mutate a proposal in this status again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::Rejected | Self::CancelledByCustomer | Self::CancelledByTalent
        )
    }

    /// Whether a proposal record exists in this status.
    pub fn exists(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Return the set of valid target statuses from this status.
    pub fn valid_transitions(&self) -> &'static [ProposalStatus] {
        match self {
            Self::None => &[Self::BriefSent],
            Self::BriefSent => &[
                Self::ProposalSent,
                Self::CancelledByCustomer,
                Self::Rejected,
            ],
            Self::ProposalSent => &[
                Self::Accepted,
                Self::CancelledByTalent,
                Self::CancelledByCustomer,
            ],
            Self::Accepted
            | Self::Rejected
            | Self::CancelledByCustomer
            | Self::CancelledByTalent => &[],
        }
    }

    /// Whether `to` is a direct successor of this status.
    pub fn can_transition_to(&self, to: ProposalStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_have_no_successors() {
        for status in ProposalStatus::ALL {
            assert_eq!(
                status.is_terminal(),
                status.valid_transitions().is_empty(),
                "{status}"
            );
        }
    }

    #[test]
    fn nothing_returns_to_none() {
        for status in ProposalStatus::ALL {
            assert!(!status.can_transition_to(ProposalStatus::None));
        }
    }

    #[test]
    fn name_round_trip() {
        for status in ProposalStatus::ALL {
            assert_eq!(ProposalStatus::from_name(status.as_str()), Some(status));
        }
        assert_eq!(ProposalStatus::from_name("OPEN"), None);
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&ProposalStatus::CancelledByTalent).unwrap();
        assert_eq!(json, "\"CANCELLED_BY_TALENT\"");
    }

    #[test]
    fn default_is_none() {
        assert_eq!(ProposalStatus::default(), ProposalStatus::None);
        assert!(!ProposalStatus::None.exists());
    }
}
