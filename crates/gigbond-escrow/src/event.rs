//! # Event Log
//!
//! Every committed transition appends one [`EventRecord`] for off-chain
//! observers. Records are append-only and hash-chained: each record's
//! digest covers its sequence number, its event and the previous record's
//! digest, so any edit or reordering is detected by
//! [`EventLog::verify_chain`]. The state machine never reads the log to
//! make decisions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gigbond_core::{
    sha256_digest, AccountId, Amount, CanonicalBytes, CanonicalizationError, ContentDigest,
    ProposalId, Timestamp,
};

use crate::operation::Operation;

/// An observable state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EscrowEvent {
    /// A proposal was created with the customer's deposit.
    BriefSent {
        /// The new proposal.
        proposal_id: ProposalId,
        /// The customer.
        customer: AccountId,
        /// The talent named in the brief.
        talent: AccountId,
        /// The customer's deposit.
        amount: Amount,
        /// Host time of the call.
        at: Timestamp,
    },
    /// The talent committed a counter-deposit.
    BriefAccepted {
        /// The proposal.
        proposal_id: ProposalId,
        /// The customer.
        customer: AccountId,
        /// The talent.
        talent: AccountId,
        /// The talent's deposit.
        amount: Amount,
        /// Host time of the call.
        at: Timestamp,
    },
    /// The customer accepted; both deposits went back to their owners.
    ProposalAccepted {
        /// The proposal.
        proposal_id: ProposalId,
        /// The customer.
        customer: AccountId,
        /// The talent.
        talent: AccountId,
        /// Returned to the customer.
        customer_refund: Amount,
        /// Returned to the talent.
        talent_refund: Amount,
        /// Host time of the call.
        at: Timestamp,
    },
    /// The customer withdrew.
    CancelledByCustomer {
        /// The proposal.
        proposal_id: ProposalId,
        /// The customer.
        customer: AccountId,
        /// The talent.
        talent: AccountId,
        /// The customer's released deposit.
        amount: Amount,
        /// Whether the deposit was forfeited to the talent rather than
        /// refunded.
        compensated_talent: bool,
        /// Host time of the call.
        at: Timestamp,
    },
    /// The talent withdrew after committing; its deposit went to the customer.
    CancelledByTalent {
        /// The proposal.
        proposal_id: ProposalId,
        /// The customer.
        customer: AccountId,
        /// The talent.
        talent: AccountId,
        /// The talent's forfeited deposit.
        amount: Amount,
        /// Host time of the call.
        at: Timestamp,
    },
    /// The response window lapsed; the customer reclaimed the deposit.
    BriefTimedOut {
        /// The proposal.
        proposal_id: ProposalId,
        /// The customer.
        customer: AccountId,
        /// The talent.
        talent: AccountId,
        /// The refunded deposit.
        amount: Amount,
        /// Host time of the call.
        at: Timestamp,
    },
    /// Value arrived outside any operation.
    UnexpectedDeposit {
        /// The sender.
        from: AccountId,
        /// The amount received.
        amount: Amount,
        /// Host time of the call.
        at: Timestamp,
    },
}

impl EscrowEvent {
    /// The operation that produced this event.
    pub fn operation(&self) -> Operation {
        match self {
            Self::BriefSent { .. } => Operation::SendBrief,
            Self::BriefAccepted { .. } => Operation::AcceptBrief,
            Self::ProposalAccepted { .. } => Operation::AcceptProposal,
            Self::CancelledByCustomer { .. } => Operation::CancelByCustomer,
            Self::CancelledByTalent { .. } => Operation::CancelByTalent,
            Self::BriefTimedOut { .. } => Operation::ProcessTimeout,
            Self::UnexpectedDeposit { .. } => Operation::Receive,
        }
    }

    /// The proposal this event concerns, if any.
    pub fn proposal_id(&self) -> Option<ProposalId> {
        match self {
            Self::BriefSent { proposal_id, .. }
            | Self::BriefAccepted { proposal_id, .. }
            | Self::ProposalAccepted { proposal_id, .. }
            | Self::CancelledByCustomer { proposal_id, .. }
            | Self::CancelledByTalent { proposal_id, .. }
            | Self::BriefTimedOut { proposal_id, .. } => Some(*proposal_id),
            Self::UnexpectedDeposit { .. } => None,
        }
    }

    /// Host time at which the event was produced.
    pub fn at(&self) -> Timestamp {
        match self {
            Self::BriefSent { at, .. }
            | Self::BriefAccepted { at, .. }
            | Self::ProposalAccepted { at, .. }
            | Self::CancelledByCustomer { at, .. }
            | Self::CancelledByTalent { at, .. }
            | Self::BriefTimedOut { at, .. }
            | Self::UnexpectedDeposit { at, .. } => *at,
        }
    }
}

/// A sequenced, hash-chained event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, from 0.
    pub sequence: u64,
    /// The event.
    pub event: EscrowEvent,
    /// Digest of the preceding record; `None` for the first.
    pub prev_digest: Option<ContentDigest>,
    /// Digest over `sequence`, `event` and `prev_digest`.
    pub digest: ContentDigest,
}

#[derive(Serialize)]
struct ChainPayload<'a> {
    sequence: u64,
    event: &'a EscrowEvent,
    prev_digest: Option<&'a ContentDigest>,
}

fn chain_digest(
    sequence: u64,
    event: &EscrowEvent,
    prev_digest: Option<&ContentDigest>,
) -> Result<ContentDigest, CanonicalizationError> {
    let payload = ChainPayload {
        sequence,
        event,
        prev_digest,
    };
    Ok(sha256_digest(&CanonicalBytes::new(&payload)?))
}

/// A break in the hash chain.
#[derive(Error, Debug)]
pub enum ChainError {
    /// A record's sequence number is not its position.
    #[error("record at position {position} has sequence {sequence}")]
    SequenceGap {
        /// Position in the log.
        position: u64,
        /// Sequence the record claims.
        sequence: u64,
    },
    /// A record does not link to its predecessor.
    #[error("record {sequence} does not link to its predecessor")]
    BrokenLink {
        /// The offending record.
        sequence: u64,
    },
    /// A record's digest does not match its contents.
    #[error("record {sequence} digest mismatch: stored {stored}, computed {computed}")]
    DigestMismatch {
        /// The offending record.
        sequence: u64,
        /// The digest stored on the record.
        stored: ContentDigest,
        /// The digest recomputed from its contents.
        computed: ContentDigest,
    },
    /// The record could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Append-only, hash-chained event log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, chaining it to the current head.
    pub fn append(&mut self, event: EscrowEvent) -> Result<&EventRecord, CanonicalizationError> {
        let sequence = self.records.len() as u64;
        let prev_digest = self.head().cloned();
        let digest = chain_digest(sequence, &event, prev_digest.as_ref())?;
        self.records.push(EventRecord {
            sequence,
            event,
            prev_digest,
            digest,
        });
        // Just pushed; the vector is non-empty.
        Ok(&self.records[self.records.len() - 1])
    }

    /// Digest of the most recent record.
    pub fn head(&self) -> Option<&ContentDigest> {
        self.records.last().map(|r| &r.digest)
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `sequence >= from`.
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    /// Records concerning one proposal, oldest first.
    pub fn for_proposal(&self, id: ProposalId) -> impl Iterator<Item = &EventRecord> {
        self.records
            .iter()
            .filter(move |r| r.event.proposal_id() == Some(id))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recompute every digest and link.
    ///
    /// # Errors
    ///
    /// The first [`ChainError`] found, scanning from the oldest record.
    pub fn verify_chain(&self) -> Result<(), ChainError> {
        let mut prev: Option<&ContentDigest> = None;
        for (position, record) in self.records.iter().enumerate() {
            let position = position as u64;
            if record.sequence != position {
                return Err(ChainError::SequenceGap {
                    position,
                    sequence: record.sequence,
                });
            }
            if record.prev_digest.as_ref() != prev {
                return Err(ChainError::BrokenLink {
                    sequence: record.sequence,
                });
            }
            let computed = chain_digest(record.sequence, &record.event, prev)?;
            if computed != record.digest {
                return Err(ChainError::DigestMismatch {
                    sequence: record.sequence,
                    stored: record.digest.clone(),
                    computed,
                });
            }
            prev = Some(&record.digest);
        }
        Ok(())
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

    fn brief(id: u64) -> EscrowEvent {
        EscrowEvent::BriefSent {
            proposal_id: ProposalId::new(id),
            customer: acct("alice"),
            talent: acct("bob"),
            amount: Amount::new(100),
            at: t0(),
        }
    }

    #[test]
    fn append_chains_records() {
        let mut log = EventLog::new();
        let first = log.append(brief(1)).unwrap().clone();
        let second = log.append(brief(2)).unwrap().clone();
        assert_eq!(first.sequence, 0);
        assert_eq!(first.prev_digest, None);
        assert_eq!(second.prev_digest, Some(first.digest.clone()));
        assert_ne!(first.digest, second.digest);
        assert!(log.verify_chain().is_ok());
    }

    #[test]
    fn tampering_is_detected() {
        let mut log = EventLog::new();
        log.append(brief(1)).unwrap();
        log.append(brief(2)).unwrap();
        if let EscrowEvent::BriefSent { amount, .. } = &mut log.records[0].event {
            *amount = Amount::new(1);
        }
        let err = log.verify_chain().unwrap_err();
        assert!(matches!(err, ChainError::DigestMismatch { sequence: 0, .. }));
    }

    #[test]
    fn removal_is_detected() {
        let mut log = EventLog::new();
        log.append(brief(1)).unwrap();
        log.append(brief(2)).unwrap();
        log.append(brief(3)).unwrap();
        log.records.remove(1);
        assert!(log.verify_chain().is_err());
    }

    #[test]
    fn since_and_for_proposal() {
        let mut log = EventLog::new();
        log.append(brief(1)).unwrap();
        log.append(brief(2)).unwrap();
        log.append(EscrowEvent::UnexpectedDeposit {
            from: acct("carol"),
            amount: Amount::new(3),
            at: t0(),
        })
        .unwrap();
        assert_eq!(log.since(1).len(), 2);
        assert!(log.since(10).is_empty());
        assert_eq!(log.for_proposal(ProposalId::new(2)).count(), 1);
    }

    #[test]
    fn event_serialization_is_tagged() {
        let json = serde_json::to_value(brief(1)).unwrap();
        assert_eq!(json["event"], "brief_sent");
        assert_eq!(json["amount"], "100");
        assert_eq!(brief(1).operation(), Operation::SendBrief);
    }
}
