//! # Transition Guard
//!
//! A disbursing transition cannot hold the state lock while it pays out:
//! the recipient may call back into the contract, and on the same thread
//! that would deadlock. Instead the transition applies its effects under
//! the lock, marks the proposal in flight, releases the lock, transfers,
//! and then re-acquires the lock to either commit or undo.
//!
//! [`TransitionGuard`] owns that second half. It holds the pre-call record
//! and the amount released from custody. [`commit`](TransitionGuard::commit)
//! clears the in-flight flag and appends the event; dropping the guard
//! without committing restores the record and the escrow total. Every exit
//! path, including unwinding, therefore clears the flag.
//!
//! While the flag is set, [`authority::require_idle`](crate::authority::require_idle)
//! rejects every operation on the same proposal. Other proposals are
//! unaffected.

use parking_lot::Mutex;

use gigbond_core::{Amount, ProposalId};

use crate::contract::ContractState;
use crate::error::EscrowError;
use crate::event::EscrowEvent;
use crate::operation::Operation;
use crate::proposal::Proposal;

/// Undo record for a transition whose transfers are in progress.
///
/// Must be created after the caller's `MutexGuard` on the same state has
/// been dropped, since dropping this guard locks the state.
#[must_use = "dropping a TransitionGuard rolls the transition back"]
pub struct TransitionGuard<'a> {
    state: &'a Mutex<ContractState>,
    operation: Operation,
    before: Proposal,
    released: Amount,
    armed: bool,
}

impl<'a> TransitionGuard<'a> {
    pub(crate) fn new(
        state: &'a Mutex<ContractState>,
        operation: Operation,
        before: Proposal,
        released: Amount,
    ) -> Self {
        Self {
            state,
            operation,
            before,
            released,
            armed: true,
        }
    }

    /// The proposal this guard protects.
    pub fn proposal_id(&self) -> ProposalId {
        self.before.id
    }

    /// Finish the transition: clear the in-flight flag and append `event`.
    ///
    /// If the event cannot be appended the transition is undone and the
    /// error returned.
    pub(crate) fn commit(mut self, event: EscrowEvent) -> Result<Proposal, EscrowError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        self.armed = false;

        if let Err(e) = state.events.append(event) {
            self.undo(state);
            return Err(e.into());
        }
        let id = self.before.id;
        match state.registry.get_mut(id) {
            Some(record) => {
                record.in_flight = false;
                Ok(record.clone())
            }
            None => Ok(state.registry.get(id)),
        }
    }

    fn undo(&self, state: &mut ContractState) {
        let id = self.before.id;
        if let Some(record) = state.registry.get_mut(id) {
            *record = self.before.clone();
            record.in_flight = false;
        }
        if let Err(e) = state.ledger.restore(self.released, self.operation) {
            tracing::error!(operation = %self.operation, proposal_id = %id, error = %e, "escrow total could not be restored");
        }
        tracing::warn!(
            operation = %self.operation,
            proposal_id = %id,
            released = %self.released,
            "transition rolled back"
        );
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.armed = false;
            let mut state = self.state.lock();
            self.undo(&mut state);
        }
    }
}
