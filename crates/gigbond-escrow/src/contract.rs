//! # Escrow Contract
//!
//! The externally callable operations. Each one validates the caller and
//! the proposal's status, mutates the registry and escrow ledger, performs
//! any outbound payment through the host, and only then emits its event.
//!
//! | Operation | Caller | From | Effect | To |
//! |---|---|---|---|---|
//! | [`send_brief`](EscrowContract::send_brief) | anyone (becomes customer) | none | store customer deposit | `BriefSent` |
//! | [`accept_brief`](EscrowContract::accept_brief) | talent | `BriefSent` | store talent deposit | `ProposalSent` |
//! | [`accept_proposal`](EscrowContract::accept_proposal) | customer | `ProposalSent` | refund both sides | `Accepted` |
//! | [`cancel_by_customer`](EscrowContract::cancel_by_customer) | customer | `BriefSent`, `ProposalSent` | customer deposit to talent if talent committed, else refund | `CancelledByCustomer` |
//! | [`cancel_by_talent`](EscrowContract::cancel_by_talent) | talent | `ProposalSent` | talent deposit to customer | `CancelledByTalent` |
//! | [`process_timeout`](EscrowContract::process_timeout) | customer | `BriefSent`, window elapsed | refund customer | `Rejected` |
//!
//! Only the side named in the Effect column is disbursed. In
//! `CancelledByCustomer` after the talent committed, and in
//! `CancelledByTalent`, the other side's deposit stays in custody on the
//! terminal record.
//!
//! ## Atomicity
//!
//! Every failure leaves status and escrow fields as they were. Operations
//! that pay out run under a [`TransitionGuard`]; the rest mutate only after
//! every check has passed.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use gigbond_core::{AccountId, Amount, ProposalId};

use crate::authority;
use crate::config::{ConfigError, EscrowConfig};
use crate::context::CallContext;
use crate::error::EscrowError;
use crate::event::{ChainError, EscrowEvent, EventLog, EventRecord};
use crate::guard::TransitionGuard;
use crate::ledger::EscrowLedger;
use crate::operation::{Operation, Party};
use crate::proposal::Proposal;
use crate::registry::ProposalRegistry;
use crate::status::ProposalStatus;
use crate::timeout::TimeoutPolicy;
use crate::transfer::{Payment, TransferExecutor, ValueTransfer};

/// Everything the contract persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractState {
    pub(crate) registry: ProposalRegistry,
    pub(crate) ledger: EscrowLedger,
    pub(crate) events: EventLog,
}

impl ContractState {
    /// The proposal registry.
    pub fn registry(&self) -> &ProposalRegistry {
        &self.registry
    }

    /// The escrow accounting.
    pub fn ledger(&self) -> &EscrowLedger {
        &self.ledger
    }

    /// The event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }
}

/// Which side's escrow goes to which party.
#[derive(Debug, Clone, Copy)]
struct Release {
    side: Party,
    to: Party,
}

/// A disbursement that has been applied but not yet committed.
struct Settlement {
    customer: AccountId,
    talent: AccountId,
    payouts: Vec<(Release, Amount)>,
}

impl Settlement {
    fn account(&self, party: Party) -> &AccountId {
        match party {
            Party::Customer => &self.customer,
            Party::Talent => &self.talent,
        }
    }

    fn released(&self, side: Party) -> Amount {
        self.payouts
            .iter()
            .filter(|(r, _)| r.side == side)
            .map(|(_, amount)| *amount)
            .fold(Amount::ZERO, |acc, a| acc.checked_add(a).unwrap_or(acc))
    }

    fn payments(&self) -> Vec<Payment> {
        self.payouts
            .iter()
            .map(|(r, amount)| Payment {
                recipient: self.account(r.to).clone(),
                amount: *amount,
            })
            .collect()
    }
}

/// The proposal escrow state machine.
#[derive(Debug, Default)]
pub struct EscrowContract {
    policy: TimeoutPolicy,
    state: Mutex<ContractState>,
}

impl EscrowContract {
    /// A contract with no proposals.
    pub fn new(policy: TimeoutPolicy) -> Self {
        Self::with_state(policy, ContractState::default())
    }

    /// A contract resuming from persisted state.
    pub fn with_state(policy: TimeoutPolicy, state: ContractState) -> Self {
        Self {
            policy,
            state: Mutex::new(state),
        }
    }

    /// A contract configured from validated parameters.
    pub fn from_config(config: &EscrowConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config.timeout_policy()))
    }

    /// The response-window policy in force.
    pub fn policy(&self) -> TimeoutPolicy {
        self.policy
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// Open a proposal addressed to `talent`, holding the attached value as
    /// the customer's deposit. The caller becomes the customer.
    ///
    /// # Errors
    ///
    /// [`EscrowError::ZeroDeposit`] if no value is attached.
    pub fn send_brief(
        &self,
        ctx: &CallContext,
        talent: AccountId,
    ) -> Result<ProposalId, EscrowError> {
        let operation = Operation::SendBrief;
        let mut guard = self.state.lock();
        let ContractState {
            registry,
            ledger,
            events,
        } = &mut *guard;

        let mut accounting = ledger.clone();
        let proposal = registry.prepare(
            &mut accounting,
            ctx.caller.clone(),
            talent.clone(),
            ctx.attached_value,
            ctx.now,
        )?;
        let id = proposal.id;
        events.append(EscrowEvent::BriefSent {
            proposal_id: id,
            customer: ctx.caller.clone(),
            talent: talent.clone(),
            amount: ctx.attached_value,
            at: ctx.now,
        })?;
        registry.insert(proposal);
        *ledger = accounting;

        tracing::info!(
            %operation,
            proposal_id = %id,
            customer = %ctx.caller,
            %talent,
            amount = %ctx.attached_value,
            "brief sent"
        );
        Ok(id)
    }

    /// The talent commits to the brief with the attached value as its
    /// deposit. Restarts the stage clock.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless the caller is the talent of record;
    /// `InvalidState` unless the proposal is `BriefSent`;
    /// `ZeroDeposit` if no value is attached.
    pub fn accept_brief(&self, ctx: &CallContext, id: ProposalId) -> Result<(), EscrowError> {
        let operation = Operation::AcceptBrief;
        let mut guard = self.state.lock();
        let ContractState {
            registry,
            ledger,
            events,
        } = &mut *guard;

        let current = registry.get(id);
        authority::authorize(operation, &current, &ctx.caller)?;
        let (customer, talent) = authority::parties(operation, &current)?;

        let mut next = current.clone();
        let mut accounting = ledger.clone();
        accounting.deposit(&mut next, Party::Talent, ctx.attached_value, operation)?;
        next.status = ProposalStatus::ProposalSent;
        next.stage_entered_at = Some(ctx.now);

        events.append(EscrowEvent::BriefAccepted {
            proposal_id: id,
            customer,
            talent,
            amount: ctx.attached_value,
            at: ctx.now,
        })?;
        let record = registry.get_mut(id).ok_or(EscrowError::InvalidState {
            proposal_id: id,
            operation,
            status: ProposalStatus::None,
        })?;
        *record = next;
        *ledger = accounting;

        tracing::info!(%operation, proposal_id = %id, amount = %ctx.attached_value, "brief accepted");
        Ok(())
    }

    /// The customer accepts the talent's proposal. Both deposits go back
    /// to their owners.
    pub fn accept_proposal<V: ValueTransfer + ?Sized>(
        &self,
        ctx: &CallContext,
        host: &V,
        id: ProposalId,
    ) -> Result<(), EscrowError> {
        self.disburse(
            ctx,
            host,
            id,
            Operation::AcceptProposal,
            |_| {
                Ok(vec![
                    Release {
                        side: Party::Customer,
                        to: Party::Customer,
                    },
                    Release {
                        side: Party::Talent,
                        to: Party::Talent,
                    },
                ])
            },
            |s| EscrowEvent::ProposalAccepted {
                proposal_id: id,
                customer: s.customer.clone(),
                talent: s.talent.clone(),
                customer_refund: s.released(Party::Customer),
                talent_refund: s.released(Party::Talent),
                at: ctx.now,
            },
        )
    }

    /// The customer withdraws. If the talent has already committed a
    /// deposit, the customer's deposit is forfeited to the talent;
    /// otherwise it is refunded.
    pub fn cancel_by_customer<V: ValueTransfer + ?Sized>(
        &self,
        ctx: &CallContext,
        host: &V,
        id: ProposalId,
    ) -> Result<(), EscrowError> {
        self.disburse(
            ctx,
            host,
            id,
            Operation::CancelByCustomer,
            |p| {
                let to = if p.talent_escrow.is_zero() {
                    Party::Customer
                } else {
                    Party::Talent
                };
                Ok(vec![Release {
                    side: Party::Customer,
                    to,
                }])
            },
            |s| EscrowEvent::CancelledByCustomer {
                proposal_id: id,
                customer: s.customer.clone(),
                talent: s.talent.clone(),
                amount: s.released(Party::Customer),
                compensated_talent: s.payouts.iter().any(|(r, _)| r.to == Party::Talent),
                at: ctx.now,
            },
        )
    }

    /// The talent withdraws after committing. Its deposit goes to the
    /// customer.
    pub fn cancel_by_talent<V: ValueTransfer + ?Sized>(
        &self,
        ctx: &CallContext,
        host: &V,
        id: ProposalId,
    ) -> Result<(), EscrowError> {
        self.disburse(
            ctx,
            host,
            id,
            Operation::CancelByTalent,
            |_| {
                Ok(vec![Release {
                    side: Party::Talent,
                    to: Party::Customer,
                }])
            },
            |s| EscrowEvent::CancelledByTalent {
                proposal_id: id,
                customer: s.customer.clone(),
                talent: s.talent.clone(),
                amount: s.released(Party::Talent),
                at: ctx.now,
            },
        )
    }

    /// The customer reclaims the deposit after the talent let the response
    /// window lapse.
    ///
    /// # Errors
    ///
    /// [`EscrowError::TimeoutNotElapsed`] if called before
    /// `stage_entered_at + window`.
    pub fn process_timeout<V: ValueTransfer + ?Sized>(
        &self,
        ctx: &CallContext,
        host: &V,
        id: ProposalId,
    ) -> Result<(), EscrowError> {
        let policy = self.policy;
        self.disburse(
            ctx,
            host,
            id,
            Operation::ProcessTimeout,
            |p| {
                let entered = p.stage_entered_at.ok_or(EscrowError::InvalidState {
                    proposal_id: id,
                    operation: Operation::ProcessTimeout,
                    status: p.status,
                })?;
                policy.require_elapsed(id, &entered, &ctx.now)?;
                Ok(vec![Release {
                    side: Party::Customer,
                    to: Party::Customer,
                }])
            },
            |s| EscrowEvent::BriefTimedOut {
                proposal_id: id,
                customer: s.customer.clone(),
                talent: s.talent.clone(),
                amount: s.released(Party::Customer),
                at: ctx.now,
            },
        )
    }

    /// Record value that arrived outside any operation. No proposal's
    /// accounting changes. A call with no value records nothing.
    pub fn receive(&self, ctx: &CallContext) -> Result<(), EscrowError> {
        if ctx.attached_value.is_zero() {
            return Ok(());
        }
        self.state.lock().events.append(EscrowEvent::UnexpectedDeposit {
            from: ctx.caller.clone(),
            amount: ctx.attached_value,
            at: ctx.now,
        })?;
        tracing::info!(from = %ctx.caller, amount = %ctx.attached_value, "unexpected deposit");
        Ok(())
    }

    /// Shared body of every operation that pays out of custody.
    fn disburse<V, P, E>(
        &self,
        ctx: &CallContext,
        host: &V,
        id: ProposalId,
        operation: Operation,
        plan: P,
        event: E,
    ) -> Result<(), EscrowError>
    where
        V: ValueTransfer + ?Sized,
        P: FnOnce(&Proposal) -> Result<Vec<Release>, EscrowError>,
        E: FnOnce(&Settlement) -> EscrowEvent,
    {
        let (guard, settlement) = {
            let mut state = self.state.lock();
            let ContractState {
                registry, ledger, ..
            } = &mut *state;

            let current = registry.get(id);
            authority::authorize(operation, &current, &ctx.caller)?;
            let (customer, talent) = authority::parties(operation, &current)?;
            let releases = plan(&current)?;
            let target = operation.target_status().ok_or(EscrowError::InvalidState {
                proposal_id: id,
                operation,
                status: current.status,
            })?;

            // Effects: computed on copies, then swapped in whole.
            let mut next = current.clone();
            let mut accounting = ledger.clone();
            let mut payouts = Vec::with_capacity(releases.len());
            for release in releases {
                let amount = accounting.release(&mut next, release.side)?;
                payouts.push((release, amount));
            }
            let released = Amount::checked_sum(payouts.iter().map(|(_, a)| *a))
                .ok_or(EscrowError::AccountingOverflow { operation })?;
            next.status = target;
            next.stage_entered_at = Some(ctx.now);
            next.in_flight = true;

            let record = registry.get_mut(id).ok_or(EscrowError::InvalidState {
                proposal_id: id,
                operation,
                status: ProposalStatus::None,
            })?;
            *record = next;
            *ledger = accounting;

            let settlement = Settlement {
                customer,
                talent,
                payouts,
            };
            (
                TransitionGuard::new(&self.state, operation, current, released),
                settlement,
            )
        };

        // Interaction: the state lock is released; reentrant calls on this
        // proposal see it in flight.
        TransferExecutor::new(host).execute(&settlement.payments())?;

        let committed = guard.commit(event(&settlement))?;
        tracing::info!(
            %operation,
            proposal_id = %id,
            status = %committed.status,
            customer_released = %settlement.released(Party::Customer),
            talent_released = %settlement.released(Party::Talent),
            "transition committed"
        );
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Look up a proposal; unknown identifiers yield the uninitialized record.
    pub fn proposal(&self, id: ProposalId) -> Proposal {
        self.state.lock().registry.get(id)
    }

    /// Every proposal, terminal ones included, in identifier order.
    pub fn proposals(&self) -> Vec<Proposal> {
        self.state.lock().registry.iter().cloned().collect()
    }

    /// Sum of all escrow fields across all proposals.
    pub fn total_escrowed(&self) -> Amount {
        self.state.lock().ledger.total_escrowed()
    }

    /// Check the solvency invariant against the host's custody balance.
    pub fn check_solvency<V: ValueTransfer + ?Sized>(&self, host: &V) -> Result<(), EscrowError> {
        let custody = host.custody_balance();
        self.state.lock().ledger.check_solvency(custody)
    }

    /// Every event record, oldest first.
    pub fn events(&self) -> Vec<EventRecord> {
        self.state.lock().events.records().to_vec()
    }

    /// Verify the event log's hash chain.
    pub fn verify_events(&self) -> Result<(), ChainError> {
        self.state.lock().events.verify_chain()
    }

    /// A copy of the full persisted state.
    pub fn snapshot(&self) -> ContractState {
        self.state.lock().clone()
    }

    /// Replace the full state, e.g. when a host transaction reverts.
    pub fn restore(&self, state: ContractState) {
        *self.state.lock() = state;
    }
}
