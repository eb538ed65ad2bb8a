//! # gigbond-escrow: Proposal Escrow State Machine
//!
//! Two mutually distrusting parties, a **customer** and a **talent**,
//! negotiate a proposal while each holds a deposit in custody. Deposits
//! are released only by a defined transition and forfeited to the other
//! side when a party withdraws after committing.
//!
//! ## Components
//!
//! - **Registry** ([`registry`]): proposal id allocation and record storage.
//! - **Escrow ledger** ([`ledger`]): the per-side deposit fields and the
//!   running total of custodied value. The only code that zeroes an escrow.
//! - **Transition authority** ([`authority`]): caller and status guards.
//! - **Timeout policy** ([`timeout`]): the talent's response window.
//! - **Transfer executor** ([`transfer`]): outbound payments through the
//!   host's [`ValueTransfer`] primitive.
//! - **Transition guard** ([`guard`]): per-proposal in-flight flag held
//!   across the mutate-then-transfer sequence, with undo on every failure.
//! - **Event log** ([`event`]) and **replay** ([`replay`]).
//! - **Contract** ([`contract`]): the operations that compose the above.
//!
//! ## Status Graph
//!
//! ```text
//! None         ── send_brief ──────────▶ BriefSent
//! BriefSent    ── accept_brief ────────▶ ProposalSent
//! BriefSent    ── process_timeout ─────▶ Rejected
//! BriefSent    ── cancel_by_customer ──▶ CancelledByCustomer
//! ProposalSent ── accept_proposal ─────▶ Accepted
//! ProposalSent ── cancel_by_customer ──▶ CancelledByCustomer
//! ProposalSent ── cancel_by_talent ────▶ CancelledByTalent
//! ```
//!
//! ## Host Contract
//!
//! The host ledger authenticates callers, attaches value to calls, supplies
//! a monotonic clock ([`CallContext`]) and moves value out of custody
//! ([`ValueTransfer`]). A failed payment fails the whole host transaction;
//! [`SimulatedLedger`] implements those semantics in-process.

pub mod authority;
pub mod config;
pub mod context;
pub mod contract;
pub mod error;
pub mod event;
pub mod guard;
pub mod ledger;
pub mod operation;
pub mod proposal;
pub mod registry;
pub mod replay;
pub mod simulated;
pub mod status;
pub mod timeout;
pub mod transfer;

// Re-export primary types.
pub use config::{ConfigError, EscrowConfig};
pub use context::CallContext;
pub use contract::{ContractState, EscrowContract};
pub use error::EscrowError;
pub use event::{ChainError, EscrowEvent, EventLog, EventRecord};
pub use operation::{Operation, Party};
pub use proposal::Proposal;
pub use registry::ProposalRegistry;
pub use replay::{ProjectedProposal, ProposalProjection, ReplayError};
pub use simulated::{HostError, LedgerBook, RecipientHook, SimulatedLedger};
pub use status::ProposalStatus;
pub use timeout::{TimeoutPolicy, DEFAULT_RESPONSE_WINDOW_SECS};
pub use transfer::{Payment, PaymentFailure, TransferExecutor, ValueTransfer};
