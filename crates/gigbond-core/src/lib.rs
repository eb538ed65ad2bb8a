#![deny(missing_docs)]

//! # gigbond-core: Foundational Types for gigbond
//!
//! This crate defines the primitives every other crate in the workspace
//! depends on. It has no internal crate dependencies, only `serde`,
//! `serde_json`, `thiserror`, `chrono`, and `sha2` from the ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A [`ProposalId`] is not a
//!    `u64` and an [`Amount`] is not a `u128`. You cannot pass a deposit
//!    where an identifier is expected.
//!
//! 2. **Amounts never touch floating point.** [`Amount`] is an integer count
//!    of the smallest currency unit and serializes as a decimal string.
//!
//! 3. **[`CanonicalBytes`] is the sole path to digest computation.** Every
//!    [`ContentDigest`] in the event log is computed from canonical bytes.
//!
//! 4. **Structured errors with `thiserror`.** No `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod amount;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use amount::Amount;
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{AccountId, ProposalId};
pub use temporal::Timestamp;
