//! # Errors
//!
//! Failures raised by the primitive newtypes and by the canonical encoder.
//! Every variant keeps the rejected input so a bad CLI argument or a corrupt
//! state file can be traced back to the exact value.

use thiserror::Error;

/// Failure to turn a value into its canonical byte form.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// A JSON number with a fractional part was found. Amounts in this
    /// system are integers, so any float indicates a modelling mistake.
    #[error("non-integer number {0} cannot be canonicalized")]
    FloatRejected(f64),

    /// `serde_json` could not represent the value.
    #[error("could not encode value as JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Rejection of a string that should have parsed into a primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account identifier is empty, too long, or contains whitespace.
    #[error("invalid account ID: \"{0}\" (expected 1-128 printable characters without whitespace)")]
    InvalidAccountId(String),

    /// Proposal identifier is not a positive decimal integer.
    #[error("invalid proposal ID: \"{0}\" (expected a positive decimal integer)")]
    InvalidProposalId(String),

    /// Amount string is not a non-negative decimal integer.
    #[error("invalid amount: \"{0}\" (expected a non-negative integer in smallest units)")]
    InvalidAmount(String),

    /// Neither RFC 3339 nor unix seconds.
    #[error("cannot read \"{input}\" as a point in time: {detail}")]
    InvalidTimestamp {
        /// Rejected input.
        input: String,
        /// Parser message.
        detail: String,
    },
}
