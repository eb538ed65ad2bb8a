//! # Escrow Ledger
//!
//! Tracks the two deposit fields on every proposal and the running total
//! of value custodied across all proposals. This is the only code path
//! that writes an escrow field: deposits set it, releases zero it.
//!
//! ## Solvency Invariant
//!
//! `total_escrowed` equals the sum of every proposal's escrow fields and
//! never exceeds the custodian's balance on the host ledger.

use serde::{Deserialize, Serialize};

use gigbond_core::Amount;

use crate::error::EscrowError;
use crate::operation::{Operation, Party};
use crate::proposal::Proposal;

/// Running accounting of custodied deposits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowLedger {
    total_escrowed: Amount,
}

impl EscrowLedger {
    /// Create a ledger with nothing in custody.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all non-zero escrow fields across all proposals.
    pub fn total_escrowed(&self) -> Amount {
        self.total_escrowed
    }

    /// Credit `amount` to `party`'s escrow on `proposal`.
    ///
    /// # Errors
    ///
    /// [`EscrowError::ZeroDeposit`] if `amount` is zero;
    /// [`EscrowError::AccountingOverflow`] if either the field or the total
    /// would overflow. Neither is modified on error.
    pub fn deposit(
        &mut self,
        proposal: &mut Proposal,
        party: Party,
        amount: Amount,
        operation: Operation,
    ) -> Result<(), EscrowError> {
        if amount.is_zero() {
            return Err(EscrowError::ZeroDeposit { operation });
        }
        let overflow = || EscrowError::AccountingOverflow { operation };
        let total = self.total_escrowed.checked_add(amount).ok_or_else(overflow)?;
        let field = proposal.escrow_of(party).checked_add(amount).ok_or_else(overflow)?;

        *escrow_field(proposal, party) = field;
        self.total_escrowed = total;
        Ok(())
    }

    /// Zero `party`'s escrow on `proposal` and return what it held.
    ///
    /// # Errors
    ///
    /// [`EscrowError::InsufficientCustodyBalance`] if the total is smaller
    /// than the field being released, which means the accounting has
    /// drifted. Nothing is modified on error.
    pub fn release(
        &mut self,
        proposal: &mut Proposal,
        party: Party,
    ) -> Result<Amount, EscrowError> {
        let amount = proposal.escrow_of(party);
        let total = self.total_escrowed.checked_sub(amount).ok_or(
            EscrowError::InsufficientCustodyBalance {
                required: amount,
                available: self.total_escrowed,
            },
        )?;
        *escrow_field(proposal, party) = Amount::ZERO;
        self.total_escrowed = total;
        Ok(amount)
    }

    /// Put back `amount` released by a transition that is being undone.
    pub(crate) fn restore(&mut self, amount: Amount, operation: Operation) -> Result<(), EscrowError> {
        self.total_escrowed = self
            .total_escrowed
            .checked_add(amount)
            .ok_or(EscrowError::AccountingOverflow { operation })?;
        Ok(())
    }

    /// Check the solvency invariant against the custodian's balance.
    ///
    /// # Errors
    ///
    /// [`EscrowError::InsufficientCustodyBalance`] if more is owed than held.
    pub fn check_solvency(&self, custody_balance: Amount) -> Result<(), EscrowError> {
        if self.total_escrowed > custody_balance {
            return Err(EscrowError::InsufficientCustodyBalance {
                required: self.total_escrowed,
                available: custody_balance,
            });
        }
        Ok(())
    }

    /// Whether the running total matches the escrow fields of `proposals`.
    pub fn reconciles<'a>(&self, proposals: impl IntoIterator<Item = &'a Proposal>) -> bool {
        let sum = Amount::checked_sum(
            proposals
                .into_iter()
                .flat_map(|p| [p.customer_escrow, p.talent_escrow]),
        );
        sum == Some(self.total_escrowed)
    }
}

fn escrow_field(proposal: &mut Proposal, party: Party) -> &mut Amount {
    match party {
        Party::Customer => &mut proposal.customer_escrow,
        Party::Talent => &mut proposal.talent_escrow,
    }
}
