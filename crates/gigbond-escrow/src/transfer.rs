//! # Transfer Executor
//!
//! Outbound value movement. By the time a transfer is attempted the
//! escrow field has already been zeroed and the proposal marked in flight
//! (checks, then effects, then the external call), so a recipient that
//! re-enters the contract observes the post-transition state.
//!
//! A payment the recipient refuses fails the whole operation with
//! [`EscrowError::TransferFailed`]. The contract undoes its own state
//! changes; the host reverts every value movement made during the call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gigbond_core::{AccountId, Amount};

use crate::error::EscrowError;

/// Why the host could not complete a payment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentFailure {
    /// The recipient refused the value (reverted, out of resources, no
    /// payable entrypoint).
    #[error("recipient {recipient} rejected payment: {reason}")]
    Rejected {
        /// The recipient.
        recipient: AccountId,
        /// The host's description of the refusal.
        reason: String,
    },

    /// The custodian account does not hold enough to pay.
    #[error("custodian holds {available}, payment needs {required}")]
    InsufficientFunds {
        /// Amount requested.
        required: Amount,
        /// Amount held.
        available: Amount,
    },
}

/// The host ledger's value-transfer primitive.
///
/// Implementations are synchronous. A payment may run recipient code,
/// which may call back into the escrow contract before `pay` returns.
/// Returning `Err` from `pay` must fail the enclosing host transaction:
/// every value movement made since the call began is reverted.
pub trait ValueTransfer {
    /// Value currently held by the custodian account.
    fn custody_balance(&self) -> Amount;

    /// Move `amount` from the custodian to `recipient`.
    fn pay(&self, recipient: &AccountId, amount: Amount) -> Result<(), PaymentFailure>;
}

/// A single outbound payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Who receives the value.
    pub recipient: AccountId,
    /// How much.
    pub amount: Amount,
}

/// Executes the payments a transition owes, in order, stopping at the
/// first failure.
pub struct TransferExecutor<'a, V: ValueTransfer + ?Sized> {
    host: &'a V,
}

impl<'a, V: ValueTransfer + ?Sized> TransferExecutor<'a, V> {
    /// An executor bound to a host ledger.
    pub fn new(host: &'a V) -> Self {
        Self { host }
    }

    /// Pay one recipient.
    ///
    /// # Errors
    ///
    /// [`EscrowError::InsufficientCustodyBalance`] if custody cannot cover
    /// `amount` (checked before calling out);
    /// [`EscrowError::TransferFailed`] if the host reports failure.
    pub fn transfer(&self, recipient: &AccountId, amount: Amount) -> Result<(), EscrowError> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.host.custody_balance();
        if available < amount {
            return Err(EscrowError::InsufficientCustodyBalance {
                required: amount,
                available,
            });
        }
        tracing::debug!(%recipient, %amount, "paying out of custody");
        self.host
            .pay(recipient, amount)
            .map_err(|source| EscrowError::TransferFailed {
                recipient: recipient.clone(),
                amount,
                source,
            })
    }

    /// Pay every recipient in `payments`, in order.
    pub fn execute(&self, payments: &[Payment]) -> Result<(), EscrowError> {
        payments
            .iter()
            .try_for_each(|p| self.transfer(&p.recipient, p.amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeHost {
        custody: RefCell<Amount>,
        refuse: Option<AccountId>,
        paid: RefCell<Vec<Payment>>,
    }

    impl FakeHost {
        fn holding(units: u128) -> Self {
            Self {
                custody: RefCell::new(Amount::new(units)),
                refuse: None,
                paid: RefCell::new(Vec::new()),
            }
        }
    }

    impl ValueTransfer for FakeHost {
        fn custody_balance(&self) -> Amount {
            *self.custody.borrow()
        }

        fn pay(&self, recipient: &AccountId, amount: Amount) -> Result<(), PaymentFailure> {
            if self.refuse.as_ref() == Some(recipient) {
                return Err(PaymentFailure::Rejected {
                    recipient: recipient.clone(),
                    reason: "refused".to_string(),
                });
            }
            let mut custody = self.custody.borrow_mut();
            *custody = custody.checked_sub(amount).unwrap();
            self.paid.borrow_mut().push(Payment {
                recipient: recipient.clone(),
                amount,
            });
            Ok(())
        }
    }

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    #[test]
    fn pays_in_order() {
        let host = FakeHost::holding(150);
        let payments = [
            Payment {
                recipient: acct("alice"),
                amount: Amount::new(100),
            },
            Payment {
                recipient: acct("bob"),
                amount: Amount::new(50),
            },
        ];
        TransferExecutor::new(&host).execute(&payments).unwrap();
        assert_eq!(host.paid.borrow().as_slice(), &payments);
        assert!(host.custody_balance().is_zero());
    }

    #[test]
    fn insufficient_custody_checked_before_call() {
        let host = FakeHost::holding(10);
        let err = TransferExecutor::new(&host)
            .transfer(&acct("alice"), Amount::new(11))
            .unwrap_err();
        assert!(matches!(err, EscrowError::InsufficientCustodyBalance { .. }));
        assert!(host.paid.borrow().is_empty());
    }

    #[test]
    fn refusal_maps_to_transfer_failed() {
        let mut host = FakeHost::holding(100);
        host.refuse = Some(acct("bob"));
        let err = TransferExecutor::new(&host)
            .transfer(&acct("bob"), Amount::new(5))
            .unwrap_err();
        assert!(matches!(err, EscrowError::TransferFailed { ref recipient, .. } if recipient.as_str() == "bob"));
    }

    #[test]
    fn stops_at_first_failure() {
        let mut host = FakeHost::holding(100);
        host.refuse = Some(acct("alice"));
        let payments = [
            Payment {
                recipient: acct("alice"),
                amount: Amount::new(1),
            },
            Payment {
                recipient: acct("bob"),
                amount: Amount::new(1),
            },
        ];
        assert!(TransferExecutor::new(&host).execute(&payments).is_err());
        assert!(host.paid.borrow().is_empty());
    }

    #[test]
    fn zero_amount_is_a_no_op() {
        let host = FakeHost::holding(0);
        TransferExecutor::new(&host)
            .transfer(&acct("alice"), Amount::ZERO)
            .unwrap();
        assert!(host.paid.borrow().is_empty());
    }
}
