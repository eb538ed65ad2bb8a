//! # Simulated Host Ledger
//!
//! An in-process stand-in for the host ledger the contract is deployed on.
//! It keeps wallet balances, including the custodian account that holds
//! escrowed value, and gives every call the host's all-or-nothing
//! semantics:
//!
//! - [`SimulatedLedger::invoke`] attaches the call's value (caller to
//!   custodian), runs the operation, and on any error reverts every value
//!   movement journaled since the call began and restores the contract's
//!   state snapshot.
//! - Outbound payments ([`ValueTransfer::pay`]) may run a per-recipient
//!   [`RecipientHook`], which can refuse the value or call back into the
//!   contract, the way a recipient contract would.
//!
//! Top-level transactions are serialized by a reentrant lock, so nested
//! calls made from a hook on the same thread proceed while other threads
//! wait their turn.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gigbond_core::{AccountId, Amount, Timestamp};

use crate::context::CallContext;
use crate::contract::EscrowContract;
use crate::error::EscrowError;
use crate::transfer::{PaymentFailure, ValueTransfer};

/// Behaviour of a payment recipient, run after the value has been credited.
///
/// Returning an error refuses the payment; the credit is reverted.
pub type RecipientHook =
    Arc<dyn Fn(&SimulatedLedger, &AccountId, Amount) -> Result<(), PaymentFailure> + Send + Sync>;

/// Errors surfaced by a host transaction.
#[derive(Error, Debug)]
pub enum HostError {
    /// The caller cannot cover the value attached to the call, or the
    /// account to be debited is short.
    #[error("account {account} holds {available}, needs {required}")]
    InsufficientFunds {
        /// The account being debited.
        account: AccountId,
        /// Amount requested.
        required: Amount,
        /// Amount held.
        available: Amount,
    },

    /// A credit would overflow the recipient's balance.
    #[error("balance of {account} would overflow")]
    BalanceOverflow {
        /// The account being credited.
        account: AccountId,
    },

    /// The contract rejected the call; every effect was reverted.
    #[error("transaction reverted: {0}")]
    Reverted(#[from] EscrowError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Movement {
    from: AccountId,
    to: AccountId,
    amount: Amount,
}

/// Wallet balances. Serializable so a CLI session can persist them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBook {
    balances: BTreeMap<AccountId, Amount>,
    #[serde(skip)]
    journal: Vec<Movement>,
    #[serde(skip)]
    depth: usize,
}

impl LedgerBook {
    /// Balance of `account`; unknown accounts hold nothing.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    /// Every non-empty balance.
    pub fn balances(&self) -> impl Iterator<Item = (&AccountId, &Amount)> {
        self.balances.iter().filter(|(_, a)| !a.is_zero())
    }

    /// Sum of every balance, or `None` on overflow.
    pub fn supply(&self) -> Option<Amount> {
        Amount::checked_sum(self.balances.values().copied())
    }

    fn credit(&mut self, account: &AccountId, amount: Amount) -> Result<(), HostError> {
        let next = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or_else(|| HostError::BalanceOverflow {
                account: account.clone(),
            })?;
        self.balances.insert(account.clone(), next);
        Ok(())
    }

    fn debit(&mut self, account: &AccountId, amount: Amount) -> Result<(), HostError> {
        let available = self.balance_of(account);
        let next = available
            .checked_sub(amount)
            .ok_or_else(|| HostError::InsufficientFunds {
                account: account.clone(),
                required: amount,
                available,
            })?;
        self.balances.insert(account.clone(), next);
        Ok(())
    }

    /// Move `amount` and journal it.
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<(), HostError> {
        if amount.is_zero() {
            return Ok(());
        }
        self.debit(from, amount)?;
        if let Err(e) = self.credit(to, amount) {
            // Cannot fail: the debit just removed this amount.
            let _ = self.credit(from, amount);
            return Err(e);
        }
        self.journal.push(Movement {
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    /// Undo journaled movements back to `mark`, newest first.
    fn revert_to(&mut self, mark: usize) {
        while self.journal.len() > mark {
            let Some(m) = self.journal.pop() else { break };
            if self.debit(&m.to, m.amount).is_err() || self.credit(&m.from, m.amount).is_err() {
                tracing::error!(from = %m.from, to = %m.to, amount = %m.amount, "journal revert failed");
            }
        }
    }
}

/// In-process host ledger.
pub struct SimulatedLedger {
    custodian: AccountId,
    book: Mutex<LedgerBook>,
    hooks: RwLock<HashMap<AccountId, RecipientHook>>,
    tx: ReentrantMutex<()>,
}

impl std::fmt::Debug for SimulatedLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedLedger")
            .field("custodian", &self.custodian)
            .field("book", &*self.book.lock())
            .field("hooks", &self.hooks.read().len())
            .finish()
    }
}

impl SimulatedLedger {
    /// An empty ledger whose escrowed value sits in `custodian`.
    pub fn new(custodian: AccountId) -> Self {
        Self::from_book(custodian, LedgerBook::default())
    }

    /// A ledger resuming from persisted balances.
    pub fn from_book(custodian: AccountId, book: LedgerBook) -> Self {
        Self {
            custodian,
            book: Mutex::new(book),
            hooks: RwLock::new(HashMap::new()),
            tx: ReentrantMutex::new(()),
        }
    }

    /// The account holding escrowed value.
    pub fn custodian(&self) -> &AccountId {
        &self.custodian
    }

    /// A copy of the current balances.
    pub fn book(&self) -> LedgerBook {
        let mut book = self.book.lock().clone();
        book.journal.clear();
        book.depth = 0;
        book
    }

    /// Mint `amount` into `account`.
    pub fn fund(&self, account: &AccountId, amount: Amount) -> Result<(), HostError> {
        self.book.lock().credit(account, amount)?;
        tracing::debug!(%account, %amount, "funded");
        Ok(())
    }

    /// Current balance of `account` in the shared book.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.book.lock().balance_of(account)
    }

    /// Install behaviour for payments to `recipient`.
    pub fn set_hook(&self, recipient: AccountId, hook: RecipientHook) {
        self.hooks.write().insert(recipient, hook);
    }

    /// Remove any hook for `recipient`.
    pub fn clear_hook(&self, recipient: &AccountId) {
        self.hooks.write().remove(recipient);
    }

    /// Make every payment to `recipient` fail with `reason`.
    pub fn reject_payments_to(&self, recipient: &AccountId, reason: impl Into<String>) {
        let reason = reason.into();
        self.set_hook(
            recipient.clone(),
            Arc::new(move |_: &SimulatedLedger, to: &AccountId, _: Amount| {
                Err(PaymentFailure::Rejected {
                    recipient: to.clone(),
                    reason: reason.clone(),
                })
            }),
        );
    }

    /// Run `op` as one host transaction.
    ///
    /// `value` moves from `caller` to the custodian before `op` runs and is
    /// visible to it as [`CallContext::attached_value`]. If `op` fails,
    /// every value movement made since this call began is reverted and the
    /// contract's state is restored.
    pub fn invoke<T, F>(
        &self,
        contract: &EscrowContract,
        caller: &AccountId,
        value: Amount,
        now: Timestamp,
        op: F,
    ) -> Result<T, HostError>
    where
        F: FnOnce(&EscrowContract, &CallContext, &Self) -> Result<T, EscrowError>,
    {
        let _tx = self.tx.lock();
        let mark = {
            let mut book = self.book.lock();
            let mark = book.journal.len();
            book.transfer(caller, &self.custodian, value)?;
            book.depth += 1;
            mark
        };
        let snapshot = contract.snapshot();

        let ctx = CallContext::new(caller.clone(), value, now);
        let result = op(contract, &ctx, self);

        let mut book = self.book.lock();
        if result.is_err() {
            book.revert_to(mark);
        }
        book.depth -= 1;
        if book.depth == 0 {
            book.journal.clear();
        }
        drop(book);

        match result {
            Ok(v) => Ok(v),
            Err(e) => {
                contract.restore(snapshot);
                tracing::warn!(%caller, error = %e, "host transaction reverted");
                Err(HostError::Reverted(e))
            }
        }
    }
}

impl ValueTransfer for SimulatedLedger {
    fn custody_balance(&self) -> Amount {
        self.balance_of(&self.custodian)
    }

    fn pay(&self, recipient: &AccountId, amount: Amount) -> Result<(), PaymentFailure> {
        let mark = {
            let mut book = self.book.lock();
            let mark = book.journal.len();
            book.transfer(&self.custodian, recipient, amount)
                .map_err(|e| match e {
                    HostError::InsufficientFunds {
                        required,
                        available,
                        ..
                    } => PaymentFailure::InsufficientFunds {
                        required,
                        available,
                    },
                    other => PaymentFailure::Rejected {
                        recipient: recipient.clone(),
                        reason: other.to_string(),
                    },
                })?;
            book.depth += 1;
            mark
        };

        let hook = self.hooks.read().get(recipient).cloned();
        let outcome = match hook {
            Some(hook) => hook(self, recipient, amount),
            None => Ok(()),
        };

        // A payment outside `invoke` is its own scope; its journal entries
        // are dropped once the hook has run.
        let mut book = self.book.lock();
        if outcome.is_err() {
            book.revert_to(mark);
        }
        book.depth -= 1;
        if book.depth == 0 {
            book.journal.clear();
        }
        outcome
    }
}
