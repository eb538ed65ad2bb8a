//! # Session State
//!
//! A CLI session is the simulated host ledger plus the contract deployed
//! on it, persisted as one JSON document. Each command loads the session,
//! performs at most one host transaction, and writes the document back only
//! if the transaction succeeded.
//!
//! The session also owns the host clock. A call may name its time with
//! `--at`; otherwise the wall clock is used. Either way the time may not
//! precede the last recorded call.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use gigbond_core::{AccountId, Amount, Timestamp};
use gigbond_escrow::{
    CallContext, ContractState, EscrowContract, EscrowError, LedgerBook, SimulatedLedger,
};

use crate::config::CliConfig;

/// On-disk form of a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Custody account the book was created with.
    pub custodian: Option<AccountId>,
    /// Wallet balances.
    pub book: LedgerBook,
    /// Contract state.
    pub contract: ContractState,
    /// Host time of the last successful call.
    pub last_call_at: Option<Timestamp>,
}

/// A loaded session.
pub struct Session {
    path: PathBuf,
    contract: EscrowContract,
    ledger: SimulatedLedger,
    last_call_at: Option<Timestamp>,
}

impl Session {
    /// Load the session at `path`, or start an empty one if the file does
    /// not exist yet.
    pub fn open(path: &Path, config: &CliConfig) -> Result<Self> {
        let custodian = config.custodian_account()?;
        let state = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read state file: {}", path.display()))?;
            serde_json::from_str::<SessionState>(&content)
                .with_context(|| format!("corrupt state file: {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "no state file; starting empty session");
            SessionState::default()
        };

        if let Some(recorded) = &state.custodian {
            if recorded != &custodian {
                bail!(
                    "state file was created with custodian {recorded}, config names {custodian}"
                );
            }
        }

        let policy = config.escrow.timeout_policy();
        Ok(Self {
            path: path.to_path_buf(),
            contract: EscrowContract::with_state(policy, state.contract),
            ledger: SimulatedLedger::from_book(custodian, state.book),
            last_call_at: state.last_call_at,
        })
    }

    /// The deployed contract.
    pub fn contract(&self) -> &EscrowContract {
        &self.contract
    }

    /// The simulated host ledger.
    pub fn ledger(&self) -> &SimulatedLedger {
        &self.ledger
    }

    /// Resolve the time of the next call.
    pub fn clock(&self, at: Option<Timestamp>) -> Result<Timestamp> {
        let now = at.unwrap_or_else(Timestamp::now);
        if let Some(last) = self.last_call_at {
            if now < last {
                bail!("call time {now} precedes the last recorded call at {last}");
            }
        }
        Ok(now)
    }

    /// Run one contract operation as a host transaction.
    pub fn call<T, F>(
        &mut self,
        caller: &AccountId,
        value: Amount,
        at: Option<Timestamp>,
        op: F,
    ) -> Result<T>
    where
        F: FnOnce(&EscrowContract, &CallContext, &SimulatedLedger) -> Result<T, EscrowError>,
    {
        let now = self.clock(at)?;
        let out = self
            .ledger
            .invoke(&self.contract, caller, value, now, op)
            .with_context(|| format!("call by {caller} rejected"))?;
        self.last_call_at = Some(now);
        Ok(out)
    }

    /// Write the session back to disk.
    pub fn save(&self) -> Result<()> {
        let state = SessionState {
            custodian: Some(self.ledger.custodian().clone()),
            book: self.ledger.book(),
            contract: self.contract.snapshot(),
            last_call_at: self.last_call_at,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create state directory: {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(&state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write state file: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace state file: {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gigbond_escrow::ValueTransfer;

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn at(s: &str) -> Option<Timestamp> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(&dir.path().join("state.json"), &CliConfig::default()).unwrap();
        assert!(session.contract().proposals().is_empty());
        assert!(session.ledger().custody_balance().is_zero());
    }

    #[test]
    fn saved_session_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let config = CliConfig::default();

        let mut session = Session::open(&path, &config).unwrap();
        session.ledger().fund(&acct("alice"), Amount::new(500)).unwrap();
        let id = session
            .call(&acct("alice"), Amount::new(200), at("2026-05-01T09:00:00Z"), |c, ctx, _| {
                c.send_brief(ctx, acct("bob"))
            })
            .unwrap();
        session.save().unwrap();

        let reloaded = Session::open(&path, &config).unwrap();
        assert_eq!(reloaded.contract().proposal(id).customer_escrow, Amount::new(200));
        assert_eq!(reloaded.ledger().balance_of(&acct("alice")), Amount::new(300));
        reloaded.contract().verify_events().unwrap();
    }

    #[test]
    fn clock_is_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(&dir.path().join("s.json"), &CliConfig::default()).unwrap();
        session.ledger().fund(&acct("alice"), Amount::new(10)).unwrap();
        session
            .call(&acct("alice"), Amount::new(1), at("2026-05-02T00:00:00Z"), |c, ctx, _| {
                c.send_brief(ctx, acct("bob"))
            })
            .unwrap();
        assert!(session.clock(at("2026-05-01T00:00:00Z")).is_err());
        assert!(session.clock(at("2026-05-02T00:00:00Z")).is_ok());
    }

    #[test]
    fn rejected_call_does_not_advance_clock() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(&dir.path().join("s.json"), &CliConfig::default()).unwrap();
        let result = session.call(&acct("alice"), Amount::ZERO, at("2026-05-03T00:00:00Z"), |c, ctx, _| {
            c.send_brief(ctx, acct("bob"))
        });
        assert!(result.is_err());
        assert!(session.clock(at("2026-05-01T00:00:00Z")).is_ok());
    }

    #[test]
    fn custodian_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        Session::open(&path, &CliConfig::default()).unwrap().save().unwrap();

        let other = CliConfig {
            custodian: "vault".to_string(),
            ..CliConfig::default()
        };
        assert!(Session::open(&path, &other).is_err());
    }
}
