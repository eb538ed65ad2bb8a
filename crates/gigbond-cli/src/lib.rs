//! # gigbond-cli: Command Line for the Proposal Escrow
//!
//! Drives [`gigbond_escrow::EscrowContract`] against an in-process
//! [`gigbond_escrow::SimulatedLedger`]. Ledger balances and contract state
//! persist between invocations in a JSON state file (default
//! `.gigbond/state.json`).
//!
//! ```bash
//! gigbond fund --account alice --amount 1000
//! gigbond fund --account bob --amount 1000
//! gigbond send-brief --as alice --talent bob --deposit 100
//! gigbond accept-brief --as bob --id 1 --deposit 40
//! gigbond accept-proposal --as alice --id 1
//! gigbond events --verify
//! ```

pub mod config;
pub mod escrow;
pub mod inspect;
pub mod session;
pub mod wallet;

use std::path::{Path, PathBuf};

/// The state file to use: the `--state` flag wins over the config file.
pub fn resolve_state_file(flag: Option<&Path>, config: &config::CliConfig) -> PathBuf {
    flag.map_or_else(|| config.state_file.clone(), Path::to_path_buf)
}
