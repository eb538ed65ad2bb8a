//! # Wallet Subcommands
//!
//! - `fund` mints test value into an account on the simulated ledger.
//! - `balance` prints an account's balance.

use anyhow::Result;
use clap::Args;

use gigbond_core::{AccountId, Amount};

use crate::session::Session;

/// Arguments for `gigbond fund`.
#[derive(Args, Debug)]
pub struct FundArgs {
    /// Account to credit.
    #[arg(long)]
    pub account: AccountId,
    /// Amount in base units.
    #[arg(long)]
    pub amount: Amount,
}

/// Arguments for `gigbond balance`.
#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Account to query.
    #[arg(long)]
    pub account: AccountId,
}

pub fn run_fund(args: &FundArgs, session: &mut Session) -> Result<u8> {
    session.ledger().fund(&args.account, args.amount)?;
    session.save()?;
    println!(
        "OK: funded {} with {}; balance {}",
        args.account,
        args.amount,
        session.ledger().balance_of(&args.account)
    );
    Ok(0)
}

pub fn run_balance(args: &BalanceArgs, session: &Session) -> Result<u8> {
    println!("{}: {}", args.account, session.ledger().balance_of(&args.account));
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;

    #[test]
    fn fund_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let config = CliConfig::default();
        let args = FundArgs {
            account: "alice".parse().unwrap(),
            amount: "250".parse().unwrap(),
        };

        let mut session = Session::open(&path, &config).unwrap();
        assert_eq!(run_fund(&args, &mut session).unwrap(), 0);
        assert_eq!(run_fund(&args, &mut session).unwrap(), 0);

        let session = Session::open(&path, &config).unwrap();
        assert_eq!(session.ledger().balance_of(&args.account), Amount::new(500));
        let balance = BalanceArgs {
            account: args.account.clone(),
        };
        assert_eq!(run_balance(&balance, &session).unwrap(), 0);
    }
}
