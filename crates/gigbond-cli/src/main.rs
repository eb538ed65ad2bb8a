//! # gigbond CLI entry point
//!
//! Parses command-line arguments, loads the session, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gigbond_cli::config::CliConfig;
use gigbond_cli::escrow::{
    run_accept_brief, run_deposit, run_proposal_call, run_send_brief, AcceptBriefArgs,
    DepositArgs, ProposalCall, ProposalCallArgs, SendBriefArgs,
};
use gigbond_cli::inspect::{run_events, run_list, run_status, EventsArgs, StatusArgs};
use gigbond_cli::session::Session;
use gigbond_cli::wallet::{run_balance, run_fund, BalanceArgs, FundArgs};

/// Two-party proposal escrow on a simulated ledger.
///
/// A customer sends a brief with a deposit, the talent answers with a
/// counter-deposit, and either side's withdrawal forfeits its deposit to
/// the other.
#[derive(Parser, Debug)]
#[command(name = "gigbond", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the session state file.
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mint test value into an account.
    Fund(FundArgs),
    /// Show an account's balance.
    Balance(BalanceArgs),
    /// Open a proposal with the customer's deposit.
    SendBrief(SendBriefArgs),
    /// Commit the talent's deposit to a brief.
    AcceptBrief(AcceptBriefArgs),
    /// Accept the talent's proposal; both deposits are refunded.
    AcceptProposal(ProposalCallArgs),
    /// Customer withdraws (BRIEF_SENT or PROPOSAL_SENT).
    Cancel(ProposalCallArgs),
    /// Talent withdraws after committing (PROPOSAL_SENT).
    Withdraw(ProposalCallArgs),
    /// Reclaim the customer's deposit after the response window.
    Timeout(ProposalCallArgs),
    /// Send value to the contract outside any operation.
    Deposit(DepositArgs),
    /// Show one proposal.
    Status(StatusArgs),
    /// List all proposals.
    List,
    /// Print the event log.
    Events(EventsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let state_file = gigbond_cli::resolve_state_file(cli.state.as_deref(), &config);
    tracing::debug!(state_file = %state_file.display(), "opening session");
    let mut session = Session::open(&state_file, &config)?;

    match cli.command {
        Commands::Fund(args) => run_fund(&args, &mut session),
        Commands::Balance(args) => run_balance(&args, &session),
        Commands::SendBrief(args) => run_send_brief(&args, &mut session),
        Commands::AcceptBrief(args) => run_accept_brief(&args, &mut session),
        Commands::AcceptProposal(args) => {
            run_proposal_call(ProposalCall::AcceptProposal, &args, &mut session)
        }
        Commands::Cancel(args) => run_proposal_call(ProposalCall::Cancel, &args, &mut session),
        Commands::Withdraw(args) => run_proposal_call(ProposalCall::Withdraw, &args, &mut session),
        Commands::Timeout(args) => run_proposal_call(ProposalCall::Timeout, &args, &mut session),
        Commands::Deposit(args) => run_deposit(&args, &mut session),
        Commands::Status(args) => run_status(&args, &session),
        Commands::List => run_list(&session),
        Commands::Events(args) => run_events(&args, &session),
    }
}
