//! # Escrow Subcommands
//!
//! Each subcommand is one host transaction against the contract:
//!
//! - `send-brief` opens a proposal with the customer's deposit.
//! - `accept-brief` commits the talent's deposit.
//! - `accept-proposal` refunds both sides.
//! - `cancel` is the customer withdrawing.
//! - `withdraw` is the talent withdrawing.
//! - `timeout` reclaims the customer's deposit after the response window.
//! - `deposit` sends value to the contract outside any operation.
//!
//! The session is saved only if the transaction succeeds.

use anyhow::Result;
use clap::Args;

use gigbond_core::{AccountId, Amount, ProposalId, Timestamp};

use crate::session::Session;

/// Arguments for `gigbond send-brief`.
#[derive(Args, Debug)]
pub struct SendBriefArgs {
    /// The customer sending the brief.
    #[arg(long = "as")]
    pub caller: AccountId,
    /// The talent the brief is addressed to.
    #[arg(long)]
    pub talent: AccountId,
    /// The customer's deposit.
    #[arg(long)]
    pub deposit: Amount,
    /// Host time of the call, RFC 3339 or unix seconds. Defaults to now.
    #[arg(long)]
    pub at: Option<Timestamp>,
}

/// Arguments for `gigbond accept-brief`.
#[derive(Args, Debug)]
pub struct AcceptBriefArgs {
    /// The talent accepting.
    #[arg(long = "as")]
    pub caller: AccountId,
    /// The proposal.
    #[arg(long)]
    pub id: ProposalId,
    /// The talent's deposit.
    #[arg(long)]
    pub deposit: Amount,
    /// Host time of the call, RFC 3339 or unix seconds. Defaults to now.
    #[arg(long)]
    pub at: Option<Timestamp>,
}

/// Arguments shared by the operations that carry no value.
#[derive(Args, Debug)]
pub struct ProposalCallArgs {
    /// The calling party.
    #[arg(long = "as")]
    pub caller: AccountId,
    /// The proposal.
    #[arg(long)]
    pub id: ProposalId,
    /// Host time of the call, RFC 3339 or unix seconds. Defaults to now.
    #[arg(long)]
    pub at: Option<Timestamp>,
}

/// Arguments for `gigbond deposit`.
#[derive(Args, Debug)]
pub struct DepositArgs {
    /// The sender.
    #[arg(long = "as")]
    pub caller: AccountId,
    /// Value sent.
    #[arg(long)]
    pub amount: Amount,
    /// Host time of the call, RFC 3339 or unix seconds. Defaults to now.
    #[arg(long)]
    pub at: Option<Timestamp>,
}

/// Which no-value operation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalCall {
    AcceptProposal,
    Cancel,
    Withdraw,
    Timeout,
}

pub fn run_send_brief(args: &SendBriefArgs, session: &mut Session) -> Result<u8> {
    let talent = args.talent.clone();
    let id = session.call(&args.caller, args.deposit, args.at, |c, ctx, _| {
        c.send_brief(ctx, talent)
    })?;
    session.save()?;
    println!(
        "OK: proposal {id} BRIEF_SENT ({} -> {}, deposit {})",
        args.caller, args.talent, args.deposit
    );
    Ok(0)
}

pub fn run_accept_brief(args: &AcceptBriefArgs, session: &mut Session) -> Result<u8> {
    let id = args.id;
    session.call(&args.caller, args.deposit, args.at, |c, ctx, _| {
        c.accept_brief(ctx, id)
    })?;
    session.save()?;
    println!("OK: proposal {id} PROPOSAL_SENT (talent deposit {})", args.deposit);
    Ok(0)
}

pub fn run_proposal_call(
    call: ProposalCall,
    args: &ProposalCallArgs,
    session: &mut Session,
) -> Result<u8> {
    let id = args.id;
    session.call(&args.caller, Amount::ZERO, args.at, |c, ctx, host| match call {
        ProposalCall::AcceptProposal => c.accept_proposal(ctx, host, id),
        ProposalCall::Cancel => c.cancel_by_customer(ctx, host, id),
        ProposalCall::Withdraw => c.cancel_by_talent(ctx, host, id),
        ProposalCall::Timeout => c.process_timeout(ctx, host, id),
    })?;
    session.save()?;
    println!("OK: proposal {id} {}", session.contract().proposal(id).status);
    Ok(0)
}

pub fn run_deposit(args: &DepositArgs, session: &mut Session) -> Result<u8> {
    session.call(&args.caller, args.amount, args.at, |c, ctx, _| c.receive(ctx))?;
    session.save()?;
    println!("OK: received {} from {}", args.amount, args.caller);
    Ok(0)
}
