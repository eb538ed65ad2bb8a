//! # Inspection Subcommands
//!
//! Read-only views of the session: one proposal, all proposals, and the
//! event log. `events --verify` also recomputes the hash chain and checks
//! that replaying the log reproduces every stored proposal.

use anyhow::Result;
use clap::Args;

use gigbond_core::ProposalId;
use gigbond_escrow::{EscrowEvent, Proposal, ProposalProjection, ValueTransfer};

use crate::session::Session;

/// Arguments for `gigbond status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// The proposal.
    #[arg(long)]
    pub id: ProposalId,
}

/// Arguments for `gigbond events`.
#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Verify the hash chain and replay the log against stored state.
    #[arg(long)]
    pub verify: bool,
}

fn party(p: &Proposal, customer: bool) -> String {
    let id = if customer { &p.customer } else { &p.talent };
    id.as_ref().map_or_else(|| "-".to_string(), ToString::to_string)
}

pub fn run_status(args: &StatusArgs, session: &Session) -> Result<u8> {
    let p = session.contract().proposal(args.id);
    if !p.exists() {
        println!("Proposal {}: not found", args.id);
        return Ok(1);
    }
    let policy = session.contract().policy();

    println!("Proposal: {}", p.id);
    println!("  Status: {}", p.status);
    println!("  Customer: {}", party(&p, true));
    println!("  Talent: {}", party(&p, false));
    println!("  Customer escrow: {}", p.customer_escrow);
    println!("  Talent escrow: {}", p.talent_escrow);
    if let Some(created) = p.created_at {
        println!("  Created: {created}");
    }
    if let Some(entered) = p.stage_entered_at {
        println!("  Stage entered: {entered}");
        if p.status == gigbond_escrow::ProposalStatus::BriefSent {
            if let Some(deadline) = policy.deadline(&entered) {
                println!("  Timeout from: {deadline}");
            }
        }
    }
    let history: Vec<_> = session
        .contract()
        .events()
        .into_iter()
        .filter(|r| r.event.proposal_id() == Some(p.id))
        .collect();
    println!("  Events: {}", history.len());
    for r in &history {
        println!("    [{}] {} at {}", r.sequence, r.event.operation(), r.event.at());
    }
    Ok(0)
}

pub fn run_list(session: &Session) -> Result<u8> {
    let proposals = session.contract().proposals();
    if proposals.is_empty() {
        println!("No proposals.");
        return Ok(0);
    }
    println!("Proposals ({}):", proposals.len());
    for p in &proposals {
        println!(
            "  {}: {} customer={} talent={} escrow={}/{}",
            p.id,
            p.status,
            party(p, true),
            party(p, false),
            p.customer_escrow,
            p.talent_escrow
        );
    }
    println!(
        "Total escrowed: {} (custody holds {})",
        session.contract().total_escrowed(),
        session.ledger().custody_balance()
    );
    Ok(0)
}

fn describe(event: &EscrowEvent) -> String {
    match event {
        EscrowEvent::BriefSent {
            proposal_id,
            customer,
            talent,
            amount,
            ..
        } => format!("brief_sent #{proposal_id} {customer} -> {talent} deposit {amount}"),
        EscrowEvent::BriefAccepted {
            proposal_id,
            amount,
            ..
        } => format!("brief_accepted #{proposal_id} talent deposit {amount}"),
        EscrowEvent::ProposalAccepted {
            proposal_id,
            customer_refund,
            talent_refund,
            ..
        } => format!(
            "proposal_accepted #{proposal_id} refunds {customer_refund}/{talent_refund}"
        ),
        EscrowEvent::CancelledByCustomer {
            proposal_id,
            amount,
            compensated_talent,
            ..
        } => {
            let to = if *compensated_talent { "talent" } else { "customer" };
            format!("cancelled_by_customer #{proposal_id} {amount} to {to}")
        }
        EscrowEvent::CancelledByTalent {
            proposal_id,
            amount,
            ..
        } => format!("cancelled_by_talent #{proposal_id} {amount} to customer"),
        EscrowEvent::BriefTimedOut {
            proposal_id,
            amount,
            ..
        } => format!("brief_timed_out #{proposal_id} {amount} refunded"),
        EscrowEvent::UnexpectedDeposit { from, amount, .. } => {
            format!("unexpected_deposit {amount} from {from}")
        }
    }
}

pub fn run_events(args: &EventsArgs, session: &Session) -> Result<u8> {
    let records = session.contract().events();
    for r in &records {
        println!("[{}] {} {}", r.sequence, r.event.at(), describe(&r.event));
    }

    if !args.verify {
        return Ok(0);
    }
    if let Err(e) = session.contract().verify_events() {
        println!("FAIL: {e}");
        return Ok(1);
    }
    let projection = match ProposalProjection::replay(&records) {
        Ok(p) => p,
        Err(e) => {
            println!("FAIL: {e}");
            return Ok(1);
        }
    };
    if !projection.agrees_with(session.contract().proposals().iter()) {
        println!("FAIL: replayed log disagrees with stored proposals");
        return Ok(1);
    }
    println!("OK: {} records, chain intact, replay matches", records.len());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;
    use gigbond_core::{AccountId, Amount};

    fn session_with_brief(path: &std::path::Path) -> Session {
        let mut session = Session::open(path, &CliConfig::default()).unwrap();
        let alice: AccountId = "alice".parse().unwrap();
        session.ledger().fund(&alice, Amount::new(10)).unwrap();
        session
            .call(&alice, Amount::new(10), None, |c, ctx, _| {
                c.send_brief(ctx, "bob".parse().unwrap())
            })
            .unwrap();
        session
    }

    #[test]
    fn status_of_unknown_proposal() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(&dir.path().join("s.json"), &CliConfig::default()).unwrap();
        let args = StatusArgs {
            id: ProposalId::new(1),
        };
        assert_eq!(run_status(&args, &session).unwrap(), 1);
    }

    #[test]
    fn status_of_known_proposal() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_with_brief(&dir.path().join("s.json"));
        let args = StatusArgs {
            id: ProposalId::new(1),
        };
        assert_eq!(run_status(&args, &session).unwrap(), 0);
        assert_eq!(run_list(&session).unwrap(), 0);
    }

    #[test]
    fn events_verify_passes_on_untouched_log() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_with_brief(&dir.path().join("s.json"));
        assert_eq!(run_events(&EventsArgs { verify: true }, &session).unwrap(), 0);
    }

    #[test]
    fn events_verify_detects_tampering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        session_with_brief(&path).save().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut doc: serde_json::Value = serde_json::from_str(&content).unwrap();
        doc["contract"]["events"]["records"][0]["event"]["amount"] = "9".into();
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        let session = Session::open(&path, &CliConfig::default()).unwrap();
        assert_eq!(run_events(&EventsArgs { verify: true }, &session).unwrap(), 1);
    }
}
