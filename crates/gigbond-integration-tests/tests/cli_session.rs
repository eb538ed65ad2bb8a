//! # CLI Session Round Trips
//!
//! Runs the CLI handlers against a state file on disk, reopening the
//! session between every command the way separate `gigbond` invocations
//! would.

use std::path::Path;

use gigbond_cli::config::CliConfig;
use gigbond_cli::escrow::{
    run_accept_brief, run_proposal_call, run_send_brief, AcceptBriefArgs, ProposalCall,
    ProposalCallArgs, SendBriefArgs,
};
use gigbond_cli::inspect::{run_events, EventsArgs};
use gigbond_cli::session::Session;
use gigbond_cli::wallet::{run_fund, FundArgs};
use gigbond_core::{AccountId, Amount, ProposalId};
use gigbond_escrow::{ProposalStatus, ValueTransfer};

fn acct(s: &str) -> AccountId {
    AccountId::new(s).unwrap()
}

fn open(path: &Path, config: &CliConfig) -> Session {
    Session::open(path, config).unwrap()
}

#[test]
fn cancel_after_commitment_across_invocations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".gigbond").join("state.json");
    let config = CliConfig::default();

    for who in ["alice", "bob"] {
        let args = FundArgs {
            account: who.parse().unwrap(),
            amount: Amount::new(500),
        };
        run_fund(&args, &mut open(&path, &config)).unwrap();
    }

    let brief = SendBriefArgs {
        caller: "alice".parse().unwrap(),
        talent: "bob".parse().unwrap(),
        deposit: Amount::new(100),
        at: Some("2026-05-01T09:00:00Z".parse().unwrap()),
    };
    run_send_brief(&brief, &mut open(&path, &config)).unwrap();

    let accept = AcceptBriefArgs {
        caller: "bob".parse().unwrap(),
        id: ProposalId::new(1),
        deposit: Amount::new(50),
        at: Some("2026-05-01T10:00:00Z".parse().unwrap()),
    };
    run_accept_brief(&accept, &mut open(&path, &config)).unwrap();

    // A call dated before the last one is refused and nothing is written.
    let stale = ProposalCallArgs {
        caller: "alice".parse().unwrap(),
        id: ProposalId::new(1),
        at: Some("2026-05-01T09:30:00Z".parse().unwrap()),
    };
    assert!(run_proposal_call(ProposalCall::Cancel, &stale, &mut open(&path, &config)).is_err());

    let cancel = ProposalCallArgs {
        caller: "alice".parse().unwrap(),
        id: ProposalId::new(1),
        at: Some("2026-05-01T11:00:00Z".parse().unwrap()),
    };
    run_proposal_call(ProposalCall::Cancel, &cancel, &mut open(&path, &config)).unwrap();

    let session = open(&path, &config);
    let p = session.contract().proposal(ProposalId::new(1));
    assert_eq!(p.status, ProposalStatus::CancelledByCustomer);
    assert_eq!(session.ledger().balance_of(&acct("bob")), Amount::new(550));
    assert_eq!(session.ledger().balance_of(&acct("alice")), Amount::new(400));
    assert_eq!(session.ledger().custody_balance(), Amount::new(50));
    assert_eq!(run_events(&EventsArgs { verify: true }, &session).unwrap(), 0);
}

#[test]
fn configured_window_governs_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let config = CliConfig::from_yaml_str("escrow:\n  response_window_secs: 60\n").unwrap();

    let fund = FundArgs {
        account: "alice".parse().unwrap(),
        amount: Amount::new(10),
    };
    run_fund(&fund, &mut open(&path, &config)).unwrap();
    let brief = SendBriefArgs {
        caller: "alice".parse().unwrap(),
        talent: "bob".parse().unwrap(),
        deposit: Amount::new(10),
        at: Some("2026-05-01T09:00:00Z".parse().unwrap()),
    };
    run_send_brief(&brief, &mut open(&path, &config)).unwrap();

    let timeout = ProposalCallArgs {
        caller: "alice".parse().unwrap(),
        id: ProposalId::new(1),
        at: Some("2026-05-01T09:01:00Z".parse().unwrap()),
    };
    run_proposal_call(ProposalCall::Timeout, &timeout, &mut open(&path, &config)).unwrap();
    let session = open(&path, &config);
    assert_eq!(
        session.contract().proposal(ProposalId::new(1)).status,
        ProposalStatus::Rejected
    );
}
