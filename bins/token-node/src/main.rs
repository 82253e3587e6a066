//! Local token network driven by JSON flow requests.
//!
//! Stands up the demo network from `LedgerConfig::DEV` (Alice, Bob, Charlie
//! and one notary) on a shared in-memory ledger, then runs each request in
//! order as the member it names and prints one JSON response per line.
//!
//! # Input
//!
//! A JSON array of client requests, each with the member to run as:
//!
//! ```json
//! [
//!   {
//!     "runAs": "CN=Alice, OU=Test Dept, O=R3, L=London, C=GB",
//!     "clientRequestId": "issue-1",
//!     "flowClassName": "com.r3.token.fungible.workflows.IssueFungibleTokenFlow",
//!     "requestBody": { "issuer": "...", "owner": "...", "quantity": 100 }
//!   }
//! ]
//! ```
//!
//! Read from the file given as the first argument, or stdin.
//!
//! ```bash
//! RUST_LOG=info cargo run -p token-node -- bins/token-node/requests.json
//! ```

use std::collections::HashMap;
use std::process::ExitCode;

use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use config::{LedgerConfig, MemberRole};
use ledger_core::MemberName;
use tokens::TokenService;
use tokens::ledger::{InMemoryLedger, InMemoryMembership, NodeIdentity};
use tokens::operations::ClientRequest;

const CONFIG: LedgerConfig = LedgerConfig::DEV;

type Node = TokenService<NodeIdentity, InMemoryLedger, InMemoryLedger>;

/// A client request addressed to one member's node.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRequest {
    run_as: String,
    #[serde(flatten)]
    request: ClientRequest,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("token-node starting");

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    let input = match read_input(std::env::args().nth(1)).await {
        Ok(input) => input,
        Err(e) => {
            tracing::error!(error = %e, "failed to read requests");
            return ExitCode::FAILURE;
        }
    };
    let requests: Vec<NodeRequest> = match serde_json::from_str(&input) {
        Ok(requests) => requests,
        Err(e) => {
            tracing::error!(error = %e, "requests are not a JSON array of client requests");
            return ExitCode::FAILURE;
        }
    };

    // -----------------------------------------------------------------------
    // Network
    // -----------------------------------------------------------------------

    let cancel = CancellationToken::new();
    let nodes = match start_network(&cancel) {
        Ok(nodes) => nodes,
        Err(e) => {
            tracing::error!(error = %e, "failed to start network");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(nodes = nodes.len(), "network ready");

    // -----------------------------------------------------------------------
    // Run until done or ctrl-c
    // -----------------------------------------------------------------------

    let run = run_requests(&nodes, &requests);
    let ok = tokio::select! {
        ok = run => ok,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
            false
        }
    };

    cancel.cancel();
    for node in nodes.values() {
        node.shutdown().await;
    }
    tracing::info!("token-node stopped");

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn read_input(path: Option<String>) -> std::io::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path).await,
        None => {
            let mut input = String::new();
            tokio::io::stdin().read_to_string(&mut input).await?;
            Ok(input)
        }
    }
}

/// Registers every configured member and gives each party its own node.
fn start_network(
    cancel: &CancellationToken,
) -> Result<HashMap<MemberName, Node>, tokens::TokenError> {
    let membership = InMemoryMembership::new();
    for member in CONFIG.members() {
        let name: MemberName = member.name.parse()?;
        match member.role {
            MemberRole::Party => {
                let info = membership.register(name)?;
                tracing::info!(member = %info.name(), key = %info.canonical_key(), "party joined");
            }
            MemberRole::Notary => {
                tracing::info!(notary = %name, "notary joined");
                membership.register_notary(name)?;
            }
        }
    }

    let ledger = InMemoryLedger::new(membership.clone());
    let mut nodes = HashMap::new();
    for member in CONFIG.parties() {
        let name: MemberName = member.name.parse()?;
        let node = TokenService::new(
            CONFIG,
            membership.node(&name)?,
            ledger.clone(),
            ledger.clone(),
            cancel.child_token(),
        );
        nodes.insert(name, node);
    }
    Ok(nodes)
}

/// Runs `requests` in order. Returns `false` if any flow failed.
async fn run_requests(nodes: &HashMap<MemberName, Node>, requests: &[NodeRequest]) -> bool {
    let mut all_ok = true;
    for NodeRequest { run_as, request } in requests {
        let node = run_as
            .parse::<MemberName>()
            .ok()
            .and_then(|name| nodes.get(&name));
        let Some(node) = node else {
            tracing::warn!(%run_as, "no node for member, skipping request");
            all_ok = false;
            continue;
        };

        let response = node.call(request).await;
        all_ok &= response.flow_error.is_none();
        match serde_json::to_string(&response) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!(error = %e, "failed to encode response"),
        }
    }
    all_ok
}
