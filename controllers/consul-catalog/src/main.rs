//! Consul Catalog
//!
//! Registers or deregisters a node and its service in the Consul catalog:
//! - present: registers the node with its service (Consul upserts)
//! - absent: removes the service from the node, if the node is listed
//!
//! One invocation makes one reconciliation decision and keeps no state.

mod cli;
mod error;
mod params;
mod reconciler;
mod report;
mod target;
#[cfg(test)]
mod test_utils;

use crate::cli::Cli;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::report::{CHECK_MODE_UNSUPPORTED, Outcome};
use clap::Parser;
use consul_client::{ConnectionConfig, ConsulClient, ConsulClientTrait, ConsulError};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = run(&cli, ConsulClient::connect).await;
    if let Err(e) = &outcome {
        if e.is_fatal() {
            error!("No catalog operation attempted: {}", e);
        } else {
            error!("{}", e);
        }
    }
    report::emit(&outcome)
}

/// Logs go to stderr; stdout carries the result document
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Validate, connect with `connect`, and reconcile.
///
/// `connect` is only called once the parameters are valid and the run is
/// not a dry run.
async fn run<C, F>(cli: &Cli, connect: F) -> Result<Outcome, ControllerError>
where
    C: ConsulClientTrait + Send + Sync + 'static,
    F: FnOnce(ConnectionConfig) -> Result<C, ConsulError>,
{
    let invocation = cli.load_params()?.validate()?;

    if invocation.check_mode {
        warn!("Check mode requested, skipping node {}", invocation.target.node.node);
        return Ok(Outcome::Skipped(CHECK_MODE_UNSUPPORTED.to_string()));
    }

    info!("Configuration:");
    info!("  Consul: {}://{}:{}", invocation.connection.scheme, invocation.connection.host, invocation.connection.port);
    info!("  Datacenter: {}", invocation.connection.datacenter.as_deref().unwrap_or("agent default"));
    info!("  Node: {}", invocation.target.node.node);
    info!("  State: {}", invocation.state);

    let datacenter = invocation.connection.datacenter.clone();
    let client = connect(invocation.connection).map_err(ControllerError::Connection)?;

    let reconciler = Reconciler::new(client, datacenter).with_change_detection(invocation.change_detection);
    reconciler
        .reconcile(&invocation.target, invocation.state)
        .await
        .map(Outcome::Reconciled)
}
