//! # Command Line Interface
//!
//! Subcommands for the three ways rolesmith runs: a long-lived webhook
//! server, a one-shot event handler, and the up-front credential
//! materialization step.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rolesmith")]
#[command(about = "Database credential reconciliation service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the lifecycle contract over HTTP
    Serve,

    /// Read one lifecycle event as JSON from stdin, reconcile, and print
    /// the status JSON to stdout
    Reconcile,

    /// Ensure the app credential secret exists and print its build-time
    /// and runtime references as JSON
    Materialize,
}
