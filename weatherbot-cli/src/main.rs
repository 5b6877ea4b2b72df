//! Binary crate for the `weatherbot` service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging to stdout and a log file
//! - Interactive configuration
//! - Running the scheduler loop until Ctrl-C

use clap::Parser;

mod cli;
mod init;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
