//! CLI module

pub mod serve;

use clap::{Parser, Subcommand};

/// API key issuance, validation and rate limiting service
#[derive(Parser)]
#[command(name = "rapids-keys")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,
}
