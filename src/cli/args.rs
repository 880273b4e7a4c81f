//! CLI argument definitions using clap
//!
//! Commands:
//! - ledgerql query --config <path>
//! - ledgerql explain --config <path>
//! - ledgerql schema
//! - ledgerql generate --height <n> --entries <n>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::ledger::MAX_GENERATED_HEIGHT;

/// LedgerQL - SQL-style queries over an append-only ledger
#[derive(Parser, Debug)]
#[command(name = "ledgerql")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute one logical plan read from stdin and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./ledgerql.json")]
        config: PathBuf,
    },

    /// Show how a logical plan read from stdin would access the ledger
    Explain {
        /// Path to configuration file
        #[arg(long, default_value = "./ledgerql.json")]
        config: PathBuf,
    },

    /// Print the ledger table schema
    Schema,

    /// Write a synthetic block fixture to stdout
    Generate {
        /// Channel name stamped on every block
        #[arg(long, default_value = "mychannel")]
        channel: String,

        /// Number of blocks, genesis included
        #[arg(
            long,
            default_value_t = 10,
            value_parser = clap::value_parser!(u64).range(0..=MAX_GENERATED_HEIGHT)
        )]
        height: u64,

        /// Entries per non-genesis block
        #[arg(long, default_value_t = 2)]
        entries: usize,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
