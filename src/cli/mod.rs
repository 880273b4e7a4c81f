//! Command-line front end
//!
//! Provides:
//! - query: One-shot plan execution
//! - explain: One-shot access-path explanation
//! - schema: The ledger table's columns
//! - generate: Synthetic ledger fixtures

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{explain, generate, query, run, run_command, schema};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
