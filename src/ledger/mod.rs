//! Ledger access
//!
//! Block records, the read capability the engine queries through, and an
//! in-memory implementation of it.

mod block;
mod client;
mod errors;
mod memory;

pub use block::{LedgerBlock, LedgerEntry};
pub use client::{LedgerClient, LedgerFuture};
pub use errors::{FetchError, FetchResult};
pub use memory::{LedgerCall, MemoryLedger, MAX_GENERATED_HEIGHT};
