//! Ledger capability
//!
//! The engine reads the ledger only through this trait. Implementations are
//! network clients in production; async methods return boxed futures so the
//! trait stays object safe.

use std::future::Future;
use std::pin::Pin;

use crate::config::LedgerIdentity;

use super::block::LedgerBlock;
use super::errors::FetchResult;

/// Boxed future returned by ledger operations
pub type LedgerFuture<'a, T> = Pin<Box<dyn Future<Output = FetchResult<T>> + Send + 'a>>;

/// Narrow read interface onto the ledger
pub trait LedgerClient: Send + Sync {
    /// Enroll the identity queries will run as.
    ///
    /// Clients that need no enrollment keep the default.
    fn enroll<'a>(&'a self, _identity: &'a LedgerIdentity) -> LedgerFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    /// Current block height (number of the next block to be written)
    fn current_height(&self) -> LedgerFuture<'_, u64>;

    /// Block with this number
    fn fetch_block_by_number(&self, number: u64) -> LedgerFuture<'_, LedgerBlock>;

    /// Block whose previous-hash equals `hash`
    fn fetch_block_by_hash<'a>(&'a self, hash: &'a [u8]) -> LedgerFuture<'a, LedgerBlock>;

    /// Block containing the entry with this identifier
    fn fetch_block_by_entry_id<'a>(&'a self, entry_id: &'a str) -> LedgerFuture<'a, LedgerBlock>;
}
