//! In-memory ledger
//!
//! Serves a fixed set of blocks and records every call made against it.
//! Used by the CLI (blocks loaded from a JSON fixture) and by tests.

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{TimeZone, Utc};
use sha2::{Digest, Sha256};

use crate::config::LedgerIdentity;

use super::block::{LedgerBlock, LedgerEntry};
use super::client::{LedgerClient, LedgerFuture};
use super::errors::{FetchError, FetchResult};

/// Base timestamp of generated chains (2018-07-25T16:45:00Z)
const GENERATED_EPOCH: i64 = 1_532_537_100;

/// Tallest chain [`MemoryLedger::generate`] will build
pub const MAX_GENERATED_HEIGHT: u64 = 100_000;

/// A call recorded by [`MemoryLedger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    Enroll(String),
    Height,
    ByNumber(u64),
    ByHash(Vec<u8>),
    ByEntryId(String),
}

impl LedgerCall {
    /// True for calls that fetch a block
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            LedgerCall::ByNumber(_) | LedgerCall::ByHash(_) | LedgerCall::ByEntryId(_)
        )
    }
}

/// Ledger held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryLedger {
    blocks: Vec<LedgerBlock>,
    calls: Mutex<Vec<LedgerCall>>,
}

impl MemoryLedger {
    pub fn new(blocks: Vec<LedgerBlock>) -> Self {
        Self {
            blocks,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Parse a JSON array of blocks
    pub fn from_json(json: &str) -> FetchResult<Self> {
        let blocks: Vec<LedgerBlock> =
            serde_json::from_str(json).map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(Self::new(blocks))
    }

    /// Load a JSON array of blocks from disk
    pub fn load(path: &Path) -> FetchResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| FetchError::Unavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Build a linked chain of `height` blocks.
    ///
    /// Block 0 is a genesis block holding a single CONFIG entry. Every other
    /// block holds `entries_per_block` endorser transactions named
    /// `tx-{block}-{i}`. Each block's previous hash is its predecessor's data
    /// hash. Heights above [`MAX_GENERATED_HEIGHT`] are clamped to it.
    pub fn generate(channel: &str, height: u64, entries_per_block: usize) -> Self {
        let height = height.min(MAX_GENERATED_HEIGHT);
        let mut blocks = Vec::new();
        let mut previous_hash = Vec::new();

        for number in 0..height {
            let base = GENERATED_EPOCH + number as i64 * 60;
            let entries: Vec<LedgerEntry> = if number == 0 {
                vec![LedgerEntry {
                    entry_id: String::new(),
                    entry_type: "CONFIG".to_string(),
                    timestamp: Utc.timestamp_opt(base, 0).single(),
                }]
            } else {
                (0..entries_per_block)
                    .map(|i| LedgerEntry {
                        entry_id: format!("tx-{}-{}", number, i),
                        entry_type: "ENDORSER_TRANSACTION".to_string(),
                        timestamp: Utc.timestamp_opt(base + i as i64, 0).single(),
                    })
                    .collect()
            };

            let data_hash = digest(channel, number);
            blocks.push(LedgerBlock {
                previous_hash: std::mem::replace(&mut previous_hash, data_hash.clone()),
                data_hash,
                transactions_metadata: number.to_be_bytes().to_vec(),
                transaction_count: entries.len() as u32,
                block_number: number,
                channel_id: channel.to_string(),
                entries,
            });
        }

        Self::new(blocks)
    }

    /// Fails unless every block belongs to `channel`
    pub fn require_channel(self, channel: &str) -> FetchResult<Self> {
        match self.blocks.iter().find(|b| b.channel_id != channel) {
            Some(block) => Err(FetchError::ChannelMismatch {
                expected: channel.to_string(),
                found: block.channel_id.clone(),
                block: block.block_number,
            }),
            None => Ok(self),
        }
    }

    /// All blocks held
    pub fn blocks(&self) -> &[LedgerBlock] {
        &self.blocks
    }

    /// Block with this number, without recording a call
    pub fn block(&self, number: u64) -> Option<&LedgerBlock> {
        self.blocks.iter().find(|b| b.block_number == number)
    }

    /// Calls recorded so far, in arrival order
    pub fn calls(&self) -> Vec<LedgerCall> {
        self.lock_calls().clone()
    }

    /// Number of block fetches recorded so far
    pub fn fetch_count(&self) -> usize {
        self.lock_calls().iter().filter(|c| c.is_fetch()).count()
    }

    /// Forget recorded calls
    pub fn reset_calls(&self) {
        self.lock_calls().clear();
    }

    fn record(&self, call: LedgerCall) {
        self.lock_calls().push(call);
    }

    fn lock_calls(&self) -> MutexGuard<'_, Vec<LedgerCall>> {
        // A panicking test thread must not hide the calls made before it.
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn find<P>(&self, predicate: P) -> Option<LedgerBlock>
    where
        P: Fn(&LedgerBlock) -> bool,
    {
        self.blocks.iter().find(|b| predicate(b)).cloned()
    }
}

impl LedgerClient for MemoryLedger {
    fn enroll<'a>(&'a self, identity: &'a LedgerIdentity) -> LedgerFuture<'a, ()> {
        Box::pin(async move {
            self.record(LedgerCall::Enroll(identity.user.clone()));
            Ok(())
        })
    }

    fn current_height(&self) -> LedgerFuture<'_, u64> {
        Box::pin(async move {
            self.record(LedgerCall::Height);
            Ok(self
                .blocks
                .iter()
                .map(|b| b.block_number + 1)
                .max()
                .unwrap_or(0))
        })
    }

    fn fetch_block_by_number(&self, number: u64) -> LedgerFuture<'_, LedgerBlock> {
        Box::pin(async move {
            self.record(LedgerCall::ByNumber(number));
            self.find(|b| b.block_number == number)
                .ok_or(FetchError::BlockNotFound(number))
        })
    }

    fn fetch_block_by_hash<'a>(&'a self, hash: &'a [u8]) -> LedgerFuture<'a, LedgerBlock> {
        Box::pin(async move {
            self.record(LedgerCall::ByHash(hash.to_vec()));
            self.find(|b| b.previous_hash == hash)
                .ok_or_else(|| FetchError::HashNotFound(hex::encode(hash)))
        })
    }

    fn fetch_block_by_entry_id<'a>(&'a self, entry_id: &'a str) -> LedgerFuture<'a, LedgerBlock> {
        Box::pin(async move {
            self.record(LedgerCall::ByEntryId(entry_id.to_string()));
            self.find(|b| b.entries.iter().any(|e| e.entry_id == entry_id))
                .ok_or_else(|| FetchError::EntryNotFound(entry_id.to_string()))
        })
    }
}

/// SHA-256 of the channel name followed by the big-endian block number
fn digest(channel: &str, number: u64) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(channel.as_bytes());
    hasher.update(number.to_be_bytes());
    hasher.finalize().to_vec()
}
