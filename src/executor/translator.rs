//! Predicate-to-access translation
//!
//! Compiles a WHERE tree into an `AccessPath` (all validation happens here,
//! before the ledger is touched) and then executes that path against a
//! `LedgerClient`, combining compound results keyed by previous-hash.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::try_join;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::Semaphore;

use crate::ledger::{FetchError, FetchResult, LedgerBlock, LedgerClient};
use crate::plan::{
    AccessPath, AliasMap, BlockAccess, Comparison, FilterExpr, LogicalOp, LogicalPlan, PlanError,
    PlanResult,
};

use super::flatten::{FILTERABLE_COLUMNS, LEDGER_TABLE};

/// Boxed future yielding fetched blocks
pub type BlockFuture<'a> = Pin<Box<dyn Future<Output = FetchResult<Vec<LedgerBlock>>> + Send + 'a>>;

/// Executes access paths against the ledger with bounded fan-out
pub struct Translator {
    client: Arc<dyn LedgerClient>,
    limiter: Semaphore,
    concurrency: usize,
}

impl Translator {
    /// Creates a translator allowing at most `concurrency` fetches in flight
    pub fn new(client: Arc<dyn LedgerClient>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            client,
            limiter: Semaphore::new(concurrency),
            concurrency,
        }
    }

    /// Validates the source table and compiles the filter.
    ///
    /// Never touches the ledger.
    pub fn compile(plan: &LogicalPlan, aliases: &AliasMap) -> PlanResult<AccessPath> {
        match plan.from.as_deref() {
            Some(table) if table.eq_ignore_ascii_case(LEDGER_TABLE) => {}
            Some(table) => return Err(PlanError::unrecognized_table(table)),
            None => return Err(PlanError::unrecognized_table("")),
        }

        match &plan.filter {
            None => Ok(AccessPath::FullScan),
            Some(filter) => compile_filter(filter, aliases),
        }
    }

    /// Fetches the blocks an access path describes.
    ///
    /// A full scan returns blocks `1..height` in ascending order; the
    /// genesis block is never included.
    pub fn fetch_blocks<'a>(&'a self, path: &'a AccessPath) -> BlockFuture<'a> {
        Box::pin(async move {
            match path {
                AccessPath::FullScan => self.full_scan().await,
                AccessPath::Fetch(access) => Ok(vec![self.fetch_one(access).await?]),
                AccessPath::And(left, right) => {
                    let (l, r) = try_join(self.fetch_blocks(left), self.fetch_blocks(right)).await?;
                    Ok(combine(LogicalOp::And, l, r))
                }
                AccessPath::Or(left, right) => {
                    let (l, r) = try_join(self.fetch_blocks(left), self.fetch_blocks(right)).await?;
                    Ok(combine(LogicalOp::Or, l, r))
                }
            }
        })
    }

    async fn full_scan(&self) -> FetchResult<Vec<LedgerBlock>> {
        let height = self.client.current_height().await?;
        if height <= 1 {
            return Ok(Vec::new());
        }

        let mut blocks: Vec<LedgerBlock> = stream::iter(1..height)
            .map(|n| self.fetch_number(n))
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        // Completion order is arbitrary under fan-out
        blocks.sort_by_key(|b| b.block_number);
        Ok(blocks)
    }

    async fn fetch_number(&self, number: u64) -> FetchResult<LedgerBlock> {
        let _permit = self.permit().await?;
        self.client.fetch_block_by_number(number).await
    }

    async fn fetch_one(&self, access: &BlockAccess) -> FetchResult<LedgerBlock> {
        let _permit = self.permit().await?;
        match access {
            BlockAccess::ByNumber(n) => self.client.fetch_block_by_number(*n).await,
            BlockAccess::ByPreviousHash(hash) => self.client.fetch_block_by_hash(hash).await,
            BlockAccess::ByEntryId(id) => self.client.fetch_block_by_entry_id(id).await,
        }
    }

    async fn permit(&self) -> FetchResult<tokio::sync::SemaphorePermit<'_>> {
        self.limiter
            .acquire()
            .await
            .map_err(|_| FetchError::Unavailable("fetch limiter closed".to_string()))
    }
}

fn compile_filter(expr: &FilterExpr, aliases: &AliasMap) -> PlanResult<AccessPath> {
    match expr {
        FilterExpr::Comparison(cmp) => compile_comparison(cmp, aliases).map(AccessPath::Fetch),
        FilterExpr::Logical { op, operands } => match operands.as_slice() {
            [left, right] => {
                let left = Box::new(compile_filter(left, aliases)?);
                let right = Box::new(compile_filter(right, aliases)?);
                Ok(match op {
                    LogicalOp::And => AccessPath::And(left, right),
                    LogicalOp::Or => AccessPath::Or(left, right),
                })
            }
            _ => Err(PlanError::malformed_logical_operation(operands.len())),
        },
    }
}

fn compile_comparison(cmp: &Comparison, aliases: &AliasMap) -> PlanResult<BlockAccess> {
    let column = filterable_column(&cmp.column, aliases)
        .ok_or_else(|| PlanError::not_filterable(&cmp.column))?;

    if !cmp.op.is_equality() {
        return Err(PlanError::unsupported_operator(&cmp.column, cmp.op.symbol()));
    }

    let literal = strip_quotes(&cmp.value);
    match column {
        "blockNo" => literal
            .trim()
            .parse::<u64>()
            .map(BlockAccess::ByNumber)
            .map_err(|e| PlanError::invalid_literal(&cmp.column, &cmp.value, e)),
        "previousHash" => hex::decode(literal)
            .map(BlockAccess::ByPreviousHash)
            .map_err(|e| PlanError::invalid_literal(&cmp.column, &cmp.value, e)),
        _ => Ok(BlockAccess::ByEntryId(literal.to_string())),
    }
}

/// Canonical filterable column for a reference, directly or through an alias
fn filterable_column(name: &str, aliases: &AliasMap) -> Option<&'static str> {
    let direct = |n: &str| {
        FILTERABLE_COLUMNS
            .iter()
            .copied()
            .find(|c| c.eq_ignore_ascii_case(n))
    };
    direct(name).or_else(|| aliases.resolve(name).and_then(direct))
}

pub(super) fn strip_quotes(literal: &str) -> &str {
    literal.trim().trim_matches(|c: char| c == '\'' || c == '"')
}

/// Combines two fetch results keyed by hex previous-hash.
///
/// AND keeps, in left order, the right-side block for every key present on
/// both sides. OR keeps every left block, then right blocks whose key is not
/// on the left. Each side is deduplicated by key, first occurrence winning.
fn combine(op: LogicalOp, left: Vec<LedgerBlock>, right: Vec<LedgerBlock>) -> Vec<LedgerBlock> {
    let (left_keys, mut left_map) = keyed(left);
    let (right_keys, mut right_map) = keyed(right);

    match op {
        LogicalOp::And => left_keys
            .iter()
            .filter_map(|k| right_map.remove(k))
            .collect(),
        LogicalOp::Or => {
            let on_left: HashSet<&String> = left_keys.iter().collect();
            let mut out: Vec<LedgerBlock> =
                left_keys.iter().filter_map(|k| left_map.remove(k)).collect();
            out.extend(
                right_keys
                    .iter()
                    .filter(|k| !on_left.contains(k))
                    .filter_map(|k| right_map.remove(k)),
            );
            out
        }
    }
}

fn keyed(blocks: Vec<LedgerBlock>) -> (Vec<String>, HashMap<String, LedgerBlock>) {
    let mut keys = Vec::with_capacity(blocks.len());
    let mut map = HashMap::with_capacity(blocks.len());
    for block in blocks {
        let key = block.previous_hash_hex();
        if !map.contains_key(&key) {
            keys.push(key.clone());
            map.insert(key, block);
        }
    }
    (keys, map)
}
