//! Query Property Tests
//!
//! End-to-end properties of plan execution against an in-memory ledger:
//! - Full scans return one row per entry in block order
//! - Aliases resolve the same as the columns they name
//! - AND/OR combine fetched blocks by previous-hash
//! - ORDER BY then LIMIT equals sort-then-take
//! - Targeted filters issue exactly the fetches they name

use std::collections::HashSet;
use std::sync::Arc;

use ledgerql::config::{EngineConfig, LedgerIdentity};
use ledgerql::cursor::ResultCursor;
use ledgerql::frame::Value;
use ledgerql::ledger::{LedgerCall, LedgerEntry, MemoryLedger};
use ledgerql::plan::{
    AggregateFunction, CompareOp, FilterExpr, HavingExpr, LogicalPlan, OrderItem, SelectItem,
};
use ledgerql::session::Session;

// =============================================================================
// Helper Functions
// =============================================================================

async fn open(ledger: Arc<MemoryLedger>) -> Session {
    let config = EngineConfig::new(LedgerIdentity::new("admin")).with_fetch_concurrency(4);
    Session::open(config, ledger).await.unwrap()
}

async fn run(ledger: &Arc<MemoryLedger>, plan: &LogicalPlan) -> Vec<Vec<Option<Value>>> {
    let session = open(ledger.clone()).await;
    let cursor = session.execute(plan).await.unwrap();
    rows(cursor)
}

fn rows(mut cursor: ResultCursor) -> Vec<Vec<Option<Value>>> {
    let width = cursor.columns().len();
    let mut out = Vec::new();
    while cursor.advance().unwrap() {
        out.push((1..=width).map(|i| cursor.get_value(i).unwrap()).collect());
    }
    out
}

/// Distinct previous-hash keys of a result, read through the cursor
async fn keys(ledger: &Arc<MemoryLedger>, filter: FilterExpr) -> HashSet<String> {
    let session = open(ledger.clone()).await;
    let plan = LogicalPlan::new("block").with_filter(filter);
    let mut cursor = session.execute(&plan).await.unwrap();

    let mut keys = HashSet::new();
    while cursor.advance().unwrap() {
        keys.insert(cursor.get_string("previousHash").unwrap());
    }
    keys
}

fn text(value: &Option<Value>) -> String {
    match value {
        Some(Value::Text(s)) => s.clone(),
        other => panic!("expected text, got {:?}", other),
    }
}

fn integer(value: &Option<Value>) -> i64 {
    match value {
        Some(Value::Integer(n)) => *n,
        other => panic!("expected integer, got {:?}", other),
    }
}

// =============================================================================
// Full Scan Tests
// =============================================================================

/// Row count equals the total entry count and block numbers never decrease.
#[tokio::test]
async fn test_full_scan_rows_match_entries() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 12, 3));
    let plan = LogicalPlan::new("block").with_select(SelectItem::star());

    let rows = run(&ledger, &plan).await;

    let expected: usize = ledger.blocks()[1..].iter().map(|b| b.entries.len()).sum();
    assert_eq!(rows.len(), expected);

    let numbers: Vec<i64> = rows.iter().map(|r| integer(&r[4])).collect();
    assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(numbers.first(), Some(&1));
    assert_eq!(numbers.last(), Some(&11));
}

/// The genesis block is never fetched by a scan.
#[tokio::test]
async fn test_full_scan_skips_genesis() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 5, 1));
    let session = open(ledger.clone()).await;
    ledger.reset_calls();

    session.execute(&LogicalPlan::new("block")).await.unwrap();

    let calls = ledger.calls();
    assert_eq!(calls[0], LedgerCall::Height);
    let mut fetched: Vec<u64> = calls
        .iter()
        .filter_map(|c| match c {
            LedgerCall::ByNumber(n) => Some(*n),
            _ => None,
        })
        .collect();
    fetched.sort_unstable();
    assert_eq!(fetched, vec![1, 2, 3, 4]);
}

/// A ledger holding only the genesis block yields an empty result.
#[tokio::test]
async fn test_full_scan_of_empty_chain() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 1, 4));
    let rows = run(&ledger, &LogicalPlan::new("block")).await;
    assert!(rows.is_empty());
}

// =============================================================================
// Targeted Fetch Scenarios
// =============================================================================

/// blockNo = '5' issues exactly one fetch-by-number(5).
#[tokio::test]
async fn test_block_number_filter_single_fetch() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 10, 4));
    let session = open(ledger.clone()).await;
    ledger.reset_calls();

    let plan = LogicalPlan::new("block").with_filter(FilterExpr::eq("blockNo", "'5'"));
    let mut cursor = session.execute(&plan).await.unwrap();

    assert_eq!(ledger.calls(), vec![LedgerCall::ByNumber(5)]);
    assert_eq!(cursor.row_count(), 4);
    while cursor.advance().unwrap() {
        assert_eq!(cursor.get_i64("blockNo").unwrap(), 5);
    }
}

/// blockNo = '5' AND previousHash = 'deadbeef' is empty when block 5 does
/// not carry that previous-hash.
#[tokio::test]
async fn test_and_with_foreign_hash_is_empty() {
    let mut blocks = MemoryLedger::generate("mychannel", 10, 2).blocks().to_vec();
    blocks[7].previous_hash = vec![0xde, 0xad, 0xbe, 0xef];
    let ledger = Arc::new(MemoryLedger::new(blocks));

    let plan = LogicalPlan::new("block").with_filter(FilterExpr::and(
        FilterExpr::eq("blockNo", "'5'"),
        FilterExpr::eq("previousHash", "'deadbeef'"),
    ));
    let rows = run(&ledger, &plan).await;

    assert!(rows.is_empty());
    assert_eq!(ledger.fetch_count(), 2);
}

/// A hash no block carries surfaces the ledger's not-found error.
#[tokio::test]
async fn test_unknown_hash_is_a_fetch_error() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 4, 1));
    let session = open(ledger).await;

    let plan = LogicalPlan::new("block").with_filter(FilterExpr::eq("previousHash", "'0badf00d'"));
    let err = session.execute(&plan).await.unwrap_err();

    assert_eq!(err.code(), "LQL_FETCH_NOT_FOUND");
}

/// select entryId AS tid, limit 3, height 10.
#[tokio::test]
async fn test_aliased_limit_keeps_block_order() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 10, 2));
    let session = open(ledger.clone()).await;

    let plan = LogicalPlan::new("block")
        .with_select(SelectItem::aliased("entryId", "tid"))
        .with_limit(3);
    let mut cursor = session.execute(&plan).await.unwrap();

    assert_eq!(cursor.columns(), ["tid".to_string()]);
    assert_eq!(cursor.row_count(), 3);

    let mut ids = Vec::new();
    while cursor.advance().unwrap() {
        ids.push(cursor.get_string("tid").unwrap());
    }
    assert_eq!(ids, vec!["tx-1-0", "tx-1-1", "tx-2-0"]);
}

// =============================================================================
// Alias Round-Trip Tests
// =============================================================================

/// Filtering by an alias equals filtering by its column.
#[tokio::test]
async fn test_filter_by_alias_matches_column() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 8, 3));
    let select = || {
        LogicalPlan::new("block")
            .with_select(SelectItem::aliased("entryId", "tid"))
            .with_select(SelectItem::column("blockNo"))
    };

    let by_alias = run(&ledger, &select().with_filter(FilterExpr::eq("tid", "'tx-4-2'"))).await;
    let by_column = run(&ledger, &select().with_filter(FilterExpr::eq("entryId", "'tx-4-2'"))).await;

    assert_eq!(by_alias, by_column);
    assert_eq!(by_alias.len(), 3);
}

/// Ordering by an alias equals ordering by its column.
#[tokio::test]
async fn test_order_by_alias_matches_column() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 6, 2));
    let select = || {
        LogicalPlan::new("block")
            .with_select(SelectItem::aliased("entryId", "tid"))
            .with_select(SelectItem::aliased("blockNo", "bn"))
    };

    let by_alias = run(&ledger, &select().with_order(OrderItem::desc("tid"))).await;
    let by_column = run(&ledger, &select().with_order(OrderItem::desc("entryId"))).await;

    assert_eq!(by_alias, by_column);
    assert_eq!(text(&by_alias[0][0]), "tx-5-1");
}

// =============================================================================
// Combination Tests
// =============================================================================

/// AND keeps only keys present on both sides.
#[tokio::test]
async fn test_and_is_subset_of_operands() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 8, 2));
    let a = FilterExpr::eq("blockNo", "3");
    let b = FilterExpr::eq("entryId", "'tx-3-1'");

    let left = keys(&ledger, a.clone()).await;
    let right = keys(&ledger, b.clone()).await;
    let both = keys(&ledger, FilterExpr::and(a, b)).await;

    assert!(!both.is_empty());
    assert!(both.is_subset(&left));
    assert!(both.is_subset(&right));

    let disjoint = keys(
        &ledger,
        FilterExpr::and(FilterExpr::eq("blockNo", "3"), FilterExpr::eq("blockNo", "4")),
    )
    .await;
    assert!(disjoint.is_empty());
}

/// OR size is |A| + |B| - |A n B| by previous-hash.
#[tokio::test]
async fn test_or_size_by_key() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 8, 2));
    let cases = [
        (FilterExpr::eq("blockNo", "3"), FilterExpr::eq("blockNo", "4")),
        (FilterExpr::eq("blockNo", "3"), FilterExpr::eq("entryId", "'tx-3-0'")),
    ];

    for (a, b) in cases {
        let left = keys(&ledger, a.clone()).await;
        let right = keys(&ledger, b.clone()).await;
        let either = keys(&ledger, FilterExpr::or(a, b)).await;

        let overlap = left.intersection(&right).count();
        assert_eq!(either.len(), left.len() + right.len() - overlap);
    }
}

/// OR of the same block twice yields that block's rows once.
#[tokio::test]
async fn test_or_deduplicates_rows() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 8, 2));
    let plan = LogicalPlan::new("block").with_filter(FilterExpr::or(
        FilterExpr::eq("blockNo", "6"),
        FilterExpr::eq("entryId", "'tx-6-1'"),
    ));

    let rows = run(&ledger, &plan).await;
    assert_eq!(rows.len(), 2);
}

// =============================================================================
// Order / Limit Tests
// =============================================================================

/// ORDER BY then LIMIT n equals sorting everything and taking n.
#[tokio::test]
async fn test_order_then_limit() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 7, 3));
    let base = || {
        LogicalPlan::new("block")
            .with_select(SelectItem::column("entryId"))
            .with_order(OrderItem::desc("entryId"))
    };

    let full = run(&ledger, &base()).await;
    assert_eq!(full.len(), 18);

    for n in [0usize, 1, 5, 18, 25] {
        let limited = run(&ledger, &base().with_limit(n as u64)).await;
        let expected: Vec<_> = full.iter().take(n).cloned().collect();
        assert_eq!(limited, expected, "limit {}", n);
    }
}

// =============================================================================
// Grouping Tests
// =============================================================================

/// GROUP BY with HAVING keeps only groups passing the aggregate test.
#[tokio::test]
async fn test_group_having_order() {
    let mut blocks = MemoryLedger::generate("mychannel", 6, 1).blocks().to_vec();
    for n in [2usize, 4] {
        for i in 1..3 {
            let mut extra: LedgerEntry = blocks[n].entries[0].clone();
            extra.entry_id = format!("tx-{}-{}", n, i);
            blocks[n].entries.push(extra);
        }
    }
    let ledger = Arc::new(MemoryLedger::new(blocks));

    let plan = LogicalPlan::new("block")
        .with_select(SelectItem::column("blockNo"))
        .with_select(SelectItem::aggregate(AggregateFunction::Count, None).with_alias("n"))
        .with_group_by("blockNo")
        .with_having(HavingExpr::aggregate(
            AggregateFunction::Count,
            None,
            CompareOp::Gte,
            "2",
        ))
        .with_order(OrderItem::desc("blockNo"));

    let rows = run(&ledger, &plan).await;

    assert_eq!(rows.len(), 2);
    assert_eq!((integer(&rows[0][0]), integer(&rows[0][1])), (4, 3));
    assert_eq!((integer(&rows[1][0]), integer(&rows[1][1])), (2, 3));
}

// =============================================================================
// Rejection Tests
// =============================================================================

/// Plans rejected during compilation never reach the ledger.
#[tokio::test]
async fn test_rejections_before_fetch() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 4, 1));
    let session = open(ledger.clone()).await;
    ledger.reset_calls();

    let cases = [
        (LogicalPlan::new("peers"), "LQL_UNRECOGNIZED_TABLE"),
        (
            LogicalPlan::new("block").with_filter(FilterExpr::eq("channelId", "'x'")),
            "LQL_NOT_FILTERABLE",
        ),
        (
            LogicalPlan::new("block").with_filter(FilterExpr::compare(
                "blockNo",
                CompareOp::Gt,
                "2",
            )),
            "LQL_UNSUPPORTED_OPERATOR",
        ),
        (
            LogicalPlan::new("block").with_filter(FilterExpr::eq("blockNo", "'five'")),
            "LQL_INVALID_LITERAL",
        ),
        (
            LogicalPlan::new("block")
                .with_select(SelectItem::aliased("entryId", "x"))
                .with_select(SelectItem::aliased("blockNo", "x")),
            "LQL_AMBIGUOUS_ALIAS",
        ),
    ];

    for (plan, code) in cases {
        let err = session.execute(&plan).await.unwrap_err();
        assert_eq!(err.code(), code);
    }
    assert!(ledger.calls().is_empty());
}
