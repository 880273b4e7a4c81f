//! Session Lifecycle Tests
//!
//! Tests for session and cursor invariants:
//! - Closing a session cancels running queries promptly
//! - Closing a session closes the cursors it produced
//! - Explain never touches the ledger
//! - Cursors are single-pass and stay exhausted
//! - Configuration files drive identity and fixture ledgers

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::NamedTempFile;

use ledgerql::config::{EngineConfig, LedgerIdentity};
use ledgerql::cursor::{CursorError, CursorState};
use ledgerql::executor::ExecutorError;
use ledgerql::ledger::{
    FetchError, FetchResult, LedgerBlock, LedgerCall, LedgerClient, LedgerFuture, MemoryLedger,
};
use ledgerql::plan::{FilterExpr, LogicalPlan, SelectItem};
use ledgerql::session::Session;

// =============================================================================
// Helpers
// =============================================================================

/// Ledger whose block fetches never complete
#[derive(Default)]
struct StalledLedger {
    started: AtomicUsize,
}

impl LedgerClient for StalledLedger {
    fn current_height(&self) -> LedgerFuture<'_, u64> {
        Box::pin(async { Ok(50) })
    }

    fn fetch_block_by_number(&self, _number: u64) -> LedgerFuture<'_, LedgerBlock> {
        self.started.fetch_add(1, Ordering::SeqCst);
        Box::pin(std::future::pending::<FetchResult<LedgerBlock>>())
    }

    fn fetch_block_by_hash<'a>(&'a self, _hash: &'a [u8]) -> LedgerFuture<'a, LedgerBlock> {
        self.started.fetch_add(1, Ordering::SeqCst);
        Box::pin(std::future::pending::<FetchResult<LedgerBlock>>())
    }

    fn fetch_block_by_entry_id<'a>(&'a self, _id: &'a str) -> LedgerFuture<'a, LedgerBlock> {
        self.started.fetch_add(1, Ordering::SeqCst);
        Box::pin(std::future::pending::<FetchResult<LedgerBlock>>())
    }
}

/// Ledger that refuses every identity
struct RefusingLedger;

impl LedgerClient for RefusingLedger {
    fn enroll<'a>(&'a self, identity: &'a LedgerIdentity) -> LedgerFuture<'a, ()> {
        Box::pin(async move {
            Err(FetchError::Enrollment {
                user: identity.user.clone(),
                reason: "unknown user".to_string(),
            })
        })
    }

    fn current_height(&self) -> LedgerFuture<'_, u64> {
        Box::pin(async { Ok(0) })
    }

    fn fetch_block_by_number(&self, number: u64) -> LedgerFuture<'_, LedgerBlock> {
        Box::pin(async move { Err(FetchError::BlockNotFound(number)) })
    }

    fn fetch_block_by_hash<'a>(&'a self, hash: &'a [u8]) -> LedgerFuture<'a, LedgerBlock> {
        Box::pin(async move { Err(FetchError::HashNotFound(hex::encode(hash))) })
    }

    fn fetch_block_by_entry_id<'a>(&'a self, id: &'a str) -> LedgerFuture<'a, LedgerBlock> {
        Box::pin(async move { Err(FetchError::EntryNotFound(id.to_string())) })
    }
}

fn config() -> EngineConfig {
    EngineConfig::new(LedgerIdentity::new("admin"))
}

fn write_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// =============================================================================
// Cancellation Tests
// =============================================================================

/// Closing the session returns a stalled query promptly.
#[tokio::test]
async fn test_close_cancels_pending_fetch() {
    let ledger = Arc::new(StalledLedger::default());
    let session = Session::open(config().with_fetch_concurrency(3), ledger.clone())
        .await
        .unwrap();
    let plan = LogicalPlan::new("block");

    let closer = async {
        while ledger.started.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        session.close();
    };

    let (result, ()) = tokio::time::timeout(
        Duration::from_secs(5),
        async { tokio::join!(session.execute(&plan), closer) },
    )
    .await
    .expect("cancellation did not return promptly");

    assert!(matches!(result, Err(ExecutorError::Cancelled)));
    // Fan-out never exceeded the configured limit
    assert_eq!(ledger.started.load(Ordering::SeqCst), 3);
    assert_eq!(session.metrics().snapshot().queries_cancelled, 1);
}

/// A targeted fetch is cancelled the same way.
#[tokio::test]
async fn test_close_cancels_targeted_fetch() {
    let ledger = Arc::new(StalledLedger::default());
    let session = Session::open(config(), ledger.clone()).await.unwrap();
    let plan = LogicalPlan::new("block").with_filter(FilterExpr::or(
        FilterExpr::eq("entryId", "'tx-1-0'"),
        FilterExpr::eq("previousHash", "'00ff'"),
    ));

    let closer = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        session.close();
    };

    let (result, ()) = tokio::time::timeout(
        Duration::from_secs(5),
        async { tokio::join!(session.execute(&plan), closer) },
    )
    .await
    .expect("cancellation did not return promptly");

    assert_eq!(result.unwrap_err().code(), "LQL_QUERY_CANCELLED");
}

// =============================================================================
// Session / Cursor Tests
// =============================================================================

/// Cursors report closed once their session closes.
#[tokio::test]
async fn test_session_close_closes_cursors() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 5, 2));
    let session = Session::open(config(), ledger).await.unwrap();
    let plan = LogicalPlan::new("block").with_select(SelectItem::column("entryId"));

    let mut first = session.execute(&plan).await.unwrap();
    let mut second = session.execute(&plan).await.unwrap();
    assert!(first.advance().unwrap());

    session.close();

    assert_eq!(first.state(), CursorState::Closed);
    assert!(second.is_closed());
    assert!(matches!(first.get_string(1usize), Err(CursorError::Closed)));
    assert!(matches!(second.advance(), Err(CursorError::Closed)));
    // Closing a cursor after its session is harmless
    first.close();
    assert!(first.is_closed());
}

/// advance() returns false once exhausted and on every later call.
#[tokio::test]
async fn test_cursor_exhaustion_is_sticky() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 3, 2));
    let session = Session::open(config(), ledger).await.unwrap();

    let mut cursor = session.execute(&LogicalPlan::new("block")).await.unwrap();
    let mut seen = 0;
    while cursor.advance().unwrap() {
        seen += 1;
    }

    assert_eq!(seen, 4);
    for _ in 0..3 {
        assert!(!cursor.advance().unwrap());
    }
    assert!(cursor.is_after_last());

    cursor.close();
    assert!(cursor.advance().is_err());
}

/// Typed reads through a session cursor.
#[tokio::test]
async fn test_typed_reads() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 4, 1));
    let session = Session::open(config(), ledger.clone()).await.unwrap();
    let plan = LogicalPlan::new("block").with_filter(FilterExpr::eq("blockNo", "2"));

    let mut cursor = session.execute(&plan).await.unwrap();
    assert!(cursor.advance().unwrap());

    let block = ledger.block(2).unwrap();
    assert_eq!(cursor.get_i32("blockNo").unwrap(), 2);
    assert_eq!(cursor.get_string("channelId").unwrap(), "mychannel");
    assert_eq!(cursor.get_string("dataHash").unwrap(), hex::encode(&block.data_hash));
    assert_eq!(cursor.get_timestamp("timestamp").unwrap(), block.entries[0].timestamp);
    assert!(cursor.get_i64("entryType").is_err());
    assert_eq!(cursor.find_column("timestamp").unwrap(), 9);
}

/// Enrollment failures surface from open().
#[tokio::test]
async fn test_enrollment_failure() {
    let err = Session::open(config(), Arc::new(RefusingLedger))
        .await
        .err()
        .unwrap();
    assert_eq!(err.code(), "LQL_FETCH_ENROLLMENT");
}

// =============================================================================
// Explain Tests
// =============================================================================

/// Explain compiles the plan without touching the ledger.
#[tokio::test]
async fn test_explain_never_fetches() {
    let ledger = Arc::new(MemoryLedger::generate("mychannel", 6, 2));
    let session = Session::open(config(), ledger.clone()).await.unwrap();
    ledger.reset_calls();

    let plans = [
        LogicalPlan::new("block"),
        LogicalPlan::new("block").with_filter(FilterExpr::and(
            FilterExpr::eq("blockNo", "'5'"),
            FilterExpr::eq("previousHash", "'deadbeef'"),
        )),
        LogicalPlan::new("block").with_filter(FilterExpr::eq("timestamp", "'x'")),
    ];

    let explains: Vec<_> = plans.iter().map(|p| session.explain(p).unwrap()).collect();

    assert_eq!(explains[0].access.as_deref(), Some("FULL_SCAN"));
    assert_eq!(
        explains[1].access.as_deref(),
        Some("(BLOCK_BY_NUMBER(5) AND BLOCK_BY_HASH(deadbeef))")
    );
    assert_eq!(explains[1].fetches, Some(2));
    assert!(!explains[2].accepted);
    assert!(ledger.calls().is_empty());
}

// =============================================================================
// Configuration Tests
// =============================================================================

/// A config file names the identity and a fixture ledger.
#[tokio::test]
async fn test_config_file_with_fixture_ledger() {
    let generated = MemoryLedger::generate("trade", 4, 2);
    let fixture = write_file(&serde_json::to_string(generated.blocks()).unwrap());
    let config_file = write_file(&format!(
        r#"{{
            "identity": {{"user": "auditor", "organization": "Org1MSP"}},
            "channel": "trade",
            "fetch_concurrency": 2,
            "ledger_path": {}
        }}"#,
        serde_json::to_string(fixture.path()).unwrap()
    ));

    let config = EngineConfig::load(config_file.path()).unwrap();
    assert_eq!(config.identity.organization.as_deref(), Some("Org1MSP"));
    assert_eq!(config.log_level, "info");

    let path = config.ledger_path.clone().unwrap();
    let ledger = Arc::new(MemoryLedger::load(&path).unwrap());
    let session = Session::open(config, ledger.clone()).await.unwrap();

    let cursor = session.execute(&LogicalPlan::new("block")).await.unwrap();
    assert_eq!(cursor.row_count(), 6);
    assert_eq!(ledger.calls()[0], LedgerCall::Enroll("auditor".to_string()));
}

/// Invalid settings are rejected on load.
#[test]
fn test_invalid_config_rejected() {
    let cases = [
        r#"{"identity": {"user": ""}}"#,
        r#"{"identity": {"user": "admin"}, "fetch_concurrency": 0}"#,
        r#"{"identity": {"user": "admin"}, "log_level": "verbose"}"#,
        r#"{"channel": "mychannel"}"#,
    ];

    for content in cases {
        let file = write_file(content);
        assert!(EngineConfig::load(file.path()).is_err(), "{}", content);
    }
}

/// A malformed fixture is a decode error, a missing one is unavailable.
#[test]
fn test_fixture_errors() {
    let file = write_file("[{\"block_number\": \"one\"}]");
    let err = MemoryLedger::load(file.path()).unwrap_err();
    assert_eq!(err.code(), "LQL_FETCH_DECODE");

    let err = MemoryLedger::load(std::path::Path::new("/nonexistent/ledger.json")).unwrap_err();
    assert_eq!(err.code(), "LQL_FETCH_UNAVAILABLE");
}
