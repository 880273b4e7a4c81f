//! Block flattening
//!
//! Turns fetched blocks into the fixed ledger schema: one row per entry,
//! block-level fields repeated on every row of that block.

use crate::frame::{Frame, Row, Value, ValueType};
use crate::ledger::LedgerBlock;
use crate::plan::{AliasMap, PlanError, PlanResult};

/// The ledger table name
pub const LEDGER_TABLE: &str = "block";

/// Output columns of the ledger table, in order, with their value types
pub const LEDGER_COLUMNS: [(&str, ValueType); 9] = [
    ("previousHash", ValueType::Text),
    ("dataHash", ValueType::Text),
    ("transactionsMetadata", ValueType::Text),
    ("transactionCount", ValueType::Integer),
    ("blockNo", ValueType::Integer),
    ("channelId", ValueType::Text),
    ("entryId", ValueType::Text),
    ("entryType", ValueType::Text),
    ("timestamp", ValueType::Timestamp),
];

/// Columns usable in WHERE, each mapping to one ledger fetch
pub const FILTERABLE_COLUMNS: [&str; 3] = ["blockNo", "previousHash", "entryId"];

/// Column names of the ledger table
pub fn ledger_column_names() -> Vec<String> {
    LEDGER_COLUMNS.iter().map(|(name, _)| name.to_string()).collect()
}

/// Declared type of a ledger column, matched case-insensitively
pub fn ledger_column_type(name: &str) -> Option<ValueType> {
    LEDGER_COLUMNS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(name))
        .map(|(_, t)| *t)
}

/// Flattens blocks, in the given order, into a frame carrying `aliases`
pub fn flatten_blocks(blocks: &[LedgerBlock], aliases: AliasMap) -> PlanResult<Frame> {
    let mut rows: Vec<Row> = Vec::new();
    for block in blocks {
        push_block_rows(block, &mut rows)?;
    }
    Frame::new(ledger_column_names(), rows, aliases)
}

fn push_block_rows(block: &LedgerBlock, rows: &mut Vec<Row>) -> PlanResult<()> {
    let block_number = i64::try_from(block.block_number)
        .map_err(|_| PlanError::value_out_of_range("blockNo", block.block_number))?;
    let previous_hash = block.previous_hash_hex();
    let data_hash = hex::encode(&block.data_hash);
    let metadata = hex::encode(&block.transactions_metadata);

    rows.extend(block.entries.iter().map(|entry| {
        vec![
            Value::Text(previous_hash.clone()),
            Value::Text(data_hash.clone()),
            Value::Text(metadata.clone()),
            Value::Integer(i64::from(block.transaction_count)),
            Value::Integer(block_number),
            Value::Text(block.channel_id.clone()),
            Value::Text(entry.entry_id.clone()),
            Value::Text(entry.entry_type.clone()),
            Value::from(entry.timestamp),
        ]
    }));
    Ok(())
}
