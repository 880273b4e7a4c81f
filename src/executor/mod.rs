//! Query executor
//!
//! Turns a logical plan into a result cursor.
//!
//! # Execution Flow (strict order)
//!
//! 1. Compile the WHERE tree into an access path (rejections happen here)
//! 2. Fetch blocks from the ledger, fanned out under a concurrency limit
//! 3. Flatten blocks into one row per entry
//! 4. Group, apply HAVING, project aggregates
//! 5. Sort
//! 6. Apply limit
//! 7. Project the select list
//!
//! A query whose session closes mid-flight is abandoned at step 2.

mod engine;
mod errors;
mod filters;
mod flatten;
mod processor;
mod sorter;
mod translator;

pub use engine::QueryEngine;
pub use errors::{ExecutorError, ExecutorResult};
pub use filters::HavingFilter;
pub use flatten::{
    flatten_blocks, ledger_column_names, ledger_column_type, FILTERABLE_COLUMNS, LEDGER_COLUMNS,
    LEDGER_TABLE,
};
pub use processor::RelationalProcessor;
pub use sorter::RowSorter;
pub use translator::{BlockFuture, Translator};
