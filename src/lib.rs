//! ledgerql - SQL-style queries over an append-only ledger
//!
//! A logical plan is compiled into targeted block fetches, the fetched
//! blocks are flattened into one row per entry, and the relational tail of
//! the plan (GROUP BY, HAVING, ORDER BY, LIMIT, projection) runs in memory.
//! Results are read through a forward-only cursor.

pub mod cli;
pub mod config;
pub mod cursor;
pub mod executor;
pub mod frame;
pub mod ledger;
pub mod observability;
pub mod plan;
pub mod session;
