//! Executor error types
//!
//! Error codes:
//! - LQL_* plan codes (see `plan::PlanErrorCode`)
//! - LQL_FETCH_* ledger codes (see `ledger::FetchError`)
//! - LQL_QUERY_CANCELLED
//! - LQL_SESSION_CLOSED

use thiserror::Error;

use crate::ledger::FetchError;
use crate::plan::PlanError;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors surfaced by query execution
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The plan was rejected
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// A ledger fetch failed
    #[error("[ERROR] {code}: {0}", code = .0.code())]
    Fetch(#[from] FetchError),

    /// The owning session was closed while the query was running
    #[error("[ERROR] LQL_QUERY_CANCELLED: query cancelled by session close")]
    Cancelled,

    /// The session was already closed when the query was submitted
    #[error("[ERROR] LQL_SESSION_CLOSED: session is closed")]
    SessionClosed,
}

impl ExecutorError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::Plan(e) => e.code().code(),
            ExecutorError::Fetch(e) => e.code(),
            ExecutorError::Cancelled => "LQL_QUERY_CANCELLED",
            ExecutorError::SessionClosed => "LQL_SESSION_CLOSED",
        }
    }

    /// Returns the plan error, if this is one
    pub fn as_plan(&self) -> Option<&PlanError> {
        match self {
            ExecutorError::Plan(e) => Some(e),
            _ => None,
        }
    }

    /// Human-readable message without the code prefix
    pub fn message(&self) -> String {
        match self {
            ExecutorError::Plan(e) => e.message().to_string(),
            ExecutorError::Fetch(e) => e.to_string(),
            ExecutorError::Cancelled => "query cancelled by session close".to_string(),
            ExecutorError::SessionClosed => "session is closed".to_string(),
        }
    }
}
