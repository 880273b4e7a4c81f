//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events in the query engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    ConfigLoaded,

    // Session lifecycle
    SessionOpened,
    SessionClosed,

    // Query processing
    /// Query received
    QueryReceived,
    /// Filter compiled to an access path
    QueryPlanned,
    /// Query executed successfully
    QueryExecuted,
    /// Query rejected by planning or failed in fetch
    QueryRejected,
    /// Query abandoned because its session closed
    QueryCancelled,

    // Explain
    ExplainComplete,

    // Cursor
    CursorClosed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SessionOpened => "SESSION_OPENED",
            Event::SessionClosed => "SESSION_CLOSED",
            Event::QueryReceived => "QUERY_RECEIVED",
            Event::QueryPlanned => "QUERY_PLANNED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryCancelled => "QUERY_CANCELLED",
            Event::ExplainComplete => "EXPLAIN_COMPLETE",
            Event::CursorClosed => "CURSOR_CLOSED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryRejected => Severity::Error,
            Event::QueryCancelled => Severity::Warn,
            Event::QueryPlanned | Event::CursorClosed => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
