//! Plan error types
//!
//! Every plan error is a rejection: the query is refused before (or instead
//! of) touching the ledger, and retrying the same plan fails the same way.
//!
//! Error codes:
//! - LQL_UNRECOGNIZED_TABLE
//! - LQL_AMBIGUOUS_ALIAS
//! - LQL_AMBIGUOUS_COLUMN
//! - LQL_MALFORMED_LOGICAL_OPERATION
//! - LQL_UNSUPPORTED_OPERATOR
//! - LQL_NOT_FILTERABLE
//! - LQL_UNKNOWN_COLUMN
//! - LQL_INVALID_LITERAL
//! - LQL_INVALID_AGGREGATE
//! - LQL_FRAME_SHAPE

use std::fmt;

/// Severity levels for plan errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Plan-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanErrorCode {
    /// Source table is not the ledger table
    UnrecognizedTable,
    /// Same alias introduced twice in the select list
    AmbiguousAlias,
    /// Two output columns would share a name
    AmbiguousColumn,
    /// Logical AND/OR node without exactly two operands
    MalformedLogicalOperation,
    /// Comparison operator not supported in this position
    UnsupportedOperator,
    /// Filter on a column outside the filterable whitelist
    NotFilterable,
    /// Column reference that resolves to nothing
    UnknownColumn,
    /// Literal that cannot be parsed for its column
    InvalidLiteral,
    /// Aggregate used where it cannot be evaluated
    InvalidAggregate,
    /// Row width does not match the column list
    FrameShape,
    /// Ledger value that does not fit its column type
    ValueOutOfRange,
}

impl PlanErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PlanErrorCode::UnrecognizedTable => "LQL_UNRECOGNIZED_TABLE",
            PlanErrorCode::AmbiguousAlias => "LQL_AMBIGUOUS_ALIAS",
            PlanErrorCode::AmbiguousColumn => "LQL_AMBIGUOUS_COLUMN",
            PlanErrorCode::MalformedLogicalOperation => "LQL_MALFORMED_LOGICAL_OPERATION",
            PlanErrorCode::UnsupportedOperator => "LQL_UNSUPPORTED_OPERATOR",
            PlanErrorCode::NotFilterable => "LQL_NOT_FILTERABLE",
            PlanErrorCode::UnknownColumn => "LQL_UNKNOWN_COLUMN",
            PlanErrorCode::InvalidLiteral => "LQL_INVALID_LITERAL",
            PlanErrorCode::InvalidAggregate => "LQL_INVALID_AGGREGATE",
            PlanErrorCode::FrameShape => "LQL_FRAME_SHAPE",
            PlanErrorCode::ValueOutOfRange => "LQL_VALUE_OUT_OF_RANGE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for PlanErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Plan error type with full context
#[derive(Debug, Clone)]
pub struct PlanError {
    /// Error code
    code: PlanErrorCode,
    /// Human-readable message
    message: String,
    /// Offending column if applicable
    column: Option<String>,
    /// Offending literal if applicable
    literal: Option<String>,
}

impl PlanError {
    fn new(code: PlanErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            column: None,
            literal: None,
        }
    }

    fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    fn with_literal(mut self, literal: impl Into<String>) -> Self {
        self.literal = Some(literal.into());
        self
    }

    /// Create an unrecognized table error
    pub fn unrecognized_table(table: impl Into<String>) -> Self {
        let t = table.into();
        Self::new(
            PlanErrorCode::UnrecognizedTable,
            format!("Unidentified table '{}'", t),
        )
    }

    /// Create an ambiguous alias error
    pub fn ambiguous_alias(alias: impl Into<String>) -> Self {
        let a = alias.into();
        Self::new(
            PlanErrorCode::AmbiguousAlias,
            format!("Alias '{}' is ambiguous", a),
        )
        .with_column(a)
    }

    /// Create an ambiguous output column error
    pub fn ambiguous_column(column: impl Into<String>) -> Self {
        let c = column.into();
        Self::new(
            PlanErrorCode::AmbiguousColumn,
            format!("Column '{}' appears more than once in the output", c),
        )
        .with_column(c)
    }

    /// Create a malformed logical operation error
    pub fn malformed_logical_operation(operands: usize) -> Self {
        Self::new(
            PlanErrorCode::MalformedLogicalOperation,
            format!(
                "Logical operation should have two boolean expressions, found {}",
                operands
            ),
        )
    }

    /// Create an unsupported operator error
    pub fn unsupported_operator(column: impl Into<String>, op: &str) -> Self {
        let c = column.into();
        Self::new(
            PlanErrorCode::UnsupportedOperator,
            format!("Operator '{}' is not supported on column '{}'", op, c),
        )
        .with_column(c)
    }

    /// Create a not filterable error
    pub fn not_filterable(column: impl Into<String>) -> Self {
        let c = column.into();
        Self::new(
            PlanErrorCode::NotFilterable,
            format!("Column '{}' is not filterable column", c),
        )
        .with_column(c)
    }

    /// Create an unknown column error
    pub fn unknown_column(column: impl Into<String>) -> Self {
        let c = column.into();
        Self::new(
            PlanErrorCode::UnknownColumn,
            format!("Column '{}' does not exist", c),
        )
        .with_column(c)
    }

    /// Create an invalid literal error
    pub fn invalid_literal(
        column: impl Into<String>,
        literal: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        let c = column.into();
        let l = literal.into();
        Self::new(
            PlanErrorCode::InvalidLiteral,
            format!("Invalid literal {} for column '{}': {}", l, c, reason),
        )
        .with_column(c)
        .with_literal(l)
    }

    /// Create an invalid aggregate error
    pub fn invalid_aggregate(reason: impl Into<String>) -> Self {
        Self::new(PlanErrorCode::InvalidAggregate, reason)
    }

    /// Create a frame shape error
    pub fn frame_shape(row: usize, expected: usize, found: usize) -> Self {
        Self::new(
            PlanErrorCode::FrameShape,
            format!(
                "Row {} has {} values, expected {}",
                row, found, expected
            ),
        )
    }

    /// Create a value out of range error
    pub fn value_out_of_range(column: impl Into<String>, value: impl fmt::Display) -> Self {
        let c = column.into();
        Self::new(
            PlanErrorCode::ValueOutOfRange,
            format!("Value {} does not fit column '{}'", value, c),
        )
        .with_column(c)
    }

    /// Returns the error code
    pub fn code(&self) -> PlanErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending column if applicable
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// Returns the offending literal if applicable
    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for PlanError {}

/// Result type for plan operations
pub type PlanResult<T> = Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PlanErrorCode::UnrecognizedTable.code(),
            "LQL_UNRECOGNIZED_TABLE"
        );
        assert_eq!(PlanErrorCode::NotFilterable.code(), "LQL_NOT_FILTERABLE");
        assert_eq!(
            PlanErrorCode::MalformedLogicalOperation.code(),
            "LQL_MALFORMED_LOGICAL_OPERATION"
        );
    }

    #[test]
    fn test_invalid_literal_carries_context() {
        let err = PlanError::invalid_literal("blockNo", "'abc'", "not a number");
        assert_eq!(err.column(), Some("blockNo"));
        assert_eq!(err.literal(), Some("'abc'"));
        assert!(err.message().contains("not a number"));
    }

    #[test]
    fn test_error_display() {
        let err = PlanError::not_filterable("channelId");
        let display = format!("{}", err);
        assert!(display.contains("REJECT"));
        assert!(display.contains("LQL_NOT_FILTERABLE"));
        assert!(display.contains("channelId"));
    }
}
