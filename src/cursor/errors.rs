//! Cursor error types

use thiserror::Error;

use super::convert::ConversionError;

/// Result type for cursor operations
pub type CursorResult<T> = Result<T, CursorError>;

/// Errors raised while reading a result cursor
#[derive(Debug, Error)]
pub enum CursorError {
    /// The cursor, or the session that owns it, has been closed
    #[error("Cursor is closed")]
    Closed,

    /// Read before the first `advance()` or after the last row
    #[error("Cursor is not positioned on a row")]
    NoCurrentRow,

    /// 1-based column index outside the result
    #[error("Column index {0} is not present")]
    IndexNotPresent(usize),

    /// Label matching no column, alias or aliased column
    #[error("Column '{0}' is not present")]
    ColumnNotPresent(String),

    /// Cell could not be converted to the requested type
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),
}

impl CursorError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            CursorError::Closed => "LQL_CURSOR_CLOSED",
            CursorError::NoCurrentRow => "LQL_CURSOR_NO_ROW",
            CursorError::IndexNotPresent(_) => "LQL_INDEX_NOT_PRESENT",
            CursorError::ColumnNotPresent(_) => "LQL_COLUMN_NOT_PRESENT",
            CursorError::Conversion(_) => "LQL_CONVERSION",
        }
    }
}
