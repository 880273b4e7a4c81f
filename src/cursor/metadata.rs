//! Result column metadata

use serde::Serialize;

use crate::executor::ledger_column_type;
use crate::frame::{Frame, ValueType};

/// Describes one result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMetadata {
    /// Output label (alias if one was given)
    pub label: String,
    /// Underlying column or aggregate expression
    pub column: String,
    /// Type of the column's values
    pub type_hint: ValueType,
}

impl ColumnMetadata {
    /// Metadata for every column of `frame`, in order.
    ///
    /// The type hint is taken from the first non-null value; a column that
    /// holds only nulls falls back to the ledger schema's declared type.
    pub fn describe(frame: &Frame) -> Vec<ColumnMetadata> {
        frame
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let column = frame
                    .aliases()
                    .resolve(label)
                    .unwrap_or(label.as_str())
                    .to_string();

                let observed = frame
                    .rows()
                    .iter()
                    .map(|row| &row[idx])
                    .find(|v| !v.is_null())
                    .map(|v| v.value_type());

                let type_hint = observed
                    .or_else(|| ledger_column_type(&column))
                    .unwrap_or(ValueType::Null);

                ColumnMetadata {
                    label: label.clone(),
                    column,
                    type_hint,
                }
            })
            .collect()
    }
}
