//! Result cursor
//!
//! Exposes a finalized frame one row at a time with typed accessors.

mod convert;
mod cursor;
mod errors;
mod metadata;

pub use convert::{ConversionError, FromValue};
pub use cursor::{ColumnIndex, CursorState, ResultCursor};
pub use errors::{CursorError, CursorResult};
pub use metadata::ColumnMetadata;
