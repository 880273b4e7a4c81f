//! Row store
//!
//! In-memory, column-named, row-oriented frames. The translator creates
//! them from flattened ledger blocks; every relational step produces a new
//! frame from an old one.

mod frame;
mod grouped;
mod value;

pub use frame::{Frame, Row};
pub use grouped::{Group, GroupedFrame};
pub use value::{Value, ValueType};
