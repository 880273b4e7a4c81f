//! Query sessions
//!
//! A session binds one enrolled ledger identity to a query engine. Closing
//! a session cancels its in-flight queries and closes every cursor it
//! produced.

mod session;

pub use session::{Session, SessionHandle};
