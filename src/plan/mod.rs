//! Logical plan subsystem
//!
//! The plan tree is handed over by an external SQL front end. This module
//! owns its representation, the alias map derived from it, the compiled
//! access path the translator produces, and the rejection errors raised
//! while interpreting it.

mod access;
mod aliases;
mod ast;
mod errors;
mod explain;

pub use access::{AccessPath, BlockAccess};
pub use aliases::AliasMap;
pub use ast::{
    AggregateFunction, CompareOp, Comparison, FilterExpr, HavingExpr, HavingOperand, LogicalOp,
    LogicalPlan, OrderItem, SelectExpr, SelectItem, SortDirection,
};
pub use errors::{PlanError, PlanErrorCode, PlanResult, Severity};
pub use explain::ExplainPlan;
