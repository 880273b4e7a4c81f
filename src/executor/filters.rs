//! HAVING evaluation
//!
//! Filters groups by comparisons whose left side is a group column or an
//! aggregate and whose right side is a literal. The literal is coerced to
//! the type of the value it is compared with. A null left side never
//! matches.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::frame::{Group, GroupedFrame, Value};
use crate::plan::{CompareOp, HavingExpr, HavingOperand, LogicalOp, PlanError, PlanResult};

use super::translator::strip_quotes;

/// Evaluates HAVING trees against groups
pub struct HavingFilter;

impl HavingFilter {
    /// Returns the groups satisfying `having`
    pub fn apply(grouped: &GroupedFrame, having: &HavingExpr) -> PlanResult<GroupedFrame> {
        // Shape errors must surface even when there are no groups to test
        Self::check_arity(having)?;
        grouped.filter(|g, group| Self::matches(g, group, having))
    }

    fn check_arity(expr: &HavingExpr) -> PlanResult<()> {
        match expr {
            HavingExpr::Comparison { .. } => Ok(()),
            HavingExpr::Logical { operands, .. } => match operands.as_slice() {
                [left, right] => {
                    Self::check_arity(left)?;
                    Self::check_arity(right)
                }
                _ => Err(PlanError::malformed_logical_operation(operands.len())),
            },
        }
    }

    fn matches(grouped: &GroupedFrame, group: &Group, expr: &HavingExpr) -> PlanResult<bool> {
        match expr {
            HavingExpr::Comparison { left, op, value } => {
                let (label, actual) = match left {
                    HavingOperand::Column(column) => {
                        (column.clone(), grouped.column_value(group, column)?)
                    }
                    HavingOperand::Aggregate { function, column } => (
                        function.label(column.as_deref()),
                        grouped.aggregate(group, *function, column.as_deref())?,
                    ),
                };

                if actual.is_null() {
                    return Ok(false);
                }

                let expected = coerce_literal(&actual, &label, value)?;
                Ok(Self::compare(*op, actual.sort_cmp(&expected)))
            }
            HavingExpr::Logical { op, operands } => match operands.as_slice() {
                [left, right] => {
                    let left = Self::matches(grouped, group, left)?;
                    match op {
                        LogicalOp::And => Ok(left && Self::matches(grouped, group, right)?),
                        LogicalOp::Or => Ok(left || Self::matches(grouped, group, right)?),
                    }
                }
                _ => Err(PlanError::malformed_logical_operation(operands.len())),
            },
        }
    }

    fn compare(op: CompareOp, ordering: Ordering) -> bool {
        match op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
        }
    }
}

/// Parses `literal` as the same kind of value as `actual`
fn coerce_literal(actual: &Value, label: &str, literal: &str) -> PlanResult<Value> {
    let text = strip_quotes(literal);
    let invalid = |reason: String| PlanError::invalid_literal(label, literal, reason);

    match actual {
        Value::Integer(_) => match text.parse::<i64>() {
            Ok(i) => Ok(Value::Integer(i)),
            Err(e) => text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| invalid(e.to_string())),
        },
        Value::Float(_) => text
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| invalid(e.to_string())),
        Value::Boolean(_) => text
            .to_ascii_lowercase()
            .parse::<bool>()
            .map(Value::Boolean)
            .map_err(|e| invalid(e.to_string())),
        Value::Timestamp(_) => DateTime::parse_from_rfc3339(text)
            .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
            .map_err(|e| invalid(e.to_string())),
        Value::Text(_) | Value::Null => Ok(Value::Text(text.to_string())),
    }
}
