//! Relational processor
//!
//! Shapes the flattened ledger frame into the final result.
//!
//! # Pipeline (strict order)
//!
//! Grouped (GROUP BY present):
//! 1. Partition rows by the group columns
//! 2. Apply HAVING, if present
//! 3. Project the select list, one row per group
//! 4. Apply ORDER BY
//! 5. Apply LIMIT
//!
//! Ungrouped:
//! 1. Apply ORDER BY to the unprojected frame
//! 2. Apply LIMIT
//! 3. Project the select list
//!
//! Ordering and limiting before projection lets ORDER BY reference columns
//! that are not selected. Every step returns a new frame.

use crate::frame::Frame;
use crate::plan::{LogicalPlan, PlanError, PlanResult};

use super::filters::HavingFilter;
use super::sorter::RowSorter;

/// Applies group/having/select/order/limit to a frame
pub struct RelationalProcessor;

impl RelationalProcessor {
    pub fn process(frame: &Frame, plan: &LogicalPlan) -> PlanResult<Frame> {
        if plan.is_grouped() {
            Self::process_grouped(frame, plan)
        } else {
            Self::process_flat(frame, plan)
        }
    }

    fn process_grouped(frame: &Frame, plan: &LogicalPlan) -> PlanResult<Frame> {
        let grouped = frame.group(&plan.group_by)?;

        let grouped = match &plan.having {
            Some(having) => HavingFilter::apply(&grouped, having)?,
            None => grouped,
        };

        let projected = grouped.select(&plan.select)?;
        let ordered = Self::order(projected, plan)?;
        Ok(Self::limit(ordered, plan))
    }

    fn process_flat(frame: &Frame, plan: &LogicalPlan) -> PlanResult<Frame> {
        if plan.having.is_some() {
            return Err(PlanError::invalid_aggregate("HAVING requires GROUP BY"));
        }

        let ordered = if plan.order_by.is_empty() {
            frame.clone()
        } else {
            RowSorter::sort(frame, &plan.order_by)?
        };
        let limited = Self::limit(ordered, plan);

        if plan.select.is_empty() {
            return Ok(limited);
        }
        limited.select(&plan.select)
    }

    fn order(frame: Frame, plan: &LogicalPlan) -> PlanResult<Frame> {
        if plan.order_by.is_empty() {
            return Ok(frame);
        }
        RowSorter::sort(&frame, &plan.order_by)
    }

    fn limit(frame: Frame, plan: &LogicalPlan) -> Frame {
        match plan.limit {
            Some(n) => frame.limit(n),
            None => frame,
        }
    }
}
