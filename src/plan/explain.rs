//! Explain output
//!
//! Describes how a plan would read the ledger and shape rows, without
//! issuing a single fetch.

use serde::Serialize;

use super::access::AccessPath;
use super::ast::LogicalPlan;
use super::errors::PlanError;

/// Explain plan output
#[derive(Debug, Clone, Serialize)]
pub struct ExplainPlan {
    /// Whether the plan would be accepted
    pub accepted: bool,
    /// Rendered access path (if accepted)
    pub access: Option<String>,
    /// Number of targeted fetches (0 for a full scan)
    pub fetches: Option<usize>,
    /// Group columns
    pub group_by: Vec<String>,
    /// Whether a having filter applies
    pub having: bool,
    /// Order description
    pub order_by: Vec<String>,
    /// Limit
    pub limit: Option<u64>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a compiled access path
    pub fn from_access(plan: &LogicalPlan, access: &AccessPath) -> Self {
        let order_by = plan
            .order_by
            .iter()
            .map(|o| format!("{} {}", o.column, o.direction.as_str()))
            .collect();

        Self {
            accepted: true,
            access: Some(access.to_string()),
            fetches: Some(access.fetch_count()),
            group_by: plan.group_by.clone(),
            having: plan.having.is_some(),
            order_by,
            limit: plan.limit,
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Creates an explain plan from a planning error
    pub fn from_error(err: &PlanError) -> Self {
        Self {
            accepted: false,
            access: None,
            fetches: None,
            group_by: Vec::new(),
            having: false,
            order_by: Vec::new(),
            limit: None,
            rejection_reason: Some(err.message().to_string()),
            rejection_code: Some(err.code().code().to_string()),
        }
    }
}
