//! Explain output for query plans
//!
//! Deterministic, human-readable description of the remote call(s) a
//! query would issue. Building it never touches the folder's store.

use std::fmt;

use super::planner::QueryPlan;

/// Explain plan output
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainPlan {
    /// Access path name
    pub access: String,
    /// Restriction as text
    pub restriction: String,
    /// Fields requested from the store
    pub fields: Vec<String>,
    /// Ordering sent to the store
    pub server_order: Vec<String>,
    /// Ordering applied locally
    pub client_order: Vec<String>,
    /// Fields fetched only for sorting
    pub sort_only_fields: Vec<String>,
    pub page_size: Option<usize>,
    pub max_items: Option<usize>,
    pub calendar_view: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a query plan
    pub fn from_plan(plan: &QueryPlan) -> Self {
        let orders = |orders: &Option<Vec<crate::fields::FieldOrder>>| -> Vec<String> {
            orders
                .iter()
                .flatten()
                .map(ToString::to_string)
                .collect()
        };

        Self {
            access: plan.access.as_str().to_string(),
            restriction: plan.restriction.to_string(),
            fields: plan.additional_fields.iter().map(|p| p.path()).collect(),
            server_order: orders(&plan.server_order),
            client_order: orders(&plan.client_order),
            sort_only_fields: plan.sort_only_fields.iter().map(|p| p.path()).collect(),
            page_size: plan.page_size,
            max_items: plan.max_items,
            calendar_view: plan
                .calendar_view
                .map(|v| format!("{} .. {}", v.start.to_rfc3339(), v.end.to_rfc3339())),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        writeln!(f, "Access: {}", self.access)?;
        writeln!(f, "Restriction: {}", self.restriction)?;
        if !self.fields.is_empty() {
            writeln!(f, "Fields: {}", self.fields.join(", "))?;
        }
        if !self.server_order.is_empty() {
            writeln!(f, "Server Order: {}", self.server_order.join(", "))?;
        }
        if !self.client_order.is_empty() {
            writeln!(f, "Client Order: {}", self.client_order.join(", "))?;
        }
        if !self.sort_only_fields.is_empty() {
            writeln!(f, "Sort-only Fields: {}", self.sort_only_fields.join(", "))?;
        }
        if let Some(view) = &self.calendar_view {
            writeln!(f, "Calendar View: {}", view)?;
        }
        if let Some(page_size) = self.page_size {
            writeln!(f, "Page Size: {}", page_size)?;
        }
        if let Some(max_items) = self.max_items {
            writeln!(f, "Max Items: {}", max_items)?;
        }
        Ok(())
    }
}
