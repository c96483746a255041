//! Change planning
//!
//! Compares a declared rule with its tracked state and decides what the
//! next apply has to do.

use crate::dataarts::rule::non_empty;
use crate::dataarts::{RuleConfig, RuleState};
use std::fmt;

/// What apply will do for one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    NoChange,
    Create,
    /// In-place update; lists the mutable fields that differ
    Update { changed: Vec<&'static str> },
    /// Delete then create; lists the immutable fields that differ
    Replace { forced_by: Vec<&'static str> },
    /// Tracked but no longer declared
    Delete,
}

impl PlanAction {
    pub fn symbol(&self) -> &'static str {
        match self {
            PlanAction::NoChange => " ",
            PlanAction::Create => "+",
            PlanAction::Update { .. } => "~",
            PlanAction::Replace { .. } => "-/+",
            PlanAction::Delete => "-",
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, PlanAction::NoChange)
    }
}

/// Planned action for one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub address: String,
    pub action: PlanAction,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3} {}", self.action.symbol(), self.address)?;
        match &self.action {
            PlanAction::NoChange => write!(f, " (no changes)"),
            PlanAction::Create => write!(f, " (create)"),
            PlanAction::Update { changed } => write!(f, " (update: {})", changed.join(", ")),
            PlanAction::Replace { forced_by } => {
                write!(f, " (replace, forced by: {})", forced_by.join(", "))
            }
            PlanAction::Delete => write!(f, " (delete)"),
        }
    }
}

/// Optional declared string against a state value; unset equals empty
fn optional_differs(declared: &Option<String>, observed: &str) -> bool {
    non_empty(declared).unwrap_or("") != observed
}

/// Plan one declared rule against its prior state
///
/// `default_region` resolves rules that do not declare a region.
pub fn plan_rule(declared: &RuleConfig, prior: Option<&RuleState>, default_region: Option<&str>) -> PlanAction {
    let Some(prior) = prior else {
        return PlanAction::Create;
    };

    let mut forced_by = Vec::new();
    let region = non_empty(&declared.region).or(default_region);
    if region.is_some_and(|r| r != prior.region) {
        forced_by.push("region");
    }
    if declared.workspace_id != prior.workspace_id {
        forced_by.push("workspace_id");
    }
    if declared.rule_type != prior.rule_type {
        forced_by.push("rule_type");
    }
    if declared.name != prior.name {
        forced_by.push("name");
    }
    if optional_differs(&declared.builtin_rule_id, &prior.builtin_rule_id) {
        forced_by.push("builtin_rule_id");
    }
    if !forced_by.is_empty() {
        return PlanAction::Replace { forced_by };
    }

    let mut changed = Vec::new();
    if declared.secrecy_level_id != prior.secrecy_level_id {
        changed.push("secrecy_level_id");
    }
    if optional_differs(&declared.content_expression, &prior.content_expression) {
        changed.push("content_expression");
    }
    if optional_differs(&declared.column_expression, &prior.column_expression) {
        changed.push("column_expression");
    }
    if optional_differs(&declared.comment_expression, &prior.comment_expression) {
        changed.push("comment_expression");
    }
    if optional_differs(&declared.description, &prior.description) {
        changed.push("description");
    }
    if optional_differs(&declared.category_id, &prior.category_id) {
        changed.push("category_id");
    }
    // method is computed when left unset
    if let Some(method) = non_empty(&declared.method) {
        if method != prior.method {
            changed.push("method");
        }
    }

    if changed.is_empty() {
        PlanAction::NoChange
    } else {
        PlanAction::Update { changed }
    }
}
