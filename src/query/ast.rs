//! Query and action definitions

use serde::{Deserialize, Serialize};

use crate::expr::Expr;

/// The requested operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Return the filtered/sorted/grouped elements themselves
    SelectMany,
    /// Project each element into a fixed-schema record
    Select,
    Count,
    Max,
    Min,
    Sum,
    Avg,
}

impl Action {
    /// The action's token, as front ends spell it
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::SelectMany => "select_many",
            Action::Select => "select",
            Action::Count => "count",
            Action::Max => "max",
            Action::Min => "min",
            Action::Sum => "sum",
            Action::Avg => "avg",
        }
    }

    /// Returns true for the column-reducing actions
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Action::Count | Action::Max | Action::Min | Action::Sum | Action::Avg
        )
    }
}

/// An immutable query: filters, ordering keys, optional group key.
///
/// Filters combine as a pure intersection. Ordering keys are listed
/// primary-first; a key wrapped in unary negation sorts descending.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Filter expressions, applied left to right (AND semantics)
    pub filters: Vec<Expr>,
    /// Ordering keys, highest priority first
    pub order: Vec<Expr>,
    /// Group key, if grouping was requested
    pub group: Option<Expr>,
}

impl Query {
    /// Creates an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter predicate
    pub fn with_filter(mut self, predicate: Expr) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Appends an ordering key (wrap in `Expr::neg` for descending)
    pub fn order_by(mut self, key: Expr) -> Self {
        self.order.push(key);
        self
    }

    /// Sets the group key
    pub fn group_by(mut self, key: Expr) -> Self {
        self.group = Some(key);
        self
    }
}
