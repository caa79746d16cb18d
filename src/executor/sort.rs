//! Multi-key stable sorting
//!
//! The comparator walks the ordering keys in priority order and stops at
//! the first key that separates the two items; a full tie keeps the
//! original input order (the underlying sort is stable). The key list is
//! always an explicit parameter of the call; comparator state must
//! never live on a shared provider, or concurrent executions would
//! corrupt each other's comparisons.

use std::cmp::Ordering;

use serde_json::Value;

use crate::expr::{self, Expr, UnaryOp};

use super::errors::{EngineError, EngineResult};

/// Sorts items by a prioritized list of key expressions
pub struct SortStage;

impl SortStage {
    /// Stable multi-key sort. Comparison failures (incompatible key
    /// types, unresolvable attributes) abort the sort.
    pub fn sort(items: &mut [Value], keys: &[Expr]) -> EngineResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        // sort_by has an infallible comparator; the first failure is
        // parked here and the remaining comparisons collapse to Equal.
        let mut failure: Option<EngineError> = None;
        items.sort_by(|a, b| {
            if failure.is_some() {
                return Ordering::Equal;
            }
            match Self::compare(a, b, keys) {
                Ok(ordering) => ordering,
                Err(err) => {
                    failure = Some(err);
                    Ordering::Equal
                }
            }
        });

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Compares two items under the given keys, highest priority first.
    ///
    /// A key wrapped in unary negation contributes its inverted
    /// ordering. Attribute keys resolve their path on both sides; any
    /// other key expression is evaluated once per side.
    pub fn compare(a: &Value, b: &Value, keys: &[Expr]) -> EngineResult<Ordering> {
        for key in keys {
            let (key, negated) = unwrap_negation(key);

            let ordering = match key {
                Expr::Attribute { path } => {
                    let left = expr::resolve_path(a, path)?;
                    let right = expr::resolve_path(b, path)?;
                    expr::compare_values(left, right)?
                }
                other => {
                    let left = expr::evaluate(other, a)?;
                    let right = expr::evaluate(other, b)?;
                    expr::compare_values(&left, &right)?
                }
            };

            let ordering = if negated { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }
}

/// Strips an outer `Neg` wrapper, reporting whether one was present.
fn unwrap_negation(key: &Expr) -> (&Expr, bool) {
    match key {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => (operand.as_ref(), true),
        other => (other, false),
    }
}
