//! Predicate filtering
//!
//! Keeps the elements for which a predicate expression evaluates truthy,
//! preserving relative order. A query's accumulated filters are applied
//! as successive narrowing passes, one per predicate, left to right:
//! the set is the same as a single conjunction pass, the work is not.

use serde_json::Value;

use crate::expr::{self, Expr};

use super::errors::EngineResult;

/// Applies filter expressions to a sequence
pub struct FilterStage;

impl FilterStage {
    /// One narrowing pass: keep elements where `predicate` is truthy.
    pub fn apply(items: Vec<Value>, predicate: &Expr) -> EngineResult<Vec<Value>> {
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if expr::truthy(&expr::evaluate(predicate, &item)?) {
                kept.push(item);
            }
        }
        Ok(kept)
    }

    /// Applies every predicate in turn (AND semantics).
    pub fn apply_all(items: Vec<Value>, predicates: &[Expr]) -> EngineResult<Vec<Value>> {
        let mut current = items;
        for predicate in predicates {
            current = Self::apply(current, predicate)?;
        }
        Ok(current)
    }
}
