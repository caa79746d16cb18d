//! Column resolution and scalar reductions
//!
//! An aggregate names its input with a column specification string:
//! `"item"` (any casing) means the raw element, an `"item."` prefix
//! names a dotted attribute path, anything else is rejected. The empty
//! sequence short-circuits to 0 in the provider before the column is
//! even validated, matching the engine's observable contract.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::expr::{self, EvalError};

use super::errors::{EngineError, EngineResult};

/// Resolves aggregate columns and reduces them
pub struct AggregateStage;

impl AggregateStage {
    /// Resolves a column specification into one scalar per item.
    ///
    /// `command` is the requesting action's name; it is embedded in
    /// every failure message.
    pub fn resolve_column(
        items: &[Value],
        column: &str,
        command: &str,
    ) -> EngineResult<Vec<Value>> {
        if column.trim().is_empty() {
            return Err(EngineError::attribute_required(command));
        }

        if let Some(rest) = column.strip_prefix("item.") {
            let path: Vec<String> = rest.split('.').map(str::to_string).collect();
            return items
                .iter()
                .map(|item| {
                    expr::resolve_path(item, &path)
                        .map(Value::clone)
                        .map_err(|_| EngineError::attribute_not_found(column, command))
                })
                .collect();
        }

        if column.eq_ignore_ascii_case("item") {
            return Ok(items.to_vec());
        }

        Err(EngineError::attribute_not_found(column, command))
    }

    /// Largest value under natural ordering; the first-encountered
    /// extreme wins ties.
    pub fn max(values: &[Value]) -> EngineResult<Value> {
        Self::extreme(values, Ordering::Greater)
    }

    /// Smallest value under natural ordering; the first-encountered
    /// extreme wins ties.
    pub fn min(values: &[Value]) -> EngineResult<Value> {
        Self::extreme(values, Ordering::Less)
    }

    fn extreme(values: &[Value], wanted: Ordering) -> EngineResult<Value> {
        let mut iter = values.iter();
        let mut best = match iter.next() {
            Some(first) => first.clone(),
            None => return Ok(Value::from(0)),
        };
        for candidate in iter {
            if expr::compare_values(candidate, &best)? == wanted {
                best = candidate.clone();
            }
        }
        Ok(best)
    }

    /// Reduction by repeated addition.
    pub fn sum(values: &[Value]) -> EngineResult<Value> {
        let mut iter = values.iter();
        let mut total = match iter.next() {
            Some(first) => first.clone(),
            None => return Ok(Value::from(0)),
        };
        for value in iter {
            total = expr::add_values(&total, value)?;
        }
        Ok(total)
    }

    /// Sum divided by element count, using the value type's natural
    /// division: an all-integer input divides truncating, a floating
    /// input divides in `f64`.
    pub fn avg(values: &[Value]) -> EngineResult<Value> {
        if values.is_empty() {
            return Ok(Value::from(0));
        }
        let total = Self::sum(values)?;
        let count = values.len();

        if let Value::Number(n) = &total {
            if let Some(i) = n.as_i64() {
                return Ok(Value::from(i / count as i64));
            }
            if let Some(f) = n.as_f64() {
                return Number::from_f64(f / count as f64)
                    .map(Value::Number)
                    .ok_or_else(|| EvalError::NonFinite.into());
            }
        }

        Err(EvalError::InvalidOperands {
            op: "/",
            lhs: expr::type_name(&total),
            rhs: "number",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numbers(values: &[i64]) -> Vec<Value> {
        values.iter().map(|v| json!(v)).collect()
    }

    #[test]
    fn test_bare_item_resolves_to_raw_elements() {
        let items = numbers(&[1, 2, 3]);
        let resolved = AggregateStage::resolve_column(&items, "item", "sum").unwrap();
        assert_eq!(resolved, items);

        // Case-insensitive.
        let resolved = AggregateStage::resolve_column(&items, "ITEM", "sum").unwrap();
        assert_eq!(resolved, items);
    }

    #[test]
    fn test_item_prefix_resolves_path() {
        let items = vec![json!({"value": 10}), json!({"value": 20})];
        let resolved = AggregateStage::resolve_column(&items, "item.value", "max").unwrap();
        assert_eq!(resolved, numbers(&[10, 20]));
    }

    #[test]
    fn test_nested_path_resolution() {
        let items = vec![json!({"a": {"b": 1}}), json!({"a": {"b": 2}})];
        let resolved = AggregateStage::resolve_column(&items, "item.a.b", "min").unwrap();
        assert_eq!(resolved, numbers(&[1, 2]));
    }

    #[test]
    fn test_blank_column_is_rejected_first() {
        let items = numbers(&[1]);
        let err = AggregateStage::resolve_column(&items, "  ", "avg").unwrap_err();
        assert_eq!(err, EngineError::attribute_required("avg"));
    }

    #[test]
    fn test_unknown_bare_token_is_not_found() {
        let items = numbers(&[1]);
        let err = AggregateStage::resolve_column(&items, "banana", "max").unwrap_err();
        assert_eq!(err, EngineError::attribute_not_found("banana", "max"));
    }

    #[test]
    fn test_unresolvable_path_reports_full_column() {
        let items = vec![json!({"value": 1}), json!({})];
        let err = AggregateStage::resolve_column(&items, "item.value", "sum").unwrap_err();
        assert_eq!(err, EngineError::attribute_not_found("item.value", "sum"));
    }

    #[test]
    fn test_max_min() {
        let values = numbers(&[3, 1, 4, 1, 5]);
        assert_eq!(AggregateStage::max(&values).unwrap(), json!(5));
        assert_eq!(AggregateStage::min(&values).unwrap(), json!(1));
    }

    #[test]
    fn test_max_ties_keep_first_encountered() {
        let values = vec![json!(2.0), json!(2), json!(1)];
        // 2.0 and 2 compare equal; the earlier float stays.
        assert_eq!(AggregateStage::max(&values).unwrap(), json!(2.0));
    }

    #[test]
    fn test_sum_integer_stays_integral() {
        assert_eq!(AggregateStage::sum(&numbers(&[1, 2, 3])).unwrap(), json!(6));
    }

    #[test]
    fn test_sum_promotes_on_float() {
        let values = vec![json!(1), json!(2.5)];
        assert_eq!(AggregateStage::sum(&values).unwrap(), json!(3.5));
    }

    #[test]
    fn test_avg_integer_truncates() {
        assert_eq!(AggregateStage::avg(&numbers(&[1, 2])).unwrap(), json!(1));
        assert_eq!(AggregateStage::avg(&numbers(&[2, 4, 6])).unwrap(), json!(4));
    }

    #[test]
    fn test_avg_float_divides_exactly() {
        let values = vec![json!(1.0), json!(2.0)];
        assert_eq!(AggregateStage::avg(&values).unwrap(), json!(1.5));
    }

    #[test]
    fn test_incomparable_values_fail_max() {
        let values = vec![json!(1), json!("a")];
        assert!(AggregateStage::max(&values).is_err());
    }

    #[test]
    fn test_non_addable_values_fail_sum() {
        let values = vec![json!(true), json!(false)];
        assert!(AggregateStage::sum(&values).is_err());
    }
}
