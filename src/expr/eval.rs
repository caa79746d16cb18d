//! Tree-walking expression evaluator
//!
//! Evaluation binds exactly one name, `item`, the candidate element,
//! and is pure: no side effects, no mutation of the bound item.
//!
//! Comparison rules:
//! - Equality is value equality and never fails; values of different
//!   types are simply unequal.
//! - Ordered comparison (`<`, `<=`, `>`, `>=`, sort keys, max/min) is
//!   defined within a type only; comparing across types is an error,
//!   never a silent ordering.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::errors::{EvalError, EvalResult};

/// Evaluates an expression with `item` as the bound element.
pub fn evaluate(expr: &Expr, item: &Value) -> EvalResult<Value> {
    match expr {
        Expr::Item => Ok(item.clone()),
        Expr::Attribute { path } => resolve_path(item, path).cloned(),
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, item)?;
            apply_unary(*op, &value)
        }
        Expr::Binary { lhs, op, rhs } => apply_binary(lhs, *op, rhs, item),
    }
}

/// Resolves a dotted attribute path by sequential member lookup.
///
/// Fails on the first missing segment, naming it.
pub fn resolve_path<'a>(item: &'a Value, path: &[String]) -> EvalResult<&'a Value> {
    let mut current = item;
    for segment in path {
        current = current
            .get(segment)
            .ok_or_else(|| EvalError::AttributeNotFound {
                path: path.join("."),
                segment: segment.clone(),
            })?;
    }
    Ok(current)
}

/// Truthiness in predicate context: null and false are falsy, numbers
/// are truthy when non-zero, strings and containers when non-empty.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Natural ordering within a type; cross-type comparison is an error.
pub fn compare_values(a: &Value, b: &Value) -> EvalResult<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(xi), Some(yi)) = (x.as_i64(), y.as_i64()) {
                return Ok(xi.cmp(&yi));
            }
            let xf = x.as_f64().ok_or(EvalError::NonFinite)?;
            let yf = y.as_f64().ok_or(EvalError::NonFinite)?;
            xf.partial_cmp(&yf).ok_or(EvalError::Incomparable {
                lhs: type_name(a),
                rhs: type_name(b),
            })
        }
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        (Value::Null, Value::Null) => Ok(Ordering::Equal),
        _ => Err(EvalError::Incomparable {
            lhs: type_name(a),
            rhs: type_name(b),
        }),
    }
}

/// The value's type name, for error reporting
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn apply_unary(op: UnaryOp, value: &Value) -> EvalResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!truthy(value))),
        UnaryOp::Neg => match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::from(-i))
                } else {
                    let f = n.as_f64().ok_or(EvalError::NonFinite)?;
                    float_value(-f)
                }
            }
            other => Err(EvalError::InvalidOperand {
                op: "-",
                operand: type_name(other),
            }),
        },
    }
}

fn apply_binary(lhs: &Expr, op: BinaryOp, rhs: &Expr, item: &Value) -> EvalResult<Value> {
    // Boolean connectives short-circuit: the right operand is only
    // evaluated when the left side has not decided the result.
    match op {
        BinaryOp::And => {
            if !truthy(&evaluate(lhs, item)?) {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Bool(truthy(&evaluate(rhs, item)?)));
        }
        BinaryOp::Or => {
            if truthy(&evaluate(lhs, item)?) {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(truthy(&evaluate(rhs, item)?)));
        }
        _ => {}
    }

    let a = evaluate(lhs, item)?;
    let b = evaluate(rhs, item)?;

    match op {
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::Ne => Ok(Value::Bool(a != b)),
        BinaryOp::Lt => Ok(Value::Bool(compare_values(&a, &b)? == Ordering::Less)),
        BinaryOp::Le => Ok(Value::Bool(compare_values(&a, &b)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(compare_values(&a, &b)? == Ordering::Greater)),
        BinaryOp::Ge => Ok(Value::Bool(compare_values(&a, &b)? != Ordering::Less)),
        BinaryOp::Add => add_values(&a, &b),
        BinaryOp::Sub => numeric_op(&a, &b, "-", |x, y| x.checked_sub(y), |x, y| x - y),
        BinaryOp::Mul => numeric_op(&a, &b, "*", |x, y| x.checked_mul(y), |x, y| x * y),
        BinaryOp::Div => divide(&a, &b, "/"),
        BinaryOp::Mod => divide(&a, &b, "%"),
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

/// Addition; also concatenates two strings.
pub fn add_values(a: &Value, b: &Value) -> EvalResult<Value> {
    if let (Value::String(x), Value::String(y)) = (a, b) {
        let mut joined = x.clone();
        joined.push_str(y);
        return Ok(Value::String(joined));
    }
    numeric_op(a, b, "+", |x, y| x.checked_add(y), |x, y| x + y)
}

fn numeric_op(
    a: &Value,
    b: &Value,
    op: &'static str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> EvalResult<Value> {
    let (x, y) = number_pair(a, b, op)?;
    match (x, y) {
        (Num::Int(xi), Num::Int(yi)) => match int_op(xi, yi) {
            Some(result) => Ok(Value::from(result)),
            // Integer overflow widens to float rather than wrapping.
            None => float_value(float_op(xi as f64, yi as f64)),
        },
        _ => float_value(float_op(x.as_f64(), y.as_f64())),
    }
}

fn divide(a: &Value, b: &Value, op: &'static str) -> EvalResult<Value> {
    let (x, y) = number_pair(a, b, op)?;
    match (x, y) {
        (Num::Int(xi), Num::Int(yi)) => {
            if yi == 0 {
                return Err(EvalError::DivisionByZero);
            }
            // Natural integer division: truncating, like the host's.
            let result = if op == "%" { xi % yi } else { xi / yi };
            Ok(Value::from(result))
        }
        _ => {
            let (xf, yf) = (x.as_f64(), y.as_f64());
            if yf == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            float_value(if op == "%" { xf % yf } else { xf / yf })
        }
    }
}

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn number_pair(a: &Value, b: &Value, op: &'static str) -> EvalResult<(Num, Num)> {
    match (as_num(a), as_num(b)) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(EvalError::InvalidOperands {
            op,
            lhs: type_name(a),
            rhs: type_name(b),
        }),
    }
}

fn as_num(value: &Value) -> Option<Num> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Num::Int(i))
            } else {
                n.as_f64().map(Num::Float)
            }
        }
        _ => None,
    }
}

fn float_value(f: f64) -> EvalResult<Value> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or(EvalError::NonFinite)
}
