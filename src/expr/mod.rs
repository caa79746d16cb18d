//! Expression AST and evaluator
//!
//! Queries carry their predicates, ordering keys, group keys and
//! projection specs as expression trees. The evaluator walks a tree with
//! a single bound name, `item`, the current element, and produces a
//! `serde_json::Value`.
//!
//! The AST is deliberately restricted: attribute access, literals,
//! comparisons, boolean connectives and arithmetic. There is no escape
//! hatch into host code; everything an expression can do is visible in
//! the `Expr` variants below.

mod ast;
mod errors;
mod eval;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use errors::{EvalError, EvalResult};
pub use eval::{add_values, compare_values, evaluate, resolve_path, truthy, type_name};
