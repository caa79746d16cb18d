//! Expression evaluation errors

use thiserror::Error;

/// Result type for expression evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors raised while evaluating an expression against a bound item
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A segment of an attribute path did not resolve
    #[error("the attribute path '{path}' could not be resolved: no member '{segment}'")]
    AttributeNotFound { path: String, segment: String },

    /// Ordered comparison between values of incompatible types
    #[error("cannot compare {lhs} with {rhs}")]
    Incomparable {
        lhs: &'static str,
        rhs: &'static str,
    },

    /// Unary operator applied to an unsupported operand
    #[error("operator '{op}' is not defined for {operand}")]
    InvalidOperand {
        op: &'static str,
        operand: &'static str,
    },

    /// Binary operator applied to unsupported operands
    #[error("operator '{op}' is not defined for {lhs} and {rhs}")]
    InvalidOperands {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    /// Division or remainder with a zero denominator
    #[error("division by zero")]
    DivisionByZero,

    /// Arithmetic escaped the representable range
    #[error("arithmetic produced a non-finite number")]
    NonFinite,
}
