//! Expression AST definitions
//!
//! The tagged variants an external parser (or caller code) produces and
//! the evaluator interprets. Trees are immutable once built.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unary operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Boolean negation
    Not,
    /// Numeric negation; wrapping an ordering key sorts it descending
    Neg,
}

/// Binary operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// Returns the operator's surface spelling
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

/// Expression AST node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// The bound element itself
    Item,
    /// Dotted attribute path resolved against the bound element
    Attribute { path: Vec<String> },
    /// Literal value
    Literal(Value),
    /// Unary operation
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Binary operation
    Binary {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Creates a reference to the bound element
    pub fn item() -> Self {
        Expr::Item
    }

    /// Creates an attribute reference from a dotted path, e.g. `"address.city"`
    pub fn attr(path: impl AsRef<str>) -> Self {
        Expr::Attribute {
            path: path.as_ref().split('.').map(str::to_string).collect(),
        }
    }

    /// Creates a literal expression
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    fn binary(lhs: Expr, op: BinaryOp, rhs: Expr) -> Self {
        Expr::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    /// Creates an equality comparison
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::Eq, rhs)
    }

    /// Creates a not-equal comparison
    pub fn ne(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::Ne, rhs)
    }

    /// Creates a less-than comparison
    pub fn lt(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::Lt, rhs)
    }

    /// Creates a less-than-or-equal comparison
    pub fn le(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::Le, rhs)
    }

    /// Creates a greater-than comparison
    pub fn gt(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::Gt, rhs)
    }

    /// Creates a greater-than-or-equal comparison
    pub fn ge(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::Ge, rhs)
    }

    /// Creates a boolean AND
    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::And, rhs)
    }

    /// Creates a boolean OR
    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::Or, rhs)
    }

    /// Creates a boolean negation
    pub fn not(operand: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    /// Wraps an expression in numeric negation.
    ///
    /// Used on an ordering key this flips the key to descending order.
    pub fn neg(operand: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
        }
    }

    /// Creates an addition
    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::Add, rhs)
    }

    /// Creates a subtraction
    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::Sub, rhs)
    }

    /// Creates a multiplication
    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::Mul, rhs)
    }

    /// Creates a division
    pub fn div(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::Div, rhs)
    }

    /// Creates a remainder
    pub fn rem(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOp::Mod, rhs)
    }

    /// Returns true if this node is an attribute reference
    pub fn is_attribute(&self) -> bool {
        matches!(self, Expr::Attribute { .. })
    }

    /// The dotted attribute path, if this node is an attribute reference
    pub fn attribute_path(&self) -> Option<String> {
        match self {
            Expr::Attribute { path } => Some(path.join(".")),
            _ => None,
        }
    }
}
