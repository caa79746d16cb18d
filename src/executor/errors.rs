//! Engine error taxonomy
//!
//! The message text of `InvalidAction` and `AttributeNotFound` is part
//! of the observable contract; existing callers match on it.

use thiserror::Error;

use crate::expr::EvalError;

/// Result type for query execution
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while executing a query
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Unknown action token
    #[error("Invalid action exception. {action} is unknown.")]
    InvalidAction { action: String },

    /// Blank column specification passed to an aggregate
    #[error("An attribute or the word 'item' is required as a parameter to .{command}")]
    AttributeRequired { command: String },

    /// Attribute-path resolution failure, or a bare column token other
    /// than `item`
    #[error(
        "The attribute '{column}' was not found in the specified collection's items. \
         If you meant to use the raw value of each item in the collection just use \
         the word 'item' as a parameter to .{command} or use .{command}()"
    )]
    AttributeNotFound { column: String, command: String },

    /// A filter, ordering key or projection expression failed to evaluate
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl EngineError {
    /// Unknown-action constructor
    pub fn invalid_action(action: impl Into<String>) -> Self {
        EngineError::InvalidAction {
            action: action.into(),
        }
    }

    /// Blank-column constructor
    pub fn attribute_required(command: impl Into<String>) -> Self {
        EngineError::AttributeRequired {
            command: command.into(),
        }
    }

    /// Missing-attribute constructor
    pub fn attribute_not_found(column: impl Into<String>, command: impl Into<String>) -> Self {
        EngineError::AttributeNotFound {
            column: column.into(),
            command: command.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_action_message_contract() {
        let err = EngineError::invalid_action("foo");
        assert_eq!(err.to_string(), "Invalid action exception. foo is unknown.");
    }

    #[test]
    fn test_attribute_not_found_message_contract() {
        let err = EngineError::attribute_not_found("item.banana", "max");
        assert_eq!(
            err.to_string(),
            "The attribute 'item.banana' was not found in the specified collection's \
             items. If you meant to use the raw value of each item in the collection \
             just use the word 'item' as a parameter to .max or use .max()"
        );
    }

    #[test]
    fn test_eval_errors_wrap_transparently() {
        let eval = EvalError::DivisionByZero;
        let err: EngineError = eval.clone().into();
        assert_eq!(err.to_string(), eval.to_string());
    }
}
