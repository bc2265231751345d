//! Runtime error types for the WAEL evaluator.

use thiserror::Error;
use wael_types::ErrorList;

/// Evaluation error. Every variant aborts the whole evaluation.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    /// The source did not lex or parse.
    #[error("syntax error: {0}")]
    Syntax(ErrorList),

    /// An operand or argument had the wrong kind of value.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// No arithmetic, pipe or concatenation rule matched the operands.
    #[error("operation not supported: {0}")]
    OperationNotSupported(String),

    /// Unknown accessor name for the value's kind.
    #[error("property \"{property}\" not accessible on {target}")]
    PropertyNotFound { property: String, target: String },

    /// A file or network import could not be read or understood.
    #[error("unable to import {uri}: {reason}")]
    ImportFailed { uri: String, reason: String },
}

impl EvalError {
    pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::OperationNotSupported(message.into())
    }

    pub(crate) fn import_failed(uri: impl Into<String>, reason: impl ToString) -> Self {
        Self::ImportFailed {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
