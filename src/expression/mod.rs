//! Expression evaluation
//!
//! The mapper treats evaluation as an opaque capability: an expression
//! string plus a variable context in, a `serde_json::Value` out. Any
//! `Evaluator` implementation can be plugged in; `PathEvaluator` is the
//! bundled one.

mod context;
mod path;
mod value;

pub use context::EvalContext;
pub use path::PathEvaluator;
pub use value::{scalar_text, type_name};

use serde_json::Value;
use thiserror::Error;

/// Errors raised while evaluating an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("syntax error in `{expression}`: {message}")]
    Syntax { expression: String, message: String },

    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    #[error("type error: {0}")]
    Type(String),
}

/// Result type for expression evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Evaluates expression text against a variable context.
///
/// Implementations must be side-effect free as far as the caller can tell.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, expression: &str, context: &EvalContext) -> EvalResult<Value>;
}
