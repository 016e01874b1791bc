//! The standard weft dialect.
//!
//! Registers the stock processors under the `wf` prefix and contributes
//! the [`StandardExpressionEvaluator`] as the engine's expression
//! collaborator. Everything here is a *client* of the engine's processor
//! contract: the engine knows nothing about `wf:text` or `${...}` — it
//! only sees processors returning [`weft_engine::ProcessResult`] deltas.

pub mod expression;

mod dialect;
mod inliner;
mod processors;

pub use dialect::StandardDialect;
pub use expression::StandardExpressionEvaluator;
pub use inliner::StandardTextInliner;

use thiserror::Error;

/// Errors raised while parsing or evaluating standard-language expressions.
#[derive(Error, Debug)]
pub enum ExpressionError {
    #[error("could not parse expression \"{0}\": {1}")]
    Parse(String, String),

    #[error("could not evaluate expression: {0}")]
    Evaluation(String),
}

impl From<ExpressionError> for weft_engine::EngineError {
    fn from(e: ExpressionError) -> Self {
        weft_engine::EngineError::Expression(e.to_string())
    }
}
