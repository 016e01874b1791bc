//! The weft template execution engine.
//!
//! Dialects contribute processors bound to element or attribute names (or a
//! node kind); this crate merges them into one queryable configuration,
//! resolves which processor applies to each node of a parsed tree, and runs
//! the transformation walk that rewrites the tree under a scoped,
//! copy-on-write execution context ([`Arguments`]).
//!
//! The engine is expression-agnostic: processors obtain the configured
//! [`ExpressionEvaluator`] through an execution attribute and hand the
//! engine back plain [`ProcessResult`] deltas.

mod annotate;
mod arguments;
mod config;
mod context;
mod dialect;
mod processor;
mod transform;

pub use annotate::annotate_document;
pub use arguments::Arguments;
pub use config::EngineConfiguration;
pub use context::Context;
pub use dialect::{
    Dialect, DialectConfiguration, DocTypeResolutionEntry, DocTypeTranslation, ExecutionAttribute,
};
pub use processor::{
    AttributeProcessor, DomAction, ElementProcessor, Matcher, ProcessResult, Processor,
    SubstitutionTag, TextInliner,
};
pub use transform::transform_document;

use thiserror::Error;

/// Execution-attribute key under which a dialect registers the expression
/// evaluator the engine's processors should use.
pub const EVALUATOR_EXECUTION_ATTRIBUTE: &str = "weft:expression-evaluator";

/// The expression collaborator: evaluates an expression string against the
/// current execution context. The engine never inspects expression syntax.
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(
        &self,
        arguments: &Arguments,
        expression: &str,
    ) -> Result<serde_json::Value, EngineError>;
}

/// Errors raised during configuration, resolution or transformation.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    Configuration(String),

    /// More than one processor from the merged dialect set claimed the same
    /// concrete node. Always fatal: it indicates a configuration bug, not
    /// bad template input.
    #[error("ambiguous dialect configuration: more than one processor applies to {kind} \"{name}\"")]
    AmbiguousProcessor { kind: &'static str, name: String },

    /// An element or attribute under a managed, non-lenient prefix had no
    /// resolvable processor.
    #[error("no processor in dialect found for {kind} \"{name}\" (prefix \"{prefix}\" is not lenient)")]
    NoProcessorFound {
        kind: &'static str,
        name: String,
        prefix: String,
    },

    #[error("expression evaluation error: {0}")]
    Expression(String),

    #[error("template processing error: {0}")]
    Processing(String),
}
