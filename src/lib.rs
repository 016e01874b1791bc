//! weft — a markup templating engine.
//!
//! A weft template is ordinary HTML/XML annotated with dialect attributes
//! and tags. Registered processors rewrite the parsed tree — substituting
//! values, removing, duplicating and replacing nodes, injecting fragments
//! — and the result is serialized back to text.
//!
//! ```no_run
//! use std::sync::Arc;
//! use weft::{Context, TemplateEngine, TemplateMode};
//! use weft::resolver::StringTemplateResolver;
//!
//! let resolver = StringTemplateResolver::new(TemplateMode::Xhtml);
//! resolver.add_template("greeting", "<p wf:text=\"'Hello, ' + ${name}\">…</p>");
//!
//! let engine = TemplateEngine::new();
//! engine.add_template_resolver(Arc::new(resolver)).unwrap();
//!
//! let mut context = Context::new();
//! context.set_variable("name", serde_json::json!("Ada"));
//! let output = engine.process("greeting", &context).unwrap();
//! assert_eq!(output, "<p>Hello, Ada</p>");
//! ```
//!
//! The engine core (dialect registry, execution context, transformation
//! walk) lives in [`weft_engine`]; the stock `wf:*` processors and the
//! expression language live in [`weft_standard`]. Custom dialects plug in
//! through [`weft_engine::Dialect`].

mod engine;
mod error;
mod repository;

pub use engine::{TemplateEngine, DEFAULT_CACHE_CAPACITY};
pub use error::WeftError;
pub use repository::{Template, TemplateRepository};

pub use weft_dom::TemplateMode;
pub use weft_engine::Context;

/// Template and message resolution collaborators.
pub mod resolver {
    pub use weft_traits::{
        AlwaysValid, FileTimestampValidity, FilesystemTemplateResolver, InMemoryMessageResolver,
        MessageResolver, NonCacheable, ResolverError, StringTemplateResolver,
        TemplateResolution, TemplateResolver, TemplateValidity, TtlValidity,
    };
}

/// The engine-facing extension surface for custom dialects.
pub mod dialect {
    pub use weft_engine::{
        Arguments, AttributeProcessor, Dialect, DocTypeResolutionEntry, DocTypeTranslation,
        DomAction, ElementProcessor, EngineError, ExecutionAttribute, ExpressionEvaluator,
        Matcher, ProcessResult, Processor, SubstitutionTag, TextInliner,
        EVALUATOR_EXECUTION_ATTRIBUTE,
    };
    pub use weft_standard::StandardDialect;
}
