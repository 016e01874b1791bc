//! Collaborator traits for the weft templating engine.
//!
//! The engine core performs no I/O of its own: templates are located and
//! read through a [`TemplateResolver`], cache lifetimes are governed by
//! [`TemplateValidity`] predicates attached to each resolution, and message
//! lookups go through a [`MessageResolver`]. This crate defines those seams
//! plus the stock implementations.
//!
//! ## Provided implementations
//!
//! - [`StringTemplateResolver`]: in-memory template sources
//! - [`FilesystemTemplateResolver`]: base-directory + suffix file loading
//! - [`InMemoryMessageResolver`]: pre-populated message table

mod messages;
mod resolver;
mod validity;

pub use messages::{InMemoryMessageResolver, MessageResolver};
pub use resolver::{
    FilesystemTemplateResolver, StringTemplateResolver, TemplateResolution, TemplateResolver,
};
pub use validity::{
    AlwaysValid, FileTimestampValidity, NonCacheable, TemplateValidity, TtlValidity,
};

use thiserror::Error;

/// Error type for template resolution and resource reading.
#[derive(Error, Debug, Clone)]
pub enum ResolverError {
    #[error("template resource not found: {0}")]
    NotFound(String),

    #[error("failed to read template resource '{resource}': {message}")]
    ReadFailed { resource: String, message: String },
}
