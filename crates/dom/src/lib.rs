//! Owned markup tree for the weft templating engine.
//!
//! This crate defines the in-memory representation of a parsed template:
//! a [`Document`] holding an optional doctype and a tree of [`Node`]s,
//! together with the [`TemplateMode`] taxonomy and the serializer that
//! turns a transformed tree back into markup text.
//!
//! Processor applicability is tracked directly on the nodes through the
//! `executable` / `subtree_executable` flags, so that the transformation
//! walk can skip whole subtrees and so that markup produced by evaluating
//! expressions can be permanently excluded from re-processing.

mod mode;
mod node;
pub mod write;

pub use mode::TemplateMode;
pub use node::{
    name_prefix, normalize_name, Attribute, Comment, DocType, Document, Element, Node, NodeKind,
    Text, NON_MINIMIZABLE_SENTINEL,
};

use thiserror::Error;

/// Errors raised while building or serializing a markup tree.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("invalid document structure: {0}")]
    InvalidStructure(String),

    #[error("serialization error: {0}")]
    Write(#[from] std::io::Error),
}
