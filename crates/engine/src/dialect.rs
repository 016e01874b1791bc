//! Dialects and their frozen per-dialect processor indices.

use crate::processor::{AttributeProcessor, ElementProcessor, Matcher, Processor};
use crate::{EngineError, ExpressionEvaluator};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use weft_dom::{normalize_name, NodeKind};

/// A value a dialect contributes to the engine-wide execution attribute
/// map. Same-named attributes from two dialects are a configuration fault.
#[derive(Clone)]
pub enum ExecutionAttribute {
    Evaluator(Arc<dyn ExpressionEvaluator>),
    Value(Value),
}

/// Maps a source doctype (by its public/system identifier pair) to the
/// doctype that should be written on output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTypeTranslation {
    pub source_public_id: Option<String>,
    pub source_system_id: Option<String>,
    pub target_public_id: Option<String>,
    pub target_system_id: Option<String>,
}

/// Identifies a doctype a dialect knows how to resolve locally (e.g. a
/// bundled DTD), keyed by its public/system identifier pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTypeResolutionEntry {
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    /// Symbolic name of the local resource backing the identifiers. Two
    /// dialects declaring the same identifiers must agree on this.
    pub resource: String,
}

/// A named bundle of processors plus metadata contributed to the engine.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &str;

    /// The namespace prefix this dialect claims (`None` = unprefixed
    /// names). May be overridden at registration time.
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// When true, elements/attributes under this dialect's prefix with no
    /// matching processor are silently ignored instead of failing.
    fn is_lenient(&self) -> bool {
        false
    }

    fn processors(&self) -> Vec<Processor>;

    fn execution_attributes(&self) -> Vec<(String, ExecutionAttribute)> {
        Vec::new()
    }

    fn doc_type_translations(&self) -> Vec<DocTypeTranslation> {
        Vec::new()
    }

    fn doc_type_resolution_entries(&self) -> Vec<DocTypeResolutionEntry> {
        Vec::new()
    }
}

/// A dialect bound to its effective prefix, with the dialect's processors
/// indexed by the (prefixed, normalized) name they target.
///
/// Built once at registration and never mutated afterwards.
pub struct DialectConfiguration {
    dialect: Arc<dyn Dialect>,
    prefix: Option<String>,
    element_processors: HashMap<String, Vec<Arc<dyn ElementProcessor>>>,
    attribute_processors: HashMap<String, Vec<Arc<dyn AttributeProcessor>>>,
    node_kind_processors: HashMap<NodeKind, Vec<Arc<dyn ElementProcessor>>>,
}

impl DialectConfiguration {
    /// Indexes a dialect under its own prefix.
    pub fn new(dialect: Arc<dyn Dialect>) -> Result<Self, EngineError> {
        let prefix = dialect.prefix().map(str::to_string);
        Self::with_prefix(prefix, dialect)
    }

    /// Indexes a dialect under an explicit prefix (overriding the
    /// dialect's own).
    pub fn with_prefix(
        prefix: Option<String>,
        dialect: Arc<dyn Dialect>,
    ) -> Result<Self, EngineError> {
        let prefix = prefix.map(|p| normalize_name(&p));

        let mut element_processors: HashMap<String, Vec<Arc<dyn ElementProcessor>>> =
            HashMap::new();
        let mut attribute_processors: HashMap<String, Vec<Arc<dyn AttributeProcessor>>> =
            HashMap::new();
        let mut node_kind_processors: HashMap<NodeKind, Vec<Arc<dyn ElementProcessor>>> =
            HashMap::new();

        for processor in dialect.processors() {
            match processor {
                Processor::Element(processor) => match processor.matcher() {
                    Matcher::ElementName(name) => {
                        let key = prefixed_name(prefix.as_deref(), &name);
                        element_processors.entry(key).or_default().push(processor);
                    }
                    Matcher::NodeKind(kind) => {
                        node_kind_processors.entry(kind).or_default().push(processor);
                    }
                    Matcher::AttributeName(name) => {
                        return Err(EngineError::Configuration(format!(
                            "dialect \"{}\" declares an element processor with an \
                             attribute-name matcher (\"{}\")",
                            dialect.name(),
                            name
                        )));
                    }
                },
                Processor::Attribute(processor) => match processor.matcher() {
                    Matcher::AttributeName(name) => {
                        let key = prefixed_name(prefix.as_deref(), &name);
                        attribute_processors.entry(key).or_default().push(processor);
                    }
                    other => {
                        return Err(EngineError::Configuration(format!(
                            "dialect \"{}\" declares an attribute processor with a \
                             non-attribute matcher ({:?})",
                            dialect.name(),
                            other
                        )));
                    }
                },
            }
        }

        Ok(DialectConfiguration {
            dialect,
            prefix,
            element_processors,
            attribute_processors,
            node_kind_processors,
        })
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn is_lenient(&self) -> bool {
        self.dialect.is_lenient()
    }

    /// The `xmlns` declaration attribute this dialect's prefix would use
    /// in a template (`xmlns:wf` for prefix `wf`).
    pub fn xmlns_attribute_name(&self) -> Option<String> {
        self.prefix.as_ref().map(|p| format!("xmlns:{p}"))
    }

    pub(crate) fn element_processors(
        &self,
    ) -> &HashMap<String, Vec<Arc<dyn ElementProcessor>>> {
        &self.element_processors
    }

    pub(crate) fn attribute_processors(
        &self,
    ) -> &HashMap<String, Vec<Arc<dyn AttributeProcessor>>> {
        &self.attribute_processors
    }

    pub(crate) fn node_kind_processors(
        &self,
    ) -> &HashMap<NodeKind, Vec<Arc<dyn ElementProcessor>>> {
        &self.node_kind_processors
    }
}

fn prefixed_name(prefix: Option<&str>, name: &str) -> String {
    let name = normalize_name(name);
    match prefix {
        Some(prefix) => format!("{prefix}:{name}"),
        None => name,
    }
}
