//! The merged, engine-wide dialect set.
//!
//! Built exactly once from the registered dialect configurations, then
//! read-only: safe for unsynchronized concurrent reads from every template
//! execution. Conflicts that indicate configuration bugs (duplicate
//! dialects, colliding execution attributes, disagreeing doctype metadata)
//! are raised eagerly here; same-name processors from different dialects
//! are *not* — that conflict only exists if both ever claim the same
//! concrete node, which is detected lazily at resolution time.

use crate::dialect::{
    DialectConfiguration, DocTypeResolutionEntry, DocTypeTranslation, ExecutionAttribute,
};
use crate::processor::{AttributeProcessor, ElementProcessor};
use crate::EngineError;
use std::collections::HashMap;
use std::sync::Arc;
use weft_dom::{Attribute, DocType, Element, NodeKind};
use weft_traits::MessageResolver;

/// A merged candidate entry: the processor plus the name of the dialect it
/// came from (for diagnostics).
pub(crate) struct Candidate<P: ?Sized> {
    pub dialect_name: String,
    pub processor: Arc<P>,
}

pub struct EngineConfiguration {
    dialect_configurations: Vec<DialectConfiguration>,
    element_processors: HashMap<String, Vec<Candidate<dyn ElementProcessor>>>,
    attribute_processors: HashMap<String, Vec<Candidate<dyn AttributeProcessor>>>,
    node_kind_processors: HashMap<NodeKind, Vec<Candidate<dyn ElementProcessor>>>,
    // prefix (None = unprefixed names) -> lenient, OR-ed across dialects.
    prefixes: HashMap<Option<String>, bool>,
    execution_attributes: HashMap<String, ExecutionAttribute>,
    doc_type_translations: Vec<DocTypeTranslation>,
    doc_type_resolution_entries: Vec<DocTypeResolutionEntry>,
    message_resolvers: Vec<Arc<dyn MessageResolver>>,
}

impl EngineConfiguration {
    /// Merges the dialect configurations, in declaration order, into one
    /// queryable index.
    pub fn build(
        dialect_configurations: Vec<DialectConfiguration>,
        message_resolvers: Vec<Arc<dyn MessageResolver>>,
    ) -> Result<Self, EngineError> {
        if dialect_configurations.is_empty() {
            return Err(EngineError::Configuration(
                "no dialect has been specified".to_string(),
            ));
        }

        let mut element_processors: HashMap<String, Vec<Candidate<dyn ElementProcessor>>> =
            HashMap::new();
        let mut attribute_processors: HashMap<String, Vec<Candidate<dyn AttributeProcessor>>> =
            HashMap::new();
        let mut node_kind_processors: HashMap<NodeKind, Vec<Candidate<dyn ElementProcessor>>> =
            HashMap::new();
        let mut prefixes: HashMap<Option<String>, bool> = HashMap::new();
        let mut execution_attributes: HashMap<String, ExecutionAttribute> = HashMap::new();
        let mut doc_type_translations: Vec<DocTypeTranslation> = Vec::new();
        let mut doc_type_resolution_entries: Vec<DocTypeResolutionEntry> = Vec::new();
        let mut seen_dialect_names: Vec<String> = Vec::new();

        for configuration in &dialect_configurations {
            let dialect = configuration.dialect();
            let dialect_name = dialect.name().to_string();

            if seen_dialect_names.contains(&dialect_name) {
                return Err(EngineError::Configuration(format!(
                    "dialect is declared twice: \"{dialect_name}\""
                )));
            }
            seen_dialect_names.push(dialect_name.clone());

            // Leniency per prefix is the OR across all dialects sharing it.
            let lenient = prefixes
                .entry(configuration.prefix().map(str::to_string))
                .or_insert(false);
            *lenient = *lenient || configuration.is_lenient();

            for (name, processors) in configuration.element_processors() {
                let merged = element_processors.entry(name.clone()).or_default();
                for processor in processors {
                    merged.push(Candidate {
                        dialect_name: dialect_name.clone(),
                        processor: Arc::clone(processor),
                    });
                }
            }
            for (name, processors) in configuration.attribute_processors() {
                let merged = attribute_processors.entry(name.clone()).or_default();
                for processor in processors {
                    merged.push(Candidate {
                        dialect_name: dialect_name.clone(),
                        processor: Arc::clone(processor),
                    });
                }
            }
            for (kind, processors) in configuration.node_kind_processors() {
                let merged = node_kind_processors.entry(*kind).or_default();
                for processor in processors {
                    merged.push(Candidate {
                        dialect_name: dialect_name.clone(),
                        processor: Arc::clone(processor),
                    });
                }
            }

            for (name, attribute) in dialect.execution_attributes() {
                if execution_attributes.contains_key(&name) {
                    return Err(EngineError::Configuration(format!(
                        "conflicting execution attribute: two or more dialects specify an \
                         execution attribute named \"{name}\""
                    )));
                }
                execution_attributes.insert(name, attribute);
            }

            for translation in dialect.doc_type_translations() {
                let colliding = doc_type_translations.iter().find(|existing| {
                    existing.source_public_id == translation.source_public_id
                        && existing.source_system_id == translation.source_system_id
                });
                match colliding {
                    Some(existing) if *existing != translation => {
                        return Err(EngineError::Configuration(format!(
                            "two dialects provide different doctype translations for \
                             PUBLIC \"{}\" / SYSTEM \"{}\"",
                            translation.source_public_id.as_deref().unwrap_or(""),
                            translation.source_system_id.as_deref().unwrap_or("")
                        )));
                    }
                    Some(_) => {} // identical entry, nothing to add
                    None => doc_type_translations.push(translation),
                }
            }

            for entry in dialect.doc_type_resolution_entries() {
                let colliding = doc_type_resolution_entries.iter().find(|existing| {
                    existing.public_id == entry.public_id && existing.system_id == entry.system_id
                });
                match colliding {
                    Some(existing) if *existing != entry => {
                        return Err(EngineError::Configuration(format!(
                            "two dialects provide different doctype resolution entries for \
                             PUBLIC \"{}\" / SYSTEM \"{}\"",
                            entry.public_id.as_deref().unwrap_or(""),
                            entry.system_id.as_deref().unwrap_or("")
                        )));
                    }
                    Some(_) => {}
                    None => doc_type_resolution_entries.push(entry),
                }
            }
        }

        Ok(EngineConfiguration {
            dialect_configurations,
            element_processors,
            attribute_processors,
            node_kind_processors,
            prefixes,
            execution_attributes,
            doc_type_translations,
            doc_type_resolution_entries,
            message_resolvers,
        })
    }

    pub fn dialect_configurations(&self) -> &[DialectConfiguration] {
        &self.dialect_configurations
    }

    /// Whether some dialect claims this namespace prefix.
    pub fn is_prefix_managed(&self, prefix: Option<&str>) -> bool {
        self.prefixes.contains_key(&prefix.map(str::to_string))
    }

    /// Effective leniency of a prefix (OR across the dialects sharing it).
    /// Unmanaged prefixes are trivially lenient.
    pub fn is_lenient(&self, prefix: Option<&str>) -> bool {
        self.prefixes
            .get(&prefix.map(str::to_string))
            .copied()
            .unwrap_or(true)
    }

    pub fn execution_attribute(&self, name: &str) -> Option<&ExecutionAttribute> {
        self.execution_attributes.get(name)
    }

    pub fn doc_type_resolution_entries(&self) -> &[DocTypeResolutionEntry] {
        &self.doc_type_resolution_entries
    }

    pub fn message_resolvers(&self) -> &[Arc<dyn MessageResolver>] {
        &self.message_resolvers
    }

    /// Resolves the single element processor applying to this concrete
    /// element: `Ok(None)` when none claims it, a dispatch fault when more
    /// than one does.
    pub fn resolve_element_processor(
        &self,
        element: &Element,
    ) -> Result<Option<Arc<dyn ElementProcessor>>, EngineError> {
        let mut resolved: Option<&Candidate<dyn ElementProcessor>> = None;

        let by_name = self
            .element_processors
            .get(&element.normalized_name)
            .into_iter()
            .flatten();
        let by_kind = self
            .node_kind_processors
            .get(&NodeKind::Element)
            .into_iter()
            .flatten();

        for candidate in by_name.chain(by_kind) {
            if !candidate.processor.applies_to(element) {
                continue;
            }
            if resolved.is_some() {
                return Err(EngineError::AmbiguousProcessor {
                    kind: "tag",
                    name: element.normalized_name.clone(),
                });
            }
            resolved = Some(candidate);
        }

        Ok(resolved.map(|candidate| Arc::clone(&candidate.processor)))
    }

    /// Resolves the single attribute processor applying to this concrete
    /// attribute occurrence, with the same ambiguity rule as elements.
    pub fn resolve_attribute_processor(
        &self,
        element: &Element,
        attribute: &Attribute,
    ) -> Result<Option<Arc<dyn AttributeProcessor>>, EngineError> {
        let mut resolved: Option<&Candidate<dyn AttributeProcessor>> = None;

        let candidates = self
            .attribute_processors
            .get(&attribute.normalized_name)
            .into_iter()
            .flatten();

        for candidate in candidates {
            if !candidate.processor.applies_to(element, &attribute.value) {
                continue;
            }
            if resolved.is_some() {
                return Err(EngineError::AmbiguousProcessor {
                    kind: "attribute",
                    name: attribute.normalized_name.clone(),
                });
            }
            resolved = Some(candidate);
        }

        Ok(resolved.map(|candidate| Arc::clone(&candidate.processor)))
    }

    /// Applies the merged doctype translations to a parsed doctype.
    pub fn translate_doc_type(&self, doc_type: &DocType) -> DocType {
        for translation in &self.doc_type_translations {
            if translation.source_public_id == doc_type.public_id
                && translation.source_system_id == doc_type.system_id
            {
                return DocType {
                    root_element_name: doc_type.root_element_name.clone(),
                    public_id: translation.target_public_id.clone(),
                    system_id: translation.target_system_id.clone(),
                };
            }
        }
        doc_type.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::processor::{Matcher, ProcessResult, Processor};
    use crate::Arguments;

    struct NamedTagProcessor {
        element: &'static str,
        only_with_attribute: Option<&'static str>,
    }

    impl ElementProcessor for NamedTagProcessor {
        fn matcher(&self) -> Matcher {
            Matcher::ElementName(self.element.to_string())
        }
        fn precedence(&self) -> i32 {
            100
        }
        fn applies_to(&self, element: &Element) -> bool {
            match self.only_with_attribute {
                Some(attribute) => element.has_attribute(attribute),
                None => true,
            }
        }
        fn process(
            &self,
            _arguments: &Arguments,
            _element: &mut Element,
        ) -> Result<ProcessResult, EngineError> {
            Ok(ProcessResult::no_action())
        }
    }

    struct SimpleDialect {
        name: &'static str,
        prefix: Option<&'static str>,
        lenient: bool,
        processors: Vec<Processor>,
        execution_attributes: Vec<(String, ExecutionAttribute)>,
        translations: Vec<DocTypeTranslation>,
    }

    impl SimpleDialect {
        fn new(name: &'static str, prefix: Option<&'static str>) -> Self {
            SimpleDialect {
                name,
                prefix,
                lenient: false,
                processors: Vec::new(),
                execution_attributes: Vec::new(),
                translations: Vec::new(),
            }
        }
    }

    impl Dialect for SimpleDialect {
        fn name(&self) -> &str {
            self.name
        }
        fn prefix(&self) -> Option<&str> {
            self.prefix
        }
        fn is_lenient(&self) -> bool {
            self.lenient
        }
        fn processors(&self) -> Vec<Processor> {
            self.processors.clone()
        }
        fn execution_attributes(&self) -> Vec<(String, ExecutionAttribute)> {
            self.execution_attributes.clone()
        }
        fn doc_type_translations(&self) -> Vec<DocTypeTranslation> {
            self.translations.clone()
        }
    }

    fn build(dialects: Vec<SimpleDialect>) -> Result<EngineConfiguration, EngineError> {
        let configurations = dialects
            .into_iter()
            .map(|d| DialectConfiguration::new(Arc::new(d)).unwrap())
            .collect();
        EngineConfiguration::build(configurations, Vec::new())
    }

    #[test]
    fn test_empty_dialect_set_is_a_configuration_fault() {
        let result = EngineConfiguration::build(Vec::new(), Vec::new());
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_duplicate_dialect_is_a_configuration_fault() {
        let result = build(vec![
            SimpleDialect::new("dup", Some("a")),
            SimpleDialect::new("dup", Some("b")),
        ]);
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_leniency_is_or_across_dialects_sharing_a_prefix() {
        let mut lenient = SimpleDialect::new("lenient", Some("p"));
        lenient.lenient = true;
        let strict = SimpleDialect::new("strict", Some("p"));

        let configuration = build(vec![strict, lenient]).unwrap();
        assert!(configuration.is_prefix_managed(Some("p")));
        assert!(configuration.is_lenient(Some("p")));
        assert!(!configuration.is_prefix_managed(Some("q")));
        assert!(configuration.is_lenient(Some("q")));
    }

    #[test]
    fn test_conflicting_execution_attributes_fail_eagerly() {
        let mut first = SimpleDialect::new("first", Some("a"));
        first.execution_attributes.push((
            "shared".to_string(),
            ExecutionAttribute::Value(serde_json::json!(1)),
        ));
        let mut second = SimpleDialect::new("second", Some("b"));
        second.execution_attributes.push((
            "shared".to_string(),
            ExecutionAttribute::Value(serde_json::json!(2)),
        ));

        let result = build(vec![first, second]);
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_conflicting_doctype_translations_fail_eagerly() {
        let source = (Some("-//X//EN".to_string()), Some("http://x".to_string()));
        let mut first = SimpleDialect::new("first", Some("a"));
        first.translations.push(DocTypeTranslation {
            source_public_id: source.0.clone(),
            source_system_id: source.1.clone(),
            target_public_id: None,
            target_system_id: Some("http://target-one".to_string()),
        });
        let mut second = SimpleDialect::new("second", Some("b"));
        second.translations.push(DocTypeTranslation {
            source_public_id: source.0.clone(),
            source_system_id: source.1.clone(),
            target_public_id: None,
            target_system_id: Some("http://target-two".to_string()),
        });

        let result = build(vec![first, second]);
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_same_element_processors_do_not_conflict_at_build_time() {
        let mut first = SimpleDialect::new("first", Some("p"));
        first.processors.push(Processor::Element(Arc::new(
            NamedTagProcessor {
                element: "foo",
                only_with_attribute: None,
            },
        )));
        let mut second = SimpleDialect::new("second", Some("p"));
        second.processors.push(Processor::Element(Arc::new(
            NamedTagProcessor {
                element: "foo",
                only_with_attribute: None,
            },
        )));

        // Registration succeeds; the conflict is only detected at use.
        let configuration = build(vec![first, second]).unwrap();
        let element = Element::new("p:foo");
        let result = configuration.resolve_element_processor(&element);
        assert!(matches!(
            result,
            Err(EngineError::AmbiguousProcessor { kind: "tag", .. })
        ));
    }

    #[test]
    fn test_matcher_filters_disambiguate() {
        let mut first = SimpleDialect::new("first", Some("p"));
        first.processors.push(Processor::Element(Arc::new(
            NamedTagProcessor {
                element: "foo",
                only_with_attribute: Some("data-a"),
            },
        )));
        let mut second = SimpleDialect::new("second", Some("p"));
        second.processors.push(Processor::Element(Arc::new(
            NamedTagProcessor {
                element: "foo",
                only_with_attribute: Some("data-b"),
            },
        )));

        let configuration = build(vec![first, second]).unwrap();

        let mut element = Element::new("p:foo");
        element.set_attribute("data-a", "1");
        assert!(configuration
            .resolve_element_processor(&element)
            .unwrap()
            .is_some());

        let plain = Element::new("p:foo");
        assert!(configuration
            .resolve_element_processor(&plain)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_doc_type_translation() {
        let mut dialect = SimpleDialect::new("d", Some("p"));
        dialect.translations.push(DocTypeTranslation {
            source_public_id: Some("-//SOURCE//EN".to_string()),
            source_system_id: Some("http://source".to_string()),
            target_public_id: Some("-//TARGET//EN".to_string()),
            target_system_id: Some("http://target".to_string()),
        });
        let configuration = build(vec![dialect]).unwrap();

        let translated = configuration.translate_doc_type(&DocType {
            root_element_name: "html".to_string(),
            public_id: Some("-//SOURCE//EN".to_string()),
            system_id: Some("http://source".to_string()),
        });
        assert_eq!(translated.public_id.as_deref(), Some("-//TARGET//EN"));

        let untouched = configuration.translate_doc_type(&DocType {
            root_element_name: "html".to_string(),
            public_id: None,
            system_id: None,
        });
        assert_eq!(untouched.public_id, None);
    }
}
