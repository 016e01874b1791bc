//! The standard dialect definition.

use crate::expression::StandardExpressionEvaluator;
use crate::processors::{
    AttrProcessor, BlockProcessor, EachProcessor, IfProcessor, InlineProcessor, ObjectProcessor,
    RemoveProcessor, TextProcessor, UnlessProcessor, UtextProcessor, WithProcessor,
};
use std::sync::Arc;
use weft_engine::{
    Dialect, DocTypeTranslation, ExecutionAttribute, Processor, EVALUATOR_EXECUTION_ATTRIBUTE,
};

const XHTML1_STRICT_PUBLIC_ID: &str = "-//W3C//DTD XHTML 1.0 Strict//EN";
const XHTML1_STRICT_SYSTEM_ID: &str = "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd";

/// Templates may declare a weft-specific doctype so that editors validate
/// the dialect attributes; on output it is translated to the plain XHTML
/// one.
const WEFT_XHTML1_STRICT_SYSTEM_ID: &str = "http://weft.org/dtd/xhtml1-strict-weft.dtd";

/// The stock dialect: prefix `wf`, strict (an unknown `wf:*` name on an
/// otherwise processed element is a template error, not a typo to ignore).
#[derive(Default)]
pub struct StandardDialect;

impl StandardDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for StandardDialect {
    fn name(&self) -> &str {
        "standard"
    }

    fn prefix(&self) -> Option<&str> {
        Some("wf")
    }

    fn is_lenient(&self) -> bool {
        false
    }

    fn processors(&self) -> Vec<Processor> {
        vec![
            Processor::Attribute(Arc::new(ObjectProcessor)),
            Processor::Attribute(Arc::new(WithProcessor)),
            Processor::Attribute(Arc::new(IfProcessor)),
            Processor::Attribute(Arc::new(UnlessProcessor)),
            Processor::Attribute(Arc::new(EachProcessor)),
            Processor::Attribute(Arc::new(AttrProcessor)),
            Processor::Attribute(Arc::new(TextProcessor)),
            Processor::Attribute(Arc::new(UtextProcessor)),
            Processor::Attribute(Arc::new(InlineProcessor)),
            Processor::Attribute(Arc::new(RemoveProcessor)),
            Processor::Element(Arc::new(BlockProcessor)),
        ]
    }

    fn execution_attributes(&self) -> Vec<(String, ExecutionAttribute)> {
        vec![(
            EVALUATOR_EXECUTION_ATTRIBUTE.to_string(),
            ExecutionAttribute::Evaluator(Arc::new(StandardExpressionEvaluator::new())),
        )]
    }

    fn doc_type_translations(&self) -> Vec<DocTypeTranslation> {
        vec![DocTypeTranslation {
            source_public_id: None,
            source_system_id: Some(WEFT_XHTML1_STRICT_SYSTEM_ID.to_string()),
            target_public_id: Some(XHTML1_STRICT_PUBLIC_ID.to_string()),
            target_system_id: Some(XHTML1_STRICT_SYSTEM_ID.to_string()),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_metadata() {
        let dialect = StandardDialect::new();
        assert_eq!(dialect.name(), "standard");
        assert_eq!(dialect.prefix(), Some("wf"));
        assert!(!dialect.is_lenient());
        assert_eq!(dialect.processors().len(), 11);
    }

    #[test]
    fn test_dialect_registers_the_evaluator() {
        let attributes = StandardDialect::new().execution_attributes();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].0, EVALUATOR_EXECUTION_ATTRIBUTE);
        assert!(matches!(
            attributes[0].1,
            ExecutionAttribute::Evaluator(_)
        ));
    }
}
