//! Post-parse executability annotation.
//!
//! One pass over a freshly parsed tree decides, per node, whether any
//! processor of the merged dialect set could act on it (`executable`) and
//! whether anything in its subtree could (`subtree_executable`). The
//! transformation walk later skips whole subtrees whose flag is cleared,
//! which is what makes processing large mostly-static templates cheap.
//!
//! The same pass strips the dialects' `xmlns:<prefix>` declaration
//! attributes for non-lenient prefixes and appends the non-minimization
//! sentinel to empty elements that must not be collapsed in web output.
//!
//! Text and CDATA nodes keep the executability flag they were built with:
//! on those nodes the flag tracks provenance (template source vs generated
//! content), not processor applicability, and it is what keeps inliners
//! away from text produced by evaluating expressions. They never make a
//! subtree executable on their own; a processor activating an inliner is
//! responsible for re-opening its subtree to the walk (see the standard
//! dialect's inline processor).

use crate::config::EngineConfiguration;
use crate::EngineError;
use weft_dom::{Document, Element, Node, TemplateMode, Text, NON_MINIMIZABLE_SENTINEL};

/// Annotates a freshly parsed document. Resolution faults (an ambiguous
/// processor candidate set) surface here, at first use of the template.
pub fn annotate_document(
    document: &mut Document,
    configuration: &EngineConfiguration,
    mode: TemplateMode,
) -> Result<(), EngineError> {
    for node in &mut document.children {
        annotate_node(node, configuration, mode)?;
    }
    Ok(())
}

/// Returns whether the annotated subtree contains anything executable.
fn annotate_node(
    node: &mut Node,
    configuration: &EngineConfiguration,
    mode: TemplateMode,
) -> Result<bool, EngineError> {
    match node {
        Node::Element(element) => annotate_element(element, configuration, mode),
        // Text and CDATA keep their provenance flag; comments are never
        // executable. None of them makes a subtree executable.
        Node::Comment(_) => {
            node.set_executable(false);
            Ok(false)
        }
        Node::Text(_) | Node::CData(_) => Ok(false),
    }
}

fn annotate_element(
    element: &mut Element,
    configuration: &EngineConfiguration,
    mode: TemplateMode,
) -> Result<bool, EngineError> {
    let mut node_executable = configuration.resolve_element_processor(element)?.is_some();

    if !node_executable {
        for attribute in &element.attributes {
            if configuration
                .resolve_attribute_processor(element, attribute)?
                .is_some()
            {
                node_executable = true;
                break;
            }
        }
    }
    element.executable = node_executable;

    let mut subtree_executable = node_executable;
    for child in &mut element.children {
        if annotate_node(child, configuration, mode)? {
            subtree_executable = true;
        }
    }
    element.subtree_executable = subtree_executable;

    // The namespace declarations that bind dialect prefixes are template
    // plumbing, not output: strip them for every strict prefix.
    for dialect_configuration in configuration.dialect_configurations() {
        if configuration.is_lenient(dialect_configuration.prefix()) {
            continue;
        }
        if let Some(xmlns) = dialect_configuration.xmlns_attribute_name() {
            element.remove_attribute(&xmlns);
        }
    }

    if element.is_content_empty() && mode.is_web() && !element.is_minimizable_in_web_modes() {
        let sentinel = Text::non_executable(NON_MINIMIZABLE_SENTINEL.to_string());
        element.children.push(Node::Text(sentinel));
    }

    Ok(subtree_executable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, DialectConfiguration};
    use crate::processor::{
        AttributeProcessor, ElementProcessor, Matcher, ProcessResult, Processor,
    };
    use crate::Arguments;
    use std::sync::Arc;

    struct BlockProcessor;
    impl ElementProcessor for BlockProcessor {
        fn matcher(&self) -> Matcher {
            Matcher::ElementName("block".to_string())
        }
        fn precedence(&self) -> i32 {
            100000
        }
        fn process(
            &self,
            _arguments: &Arguments,
            _element: &mut Element,
        ) -> Result<ProcessResult, EngineError> {
            Ok(ProcessResult::remove_tag())
        }
    }

    struct TextAttrProcessor;
    impl AttributeProcessor for TextAttrProcessor {
        fn matcher(&self) -> Matcher {
            Matcher::AttributeName("text".to_string())
        }
        fn precedence(&self) -> i32 {
            1200
        }
        fn process(
            &self,
            _arguments: &Arguments,
            _element: &mut Element,
            _attribute_name: &str,
        ) -> Result<ProcessResult, EngineError> {
            Ok(ProcessResult::remove_attribute())
        }
    }

    struct TestDialect;
    impl Dialect for TestDialect {
        fn name(&self) -> &str {
            "test"
        }
        fn prefix(&self) -> Option<&str> {
            Some("t")
        }
        fn processors(&self) -> Vec<Processor> {
            vec![
                Processor::Element(Arc::new(BlockProcessor)),
                Processor::Attribute(Arc::new(TextAttrProcessor)),
            ]
        }
    }

    fn configuration() -> EngineConfiguration {
        let dialect = DialectConfiguration::new(Arc::new(TestDialect)).unwrap();
        EngineConfiguration::build(vec![dialect], Vec::new()).unwrap()
    }

    fn parse(source: &str) -> Document {
        let mut builder = weft_parser::TreeBuilder::new(false);
        builder.parse(source).unwrap()
    }

    #[test]
    fn test_elements_without_processors_are_cleared() {
        let configuration = configuration();
        let mut document = parse("<div><p>plain</p></div>");
        annotate_document(&mut document, &configuration, TemplateMode::Xml).unwrap();

        let root = document.root_element().unwrap();
        assert!(!root.executable);
        assert!(!root.subtree_executable);
    }

    #[test]
    fn test_attribute_processor_marks_element_executable() {
        let configuration = configuration();
        let mut document = parse("<div><p t:text=\"${x}\">x</p><p>static</p></div>");
        annotate_document(&mut document, &configuration, TemplateMode::Xml).unwrap();

        let root = document.root_element().unwrap();
        assert!(!root.executable);
        assert!(root.subtree_executable);

        let Node::Element(with_processor) = &root.children[0] else {
            panic!("expected element");
        };
        assert!(with_processor.executable);
        assert!(with_processor.subtree_executable);

        let Node::Element(plain) = &root.children[1] else {
            panic!("expected element");
        };
        assert!(!plain.executable);
        assert!(!plain.subtree_executable);
    }

    #[test]
    fn test_element_processor_marks_element_executable() {
        let configuration = configuration();
        let mut document = parse("<div><t:block>x</t:block></div>");
        annotate_document(&mut document, &configuration, TemplateMode::Xml).unwrap();

        let root = document.root_element().unwrap();
        let Node::Element(block) = &root.children[0] else {
            panic!("expected element");
        };
        assert!(block.executable);
    }

    #[test]
    fn test_text_nodes_keep_their_provenance_flag() {
        let configuration = configuration();
        let mut document = parse("<div>body</div>");
        annotate_document(&mut document, &configuration, TemplateMode::Xml).unwrap();

        let root = document.root_element().unwrap();
        // Source text stays executable (an inliner may act on it), but it
        // does not make the subtree executable by itself.
        assert!(root.children[0].is_executable());
        assert!(!root.subtree_executable);
    }

    #[test]
    fn test_strict_prefix_xmlns_declaration_is_stripped() {
        let configuration = configuration();
        let mut document = parse("<html xmlns:t=\"http://example.org/t\"><body/></html>");
        annotate_document(&mut document, &configuration, TemplateMode::Xml).unwrap();

        let root = document.root_element().unwrap();
        assert!(!root.has_attribute("xmlns:t"));
    }

    #[test]
    fn test_sentinel_appended_to_empty_non_minimizable_elements_in_web_modes() {
        let configuration = configuration();

        let mut document = parse("<div><textarea></textarea><br/></div>");
        annotate_document(&mut document, &configuration, TemplateMode::Html5).unwrap();
        let root = document.root_element().unwrap();
        let Node::Element(textarea) = &root.children[0] else {
            panic!("expected element");
        };
        assert_eq!(textarea.children.len(), 1);
        assert!(!textarea.children[0].is_executable());
        let Node::Element(br) = &root.children[1] else {
            panic!("expected element");
        };
        assert!(br.children.is_empty());

        // XML modes have no minimization restrictions.
        let mut document = parse("<div><textarea></textarea></div>");
        annotate_document(&mut document, &configuration, TemplateMode::Xml).unwrap();
        let root = document.root_element().unwrap();
        let Node::Element(textarea) = &root.children[0] else {
            panic!("expected element");
        };
        assert!(textarea.children.is_empty());
    }
}
