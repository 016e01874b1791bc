//! Output-producing processors: `wf:text`, `wf:utext` and `wf:attr`.

use super::evaluate_attribute;
use crate::expression::{evaluate, parse_assignation_sequence, stringify};
use weft_dom::{Element, Node, Text};
use weft_engine::{
    Arguments, AttributeProcessor, EngineError, Matcher, ProcessResult,
};

/// `wf:text="${expr}"`: replaces the element's body with the evaluated
/// expression as escaped character data. The generated text node carries
/// the "generated" provenance flag, so no inliner will ever touch it.
pub struct TextProcessor;

impl AttributeProcessor for TextProcessor {
    fn matcher(&self) -> Matcher {
        Matcher::AttributeName("text".to_string())
    }

    fn precedence(&self) -> i32 {
        1200
    }

    fn process(
        &self,
        arguments: &Arguments,
        element: &mut Element,
        attribute_name: &str,
    ) -> Result<ProcessResult, EngineError> {
        let value = evaluate_attribute(arguments, element, attribute_name)?;
        element.children = vec![Node::Text(Text::non_executable(stringify(&value)))];
        Ok(ProcessResult::remove_attribute())
    }
}

/// `wf:utext="${expr}"`: replaces the element's body with the evaluated
/// expression parsed as a markup fragment. The injected nodes have their
/// executability cleared throughout: values never re-enter the engine as
/// processable template content, whatever markup they happen to contain.
pub struct UtextProcessor;

impl AttributeProcessor for UtextProcessor {
    fn matcher(&self) -> Matcher {
        Matcher::AttributeName("utext".to_string())
    }

    fn precedence(&self) -> i32 {
        1200
    }

    fn process(
        &self,
        arguments: &Arguments,
        element: &mut Element,
        attribute_name: &str,
    ) -> Result<ProcessResult, EngineError> {
        let value = evaluate_attribute(arguments, element, attribute_name)?;
        let fragment = stringify(&value);

        // The fragment rarely is a single well-formed element, so it is
        // parsed under a synthetic root and unwrapped again.
        let wrapped = format!("<weft-fragment>{fragment}</weft-fragment>");
        let document = weft_parser::TreeBuilder::new(false)
            .parse(&wrapped)
            .map_err(|e| {
                EngineError::Processing(format!(
                    "value of {attribute_name} is not parseable markup: {e}"
                ))
            })?;

        let root = document
            .root_element()
            .cloned()
            .unwrap_or_else(|| Element::new("weft-fragment"));
        element.children = root
            .children
            .into_iter()
            .map(|mut node| {
                node.clear_executability();
                node
            })
            .collect();
        Ok(ProcessResult::remove_attribute())
    }
}

/// `wf:attr="name=${expr},other=${expr}"`: sets output attributes from an
/// assignation sequence. A `null` value removes the attribute instead.
pub struct AttrProcessor;

impl AttributeProcessor for AttrProcessor {
    fn matcher(&self) -> Matcher {
        Matcher::AttributeName("attr".to_string())
    }

    fn precedence(&self) -> i32 {
        1000
    }

    fn process(
        &self,
        arguments: &Arguments,
        element: &mut Element,
        attribute_name: &str,
    ) -> Result<ProcessResult, EngineError> {
        let value = element.attribute_value(attribute_name).unwrap_or_default();
        let assignations = parse_assignation_sequence(value)?;

        for assignation in assignations {
            let value = evaluate(arguments, &assignation.expression)?;
            match value {
                serde_json::Value::Null => {
                    element.remove_attribute(&assignation.name);
                }
                other => element.set_attribute(assignation.name, stringify(&other)),
            }
        }
        Ok(ProcessResult::remove_attribute())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::process;
    use serde_json::json;
    use weft_engine::Context;

    #[test]
    fn test_text_escapes_markup() {
        let mut context = Context::new();
        context.set_variable("payload", json!("<b>bold</b> & more"));
        let output = process("<p wf:text=\"${payload}\">x</p>", context).unwrap();
        assert_eq!(output, "<p>&lt;b&gt;bold&lt;/b&gt; &amp; more</p>");
    }

    #[test]
    fn test_text_renders_null_as_empty() {
        let output = process("<p wf:text=\"${missing}\">placeholder</p>", Context::new())
            .unwrap();
        assert_eq!(output, "<p></p>");
    }

    #[test]
    fn test_utext_injects_markup_without_reprocessing() {
        let mut context = Context::new();
        // The injected fragment carries a dialect attribute; it must come
        // out literally, never evaluated.
        context.set_variable("snippet", json!("<b wf:text=\"${secret}\">bold</b> plain"));
        let output = process("<div wf:utext=\"${snippet}\">x</div>", context).unwrap();
        assert_eq!(
            output,
            "<div><b wf:text=\"${secret}\">bold</b> plain</div>"
        );
    }

    #[test]
    fn test_utext_with_malformed_fragment_fails() {
        let mut context = Context::new();
        context.set_variable("snippet", json!("<b>never closed"));
        // Recovery closes the element, so this parses; truly malformed
        // content (a stray ampersand) does not.
        context.set_variable("bad", json!("fish & chips"));
        let result = process("<div wf:utext=\"${bad}\">x</div>", context);
        assert!(result.is_err());
    }

    #[test]
    fn test_attr_sets_and_removes_attributes() {
        let mut context = Context::new();
        context.set_variable("link", json!("/home"));
        let output = process(
            "<a href=\"#\" title=\"old\" wf:attr=\"href=${link},title=${missing}\">go</a>",
            context,
        )
        .unwrap();
        assert_eq!(output, "<a href=\"/home\">go</a>");
    }
}
