//! Conditional and structural-removal processors: `wf:if`, `wf:unless`
//! and `wf:remove`.

use super::evaluate_attribute;
use crate::expression::is_truthy;
use weft_dom::Element;
use weft_engine::{
    Arguments, AttributeProcessor, EngineError, Matcher, ProcessResult,
};

/// `wf:if="${expr}"`: keeps the element only when the expression is
/// truthy; otherwise the element and its whole subtree are dropped.
pub struct IfProcessor;

impl AttributeProcessor for IfProcessor {
    fn matcher(&self) -> Matcher {
        Matcher::AttributeName("if".to_string())
    }

    fn precedence(&self) -> i32 {
        700
    }

    fn process(
        &self,
        arguments: &Arguments,
        element: &mut Element,
        attribute_name: &str,
    ) -> Result<ProcessResult, EngineError> {
        let value = evaluate_attribute(arguments, element, attribute_name)?;
        if is_truthy(&value) {
            Ok(ProcessResult::remove_attribute())
        } else {
            Ok(ProcessResult::remove_tag_and_children())
        }
    }
}

/// `wf:unless="${expr}"`: the negated form of `wf:if`.
pub struct UnlessProcessor;

impl AttributeProcessor for UnlessProcessor {
    fn matcher(&self) -> Matcher {
        Matcher::AttributeName("unless".to_string())
    }

    fn precedence(&self) -> i32 {
        700
    }

    fn process(
        &self,
        arguments: &Arguments,
        element: &mut Element,
        attribute_name: &str,
    ) -> Result<ProcessResult, EngineError> {
        let value = evaluate_attribute(arguments, element, attribute_name)?;
        if is_truthy(&value) {
            Ok(ProcessResult::remove_tag_and_children())
        } else {
            Ok(ProcessResult::remove_attribute())
        }
    }
}

/// `wf:remove="all|tag|body"`: unconditional structural removal, mostly
/// used to strip prototype-only markup.
pub struct RemoveProcessor;

impl AttributeProcessor for RemoveProcessor {
    fn matcher(&self) -> Matcher {
        Matcher::AttributeName("remove".to_string())
    }

    fn precedence(&self) -> i32 {
        1600
    }

    fn process(
        &self,
        _arguments: &Arguments,
        element: &mut Element,
        attribute_name: &str,
    ) -> Result<ProcessResult, EngineError> {
        let value = element
            .attribute_value(attribute_name)
            .unwrap_or_default()
            .trim()
            .to_string();
        // The attribute itself must not survive in kept output, and the
        // result action slot is needed for the structural action.
        element.remove_attribute(attribute_name);
        match value.as_str() {
            "all" => Ok(ProcessResult::remove_tag_and_children()),
            "tag" => Ok(ProcessResult::remove_tag()),
            "body" => Ok(ProcessResult::remove_children()),
            other => Err(EngineError::Processing(format!(
                "unknown removal kind \"{other}\" (expected \"all\", \"tag\" or \"body\")"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::process;
    use serde_json::json;
    use weft_engine::Context;

    #[test]
    fn test_if_keeps_or_drops_whole_subtrees() {
        let mut context = Context::new();
        context.set_variable("admin", json!(true));
        context.set_variable("count", json!(0));
        let output = process(
            "<root><p wf:if=\"${admin}\">shown</p><p wf:if=\"${count}\">hidden</p></root>",
            context,
        )
        .unwrap();
        assert_eq!(output, "<root><p>shown</p></root>");
    }

    #[test]
    fn test_unless_is_the_negation() {
        let mut context = Context::new();
        context.set_variable("admin", json!(false));
        let output = process(
            "<root><p wf:unless=\"${admin}\">shown</p><p wf:unless=\"'yes'\">hidden</p></root>",
            context,
        )
        .unwrap();
        assert_eq!(output, "<root><p>shown</p></root>");
    }

    #[test]
    fn test_remove_kinds() {
        let output = process(
            "<root><p wf:remove=\"all\">gone</p>\
             <div wf:remove=\"tag\"><span>spliced</span></div>\
             <div wf:remove=\"body\"><span>emptied</span></div></root>",
            Context::new(),
        )
        .unwrap();
        assert_eq!(output, "<root><span>spliced</span><div/></root>");
    }

    #[test]
    fn test_remove_with_unknown_kind_fails() {
        let result = process("<p wf:remove=\"everything\">x</p>", Context::new());
        assert!(result.is_err());
    }
}
