//! Inlining control: `wf:inline`.

use crate::inliner::StandardTextInliner;
use std::sync::Arc;
use weft_dom::{Element, Node};
use weft_engine::{
    Arguments, AttributeProcessor, EngineError, Matcher, ProcessResult,
};

/// `wf:inline="text"` activates the `[[...]]` text inliner for this
/// element's scope; `wf:inline="none"` explicitly deactivates an inliner
/// set further up.
///
/// Activation also re-opens the subtree to the transformation walk:
/// elements below may have been pruned as "nothing to execute" by the
/// annotation pass, but their text now needs visiting. Only the subtree
/// flags of elements are raised — the per-node provenance flags of text
/// are untouched, so generated text stays invisible to the inliner.
pub struct InlineProcessor;

impl AttributeProcessor for InlineProcessor {
    fn matcher(&self) -> Matcher {
        Matcher::AttributeName("inline".to_string())
    }

    fn precedence(&self) -> i32 {
        1500
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
        match value.as_str() {
            "text" => {
                reopen_subtree(element);
                Ok(ProcessResult::remove_attribute()
                    .with_text_inliner(Some(Arc::new(StandardTextInliner))))
            }
            "none" => Ok(ProcessResult::remove_attribute().with_text_inliner(None)),
            other => Err(EngineError::Processing(format!(
                "unknown inlining mode \"{other}\" (expected \"text\" or \"none\")"
            ))),
        }
    }
}

fn reopen_subtree(element: &mut Element) {
    for child in &mut element.children {
        if let Node::Element(child) = child {
            child.subtree_executable = true;
            reopen_subtree(child);
        }
    }
}
