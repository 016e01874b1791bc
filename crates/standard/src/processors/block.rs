//! The synthetic container element: `wf:block`.

use weft_dom::Element;
use weft_engine::{Arguments, ElementProcessor, EngineError, Matcher, ProcessResult};

/// `<wf:block>`: a container that never reaches the output — the tag is
/// always removed and its children spliced into its place. Useful for
/// attaching iteration or conditions to a group of siblings without a
/// wrapper element in the result.
pub struct BlockProcessor;

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

#[cfg(test)]
mod tests {
    use super::super::test_support::process;
    use serde_json::json;
    use weft_engine::Context;

    #[test]
    fn test_block_disappears_keeping_children() {
        let output = process(
            "<div><wf:block><p>a</p><p>b</p></wf:block></div>",
            Context::new(),
        )
        .unwrap();
        assert_eq!(output, "<div><p>a</p><p>b</p></div>");
    }

    #[test]
    fn test_nested_blocks_unwrap_completely() {
        let mut context = Context::new();
        context.set_variable("x", json!("v"));
        let output = process(
            "<div><wf:block><wf:block><p wf:text=\"${x}\"/></wf:block></wf:block></div>",
            context,
        )
        .unwrap();
        assert_eq!(output, "<div><p>v</p></div>");
    }
}
