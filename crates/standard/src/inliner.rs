//! The `[[...]]` text inliner.
//!
//! Active only inside the scope where a `wf:inline="text"` attribute set
//! it, and only over text nodes still carrying the "template source"
//! provenance flag — the engine never hands generated text to an inliner.

use weft_dom::Text;
use weft_engine::{Arguments, EngineError, TextInliner};

const OPEN: &str = "[[";
const CLOSE: &str = "]]";

/// Replaces every `[[expr]]` occurrence in a text node with the evaluated
/// expression. The node stays a text node, so the serializer escapes the
/// result like any other character data.
pub struct StandardTextInliner;

impl TextInliner for StandardTextInliner {
    fn name(&self) -> &str {
        "standard-text"
    }

    fn inline(&self, arguments: &Arguments, text: &mut Text) -> Result<(), EngineError> {
        if !text.content.contains(OPEN) {
            return Ok(());
        }

        let evaluator = arguments.evaluator()?;
        let source = &text.content;
        let mut rendered = String::with_capacity(source.len());
        let mut rest = source.as_str();

        while let Some(start) = rest.find(OPEN) {
            let Some(end) = rest[start + OPEN.len()..].find(CLOSE) else {
                // Unterminated inline marker: kept literally.
                break;
            };
            rendered.push_str(&rest[..start]);
            let expression = &rest[start + OPEN.len()..start + OPEN.len() + end];
            let value = evaluator.evaluate(arguments, expression.trim())?;
            rendered.push_str(&crate::expression::stringify(&value));
            rest = &rest[start + OPEN.len() + end + CLOSE.len()..];
        }
        rendered.push_str(rest);

        text.content = rendered;
        Ok(())
    }
}
