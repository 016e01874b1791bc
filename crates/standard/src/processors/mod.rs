//! The stock processors of the standard dialect.
//!
//! Precedences follow the dialect's fixed ordering: scope-establishing
//! processors (`wf:object`, `wf:with`) run first, then conditionals,
//! iteration, attribute and body output, inlining control, and structural
//! removal last. `wf:block` is the only element processor.

mod block;
mod control;
mod inline;
mod iterate;
mod output;
mod scope;

pub use block::BlockProcessor;
pub use control::{IfProcessor, RemoveProcessor, UnlessProcessor};
pub use inline::InlineProcessor;
pub use iterate::EachProcessor;
pub use output::{AttrProcessor, TextProcessor, UtextProcessor};
pub use scope::{ObjectProcessor, WithProcessor};

use serde_json::Value;
use weft_dom::Element;
use weft_engine::{Arguments, EngineError};

/// Evaluates the full value of `attribute_name` as a single expression,
/// through the engine-registered evaluator.
pub(crate) fn evaluate_attribute(
    arguments: &Arguments,
    element: &Element,
    attribute_name: &str,
) -> Result<Value, EngineError> {
    let expression = element.attribute_value(attribute_name).unwrap_or_default();
    let evaluator = arguments.evaluator()?;
    evaluator.evaluate(arguments, expression)
}
