//! Iteration: `wf:each`.

use crate::expression::{evaluate, parse_each_expression};
use serde_json::{json, Value};
use std::collections::HashMap;
use weft_dom::{Element, Node};
use weft_engine::{
    Arguments, AttributeProcessor, EngineError, Matcher, ProcessResult, SubstitutionTag,
};

/// `wf:each="item : ${collection}"`: substitutes the host element with one
/// clone per item. Each clone is processed under its own local variables:
/// the iteration variable and a `<var>Stat` status object carrying
/// `index`, `count`, `size`, `even`, `odd`, `first` and `last`.
///
/// Clones keep the host's executability flags (their other dialect
/// attributes still need to run), minus the `wf:each` attribute itself.
/// A clone carrying an `id` attribute gets a uniquifying numeric suffix
/// from the execution-wide identifier counter.
pub struct EachProcessor;

const STATUS_VAR_SUFFIX: &str = "Stat";

impl AttributeProcessor for EachProcessor {
    fn matcher(&self) -> Matcher {
        Matcher::AttributeName("each".to_string())
    }

    fn precedence(&self) -> i32 {
        800
    }

    fn process(
        &self,
        arguments: &Arguments,
        element: &mut Element,
        attribute_name: &str,
    ) -> Result<ProcessResult, EngineError> {
        let value = element.attribute_value(attribute_name).unwrap_or_default();
        let each = parse_each_expression(value)?;
        let iterated = evaluate(arguments, &each.iterated)?;
        let items = iterable_items(iterated);

        let mut template = element.clone();
        template.remove_attribute(attribute_name);

        let size = items.len();
        let mut tags = Vec::with_capacity(size);
        for (index, item) in items.into_iter().enumerate() {
            let mut clone = template.clone();
            if let Some(id) = clone.attribute_value("id").map(str::to_string) {
                let seq = arguments.next_id_seq(&id);
                clone.set_attribute("id", format!("{id}{seq}"));
            }

            let status = json!({
                "index": index,
                "count": index + 1,
                "size": size,
                "even": index % 2 == 0,
                "odd": index % 2 != 0,
                "first": index == 0,
                "last": index + 1 == size,
            });
            let mut locals = HashMap::new();
            locals.insert(each.iteration_variable.clone(), item);
            locals.insert(
                format!("{}{STATUS_VAR_SUFFIX}", each.iteration_variable),
                status,
            );

            tags.push(SubstitutionTag::with_local_variables(
                Node::Element(clone),
                locals,
            ));
        }

        Ok(ProcessResult::substitute(tags))
    }
}

/// The values an expression result iterates as: arrays element-wise,
/// objects over their values, `null` as nothing, and any scalar as a
/// single-element sequence.
fn iterable_items(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        scalar => vec![scalar],
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::process;
    use serde_json::json;
    use weft_engine::Context;

    #[test]
    fn test_each_substitutes_one_clone_per_item() {
        let mut context = Context::new();
        context.set_variable("names", json!(["a", "b", "c"]));
        let output = process(
            "<ul><li wf:each=\"n : ${names}\" wf:text=\"${n}\">x</li></ul>",
            context,
        )
        .unwrap();
        assert_eq!(output, "<ul><li>a</li><li>b</li><li>c</li></ul>");
    }

    #[test]
    fn test_each_status_variable() {
        let mut context = Context::new();
        context.set_variable("names", json!(["a", "b"]));
        let output = process(
            "<ul><li wf:each=\"n : ${names}\" wf:text=\"${nStat.count} + '/' + ${nStat.size}\"/></ul>",
            context,
        )
        .unwrap();
        assert_eq!(output, "<ul><li>1/2</li><li>2/2</li></ul>");
    }

    #[test]
    fn test_each_over_empty_and_null_renders_nothing() {
        let mut context = Context::new();
        context.set_variable("empty", json!([]));
        let output = process(
            "<ul><li wf:each=\"n : ${empty}\">x</li><li wf:each=\"n : ${missing}\">y</li></ul>",
            context,
        )
        .unwrap();
        assert_eq!(output, "<ul/>");
    }

    #[test]
    fn test_each_uniquifies_repeated_ids() {
        let mut context = Context::new();
        context.set_variable("names", json!(["a", "b"]));
        let output = process(
            "<form><input id=\"name\" wf:each=\"n : ${names}\"/></form>",
            context,
        )
        .unwrap();
        assert_eq!(
            output,
            "<form><input id=\"name1\"/><input id=\"name2\"/></form>"
        );
    }

    #[test]
    fn test_nested_iteration() {
        let mut context = Context::new();
        context.set_variable("rows", json!([["a", "b"], ["c"]]));
        let output = process(
            "<table><tr wf:each=\"row : ${rows}\"><td wf:each=\"cell : ${row}\" \
             wf:text=\"${cell}\"/></tr></table>",
            context,
        )
        .unwrap();
        assert_eq!(
            output,
            "<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>"
        );
    }
}
