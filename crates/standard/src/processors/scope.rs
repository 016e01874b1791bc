//! Scope-establishing processors: `wf:object` and `wf:with`.

use super::evaluate_attribute;
use crate::expression::{evaluate, parse_assignation_sequence};
use std::collections::HashMap;
use weft_dom::Element;
use weft_engine::{
    Arguments, AttributeProcessor, EngineError, Matcher, ProcessResult,
};

/// `wf:object="${expr}"`: evaluates the expression and makes the result
/// the selection target for this element's attributes and children, so
/// `*{...}` expressions resolve against it.
pub struct ObjectProcessor;

impl AttributeProcessor for ObjectProcessor {
    fn matcher(&self) -> Matcher {
        Matcher::AttributeName("object".to_string())
    }

    fn precedence(&self) -> i32 {
        500
    }

    fn process(
        &self,
        arguments: &Arguments,
        element: &mut Element,
        attribute_name: &str,
    ) -> Result<ProcessResult, EngineError> {
        let target = evaluate_attribute(arguments, element, attribute_name)?;
        Ok(ProcessResult::remove_attribute().with_selection_target(target))
    }
}

/// `wf:with="x=${a},y='b'"`: adds local variables for this element's
/// scope. Assignations are evaluated left to right, each seeing the
/// variables bound before it.
pub struct WithProcessor;

impl AttributeProcessor for WithProcessor {
    fn matcher(&self) -> Matcher {
        Matcher::AttributeName("with".to_string())
    }

    fn precedence(&self) -> i32 {
        600
    }

    fn process(
        &self,
        arguments: &Arguments,
        element: &mut Element,
        attribute_name: &str,
    ) -> Result<ProcessResult, EngineError> {
        let value = element.attribute_value(attribute_name).unwrap_or_default();
        let assignations = parse_assignation_sequence(value)?;

        let mut locals: HashMap<String, serde_json::Value> = HashMap::new();
        let mut scope = arguments.clone();
        for assignation in assignations {
            let value = evaluate(&scope, &assignation.expression)?;
            let mut binding = HashMap::new();
            binding.insert(assignation.name.clone(), value.clone());
            scope = scope.add_local_variables(&binding);
            locals.insert(assignation.name, value);
        }

        Ok(ProcessResult::remove_attribute().with_local_variables(locals))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::process;
    use serde_json::json;
    use weft_engine::Context;

    #[test]
    fn test_with_binds_local_variables_for_children() {
        let mut context = Context::new();
        context.set_variable("user", json!({"name": "Ada"}));
        let output = process(
            "<div wf:with=\"n=${user.name}\"><span wf:text=\"${n}\"/></div>",
            context,
        )
        .unwrap();
        assert_eq!(output, "<div><span>Ada</span></div>");
    }

    #[test]
    fn test_with_assignations_see_earlier_bindings() {
        let output = process(
            "<div wf:with=\"a='x',b=${a}+'y'\"><span wf:text=\"${b}\"/></div>",
            Context::new(),
        )
        .unwrap();
        assert_eq!(output, "<div><span>xy</span></div>");
    }

    #[test]
    fn test_with_does_not_leak_to_siblings() {
        let mut context = Context::new();
        context.set_variable("x", json!("outer"));
        let output = process(
            "<root><div wf:with=\"x='inner'\"><span wf:text=\"${x}\"/></div>\
             <span wf:text=\"${x}\"/></root>",
            context,
        )
        .unwrap();
        assert_eq!(
            output,
            "<root><div><span>inner</span></div><span>outer</span></root>"
        );
    }

    #[test]
    fn test_object_selects_target_for_selection_expressions() {
        let mut context = Context::new();
        context.set_variable("user", json!({"name": "Grace", "role": "admiral"}));
        let output = process(
            "<div wf:object=\"${user}\"><span wf:text=\"*{name}\"/>\
             <span wf:text=\"*{role}\"/></div>",
            context,
        )
        .unwrap();
        assert_eq!(
            output,
            "<div><span>Grace</span><span>admiral</span></div>"
        );
    }
}
