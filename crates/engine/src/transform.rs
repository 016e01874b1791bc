//! The tree transformation walk.
//!
//! Transformation is expressed as consume-and-replace: transforming a node
//! yields the list of nodes that take its place. Keeping a node yields
//! itself (with transformed children); removing the tag yields its
//! transformed children spliced in place; removing tag and children yields
//! nothing; substitution yields the transformed substitution tags in the
//! order the processor supplied them.
//!
//! Per element, at most one tag processor runs, then the matching
//! attribute processors in ascending precedence order (ties broken by
//! attribute document order). Local variables, the selection target and
//! the text inliner accumulate across the processors of one element and
//! scope over its attributes and children only; siblings never observe
//! them.

use crate::arguments::Arguments;
use crate::processor::{AttributeProcessor, ProcessResult, SubstitutionTag, TextInliner};
use crate::EngineError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use weft_dom::{name_prefix, Document, Element, Node, Text, NON_MINIMIZABLE_SENTINEL};

/// Runs the transformation over a whole (annotated) document, in place.
pub fn transform_document(
    document: &mut Document,
    arguments: &Arguments,
) -> Result<(), EngineError> {
    let children = std::mem::take(&mut document.children);
    let mut transformed = Vec::with_capacity(children.len());
    for node in children {
        transformed.extend(transform_node(arguments, node)?);
    }
    document.children = transformed;
    Ok(())
}

/// The accumulated effects of the processors run against one element.
#[derive(Default)]
struct ElementEffects {
    tag_removed: bool,
    children_removed: bool,
    tag_substituted: bool,
    local_variables: HashMap<String, Value>,
    selection_target_set: bool,
    selection_target: Value,
    text_inliner_set: bool,
    text_inliner: Option<Arc<dyn TextInliner>>,
    substitution_tags: Vec<SubstitutionTag>,
}

impl ElementEffects {
    /// Folds one processor's result in. Structural flags take the latest
    /// processor's word for it; variables and substitution tags accumulate;
    /// selection target and inliner are only replaced when the result
    /// explicitly carries one.
    fn merge(&mut self, result: ProcessResult) {
        self.tag_removed = result.action.is_tag_removed();
        self.children_removed = result.action.is_children_removed();
        self.tag_substituted = result.action.is_tag_substituted();
        self.local_variables.extend(result.local_variables);
        self.substitution_tags.extend(result.substitution_tags);
        if let Some(target) = result.selection_target {
            self.selection_target_set = true;
            self.selection_target = target;
        }
        if result.text_inliner_set {
            self.text_inliner_set = true;
            self.text_inliner = result.text_inliner;
        }
    }

    /// The `Arguments` an attribute processor on this same element runs
    /// under: preceding local variables and selection target apply, the
    /// inliner does not (it only scopes over children).
    fn attribute_arguments(&self, arguments: &Arguments) -> Arguments {
        match (self.local_variables.is_empty(), self.selection_target_set) {
            (true, false) => arguments.clone(),
            (true, true) => arguments.set_selection_target(self.selection_target.clone()),
            (false, false) => arguments.add_local_variables(&self.local_variables),
            (false, true) => arguments.add_local_variables_and_set_selection_target(
                &self.local_variables,
                self.selection_target.clone(),
            ),
        }
    }

    /// The `Arguments` this element's children (or substitution tags, with
    /// their own variables merged in) are processed under.
    fn children_arguments(&self, arguments: &Arguments) -> Arguments {
        self.scoped_arguments(arguments, &self.local_variables)
    }

    fn scoped_arguments(
        &self,
        arguments: &Arguments,
        local_variables: &HashMap<String, Value>,
    ) -> Arguments {
        let inliner = || self.text_inliner.clone();
        match (
            local_variables.is_empty(),
            self.selection_target_set,
            self.text_inliner_set,
        ) {
            (true, false, false) => arguments.clone(),
            (true, false, true) => arguments.set_text_inliner(inliner()),
            (true, true, false) => arguments.set_selection_target(self.selection_target.clone()),
            (true, true, true) => arguments
                .set_text_inliner_and_selection_target(inliner(), self.selection_target.clone()),
            (false, false, false) => arguments.add_local_variables(local_variables),
            (false, false, true) => {
                arguments.add_local_variables_and_set_text_inliner(local_variables, inliner())
            }
            (false, true, false) => arguments.add_local_variables_and_set_selection_target(
                local_variables,
                self.selection_target.clone(),
            ),
            (false, true, true) => arguments
                .add_local_variables_and_text_inliner_and_selection_target(
                    local_variables,
                    inliner(),
                    self.selection_target.clone(),
                ),
        }
    }
}

/// Transforms one node into the list of nodes that take its place.
fn transform_node(arguments: &Arguments, node: Node) -> Result<Vec<Node>, EngineError> {
    match node {
        Node::Element(element) => transform_element(arguments, element),
        Node::Text(mut text) => {
            if text.executable {
                if let Some(inliner) = arguments.text_inliner() {
                    inliner.inline(arguments, &mut text)?;
                }
            }
            Ok(vec![Node::Text(text)])
        }
        Node::CData(mut text) => {
            if text.executable {
                if let Some(inliner) = arguments.text_inliner() {
                    inliner.inline(arguments, &mut text)?;
                }
            }
            Ok(vec![Node::CData(text)])
        }
        Node::Comment(comment) => Ok(vec![Node::Comment(comment)]),
    }
}

fn transform_element(
    arguments: &Arguments,
    mut element: Element,
) -> Result<Vec<Node>, EngineError> {
    // Nothing in this subtree can be acted on.
    if !element.subtree_executable {
        return Ok(vec![Node::Element(element)]);
    }

    let configuration = Arc::clone(arguments.configuration());
    let mut effects = ElementEffects::default();

    /*
     * Step one: resolve and run the tag processor, if this element itself
     * is executable.
     */
    if element.executable {
        match configuration.resolve_element_processor(&element)? {
            Some(processor) => {
                log::trace!(
                    "[{}] processing tag \"{}\"",
                    arguments.template_name(),
                    element.normalized_name
                );
                effects.merge(processor.process(arguments, &mut element)?);
            }
            None => {
                let prefix = element.prefix();
                if configuration.is_prefix_managed(prefix) && !configuration.is_lenient(prefix) {
                    return Err(EngineError::NoProcessorFound {
                        kind: "tag",
                        name: element.normalized_name.clone(),
                        prefix: prefix.unwrap_or("").to_string(),
                    });
                }
            }
        }
    }

    /*
     * Step two: resolve the attribute processors, order them by precedence
     * and run them. Skipped entirely once the tag itself is gone.
     */
    if !effects.tag_removed && element.executable {
        let mut resolved: Vec<(String, Arc<dyn AttributeProcessor>)> = Vec::new();
        for attribute in &element.attributes {
            match configuration.resolve_attribute_processor(&element, attribute)? {
                Some(processor) => {
                    resolved.push((attribute.normalized_name.clone(), processor));
                }
                None => {
                    let prefix = name_prefix(&attribute.normalized_name);
                    if configuration.is_prefix_managed(prefix)
                        && !configuration.is_lenient(prefix)
                    {
                        return Err(EngineError::NoProcessorFound {
                            kind: "attribute",
                            name: attribute.normalized_name.clone(),
                            prefix: prefix.unwrap_or("").to_string(),
                        });
                    }
                }
            }
        }

        // Ascending precedence; the sort is stable, so equal precedences
        // keep attribute document order and re-runs are deterministic.
        resolved.sort_by_key(|(_, processor)| processor.precedence());

        for (attribute_name, processor) in resolved {
            // A processor may have removed the tag or cleared the element's
            // executability; either ends attribute processing.
            if effects.tag_removed || !element.executable {
                break;
            }
            // A previous processor may have consumed this attribute.
            if !element.has_attribute(&attribute_name) {
                continue;
            }
            log::trace!(
                "[{}] processing attribute \"{}\" on \"{}\"",
                arguments.template_name(),
                attribute_name,
                element.normalized_name
            );
            let attribute_arguments = effects.attribute_arguments(arguments);
            let result = processor.process(&attribute_arguments, &mut element, &attribute_name)?;
            let attribute_removed = result.action.is_attribute_removed();
            effects.merge(result);
            if attribute_removed {
                element.remove_attribute(&attribute_name);
            }
        }
    }

    /*
     * Step three: apply the accumulated structural action.
     */
    let children_arguments = effects.children_arguments(arguments);

    if !effects.tag_removed {
        if effects.children_removed {
            element.children.clear();
        } else {
            let children = std::mem::take(&mut element.children);
            let mut transformed = Vec::with_capacity(children.len());
            for child in children {
                transformed.extend(transform_node(&children_arguments, child)?);
            }
            element.children = transformed;
        }

        // Emptied elements that may not be minimized in web output get the
        // sentinel child so the serializer keeps an explicit end tag.
        if element.is_content_empty()
            && arguments.template_mode().is_web()
            && !element.is_minimizable_in_web_modes()
        {
            element
                .children
                .push(Node::Text(Text::non_executable(
                    NON_MINIMIZABLE_SENTINEL.to_string(),
                )));
        }

        return Ok(vec![Node::Element(element)]);
    }

    if effects.children_removed {
        if !effects.tag_substituted {
            return Ok(Vec::new());
        }
        // Each substitution tag is processed under the element's incoming
        // arguments plus the element's accumulated variables merged with
        // the substitution's own.
        let substitution_tags = std::mem::take(&mut effects.substitution_tags);
        let mut replacement = Vec::with_capacity(substitution_tags.len());
        for substitution in substitution_tags {
            let mut substitution_variables = effects.local_variables.clone();
            substitution_variables.extend(substitution.local_variables);
            let substitution_arguments =
                effects.scoped_arguments(arguments, &substitution_variables);
            replacement.extend(transform_node(&substitution_arguments, substitution.node)?);
        }
        return Ok(replacement);
    }

    // Remove the tag only: its transformed children take its place.
    let children = std::mem::take(&mut element.children);
    let mut replacement = Vec::with_capacity(children.len());
    for child in children {
        replacement.extend(transform_node(&children_arguments, child)?);
    }
    Ok(replacement)
}
