//! The processor contract: what a dialect plugs into the engine.
//!
//! A processor is bound to an element name, an attribute name or a node
//! kind, carries an integer precedence (lower runs first), and returns a
//! [`ProcessResult`] describing the structural action to apply plus the
//! context deltas (local variables, selection target, text inliner) that
//! should scope over the node's attributes and children.

use crate::{Arguments, EngineError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use weft_dom::{Element, Node, NodeKind, Text};

/// What a processor's matcher is keyed on. Names are unprefixed here; the
/// owning dialect's prefix is applied when its configuration is indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    ElementName(String),
    AttributeName(String),
    /// Non-specific: a candidate for every node of the kind, subject to the
    /// processor's applicability filter.
    NodeKind(NodeKind),
}

/// A processor bound to element (tag) occurrences.
pub trait ElementProcessor: Send + Sync {
    fn matcher(&self) -> Matcher;

    /// Ordering key among processors attached to the same node; lower
    /// values execute earlier.
    fn precedence(&self) -> i32;

    /// Matcher-level filter: whether this processor actually claims the
    /// concrete element. Used both at resolution and annotation time.
    fn applies_to(&self, _element: &Element) -> bool {
        true
    }

    fn process(
        &self,
        arguments: &Arguments,
        element: &mut Element,
    ) -> Result<ProcessResult, EngineError>;
}

/// A processor bound to attribute occurrences on elements.
pub trait AttributeProcessor: Send + Sync {
    /// Must be a [`Matcher::AttributeName`]; validated when the owning
    /// dialect is configured.
    fn matcher(&self) -> Matcher;

    fn precedence(&self) -> i32;

    fn applies_to(&self, _element: &Element, _attribute_value: &str) -> bool {
        true
    }

    /// Processes the attribute `attribute_name` (normalized) on `element`.
    /// The attribute is still present on the element when called.
    fn process(
        &self,
        arguments: &Arguments,
        element: &mut Element,
        attribute_name: &str,
    ) -> Result<ProcessResult, EngineError>;
}

/// A dialect-contributed processor, classified by target kind.
#[derive(Clone)]
pub enum Processor {
    Element(Arc<dyn ElementProcessor>),
    Attribute(Arc<dyn AttributeProcessor>),
}

/// A pluggable rewriter for literal text nodes, active only within the
/// scope where a processor set it and only over nodes still marked
/// executable (generated text is never re-processed).
pub trait TextInliner: Send + Sync {
    fn name(&self) -> &str;

    fn inline(&self, arguments: &Arguments, text: &mut Text) -> Result<(), EngineError>;
}

/// Structural action requested by a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomAction {
    #[default]
    None,
    /// Remove the tag, splicing its children into its place.
    RemoveTag,
    /// Keep the tag, drop its children.
    RemoveChildren,
    /// Remove the tag and everything below it.
    RemoveTagAndChildren,
    /// Remove the processed attribute only (attribute processors).
    RemoveAttribute,
    /// Remove the tag and children, handing its place to the result's
    /// substitution tags.
    SubstituteTag,
}

impl DomAction {
    pub fn is_tag_removed(self) -> bool {
        matches!(
            self,
            DomAction::RemoveTag | DomAction::RemoveTagAndChildren | DomAction::SubstituteTag
        )
    }

    pub fn is_children_removed(self) -> bool {
        matches!(
            self,
            DomAction::RemoveChildren | DomAction::RemoveTagAndChildren | DomAction::SubstituteTag
        )
    }

    pub fn is_tag_substituted(self) -> bool {
        matches!(self, DomAction::SubstituteTag)
    }

    pub fn is_attribute_removed(self) -> bool {
        matches!(self, DomAction::RemoveAttribute)
    }
}

/// A node (plus its own local variables) that takes the place of a
/// substituted element.
pub struct SubstitutionTag {
    pub node: Node,
    pub local_variables: HashMap<String, Value>,
}

impl SubstitutionTag {
    pub fn new(node: Node) -> Self {
        SubstitutionTag {
            node,
            local_variables: HashMap::new(),
        }
    }

    pub fn with_local_variables(node: Node, local_variables: HashMap<String, Value>) -> Self {
        SubstitutionTag {
            node,
            local_variables,
        }
    }
}

/// The delta a processor returns to the engine.
///
/// `text_inliner` is tracked with a separate `set` flag because setting the
/// inliner *to nothing* (deactivating an outer inliner for this scope) is
/// distinct from leaving it untouched. The selection target needs no such
/// flag: selecting "null" is represented by `Value::Null`.
#[derive(Default)]
pub struct ProcessResult {
    pub action: DomAction,
    pub local_variables: HashMap<String, Value>,
    pub selection_target: Option<Value>,
    pub text_inliner_set: bool,
    pub text_inliner: Option<Arc<dyn TextInliner>>,
    pub substitution_tags: Vec<SubstitutionTag>,
}

impl ProcessResult {
    pub fn no_action() -> Self {
        Self::default()
    }

    pub fn for_action(action: DomAction) -> Self {
        ProcessResult {
            action,
            ..Self::default()
        }
    }

    pub fn remove_tag() -> Self {
        Self::for_action(DomAction::RemoveTag)
    }

    pub fn remove_children() -> Self {
        Self::for_action(DomAction::RemoveChildren)
    }

    pub fn remove_tag_and_children() -> Self {
        Self::for_action(DomAction::RemoveTagAndChildren)
    }

    pub fn remove_attribute() -> Self {
        Self::for_action(DomAction::RemoveAttribute)
    }

    pub fn substitute(substitution_tags: Vec<SubstitutionTag>) -> Self {
        ProcessResult {
            action: DomAction::SubstituteTag,
            substitution_tags,
            ..Self::default()
        }
    }

    pub fn with_local_variables(mut self, local_variables: HashMap<String, Value>) -> Self {
        self.local_variables = local_variables;
        self
    }

    pub fn with_selection_target(mut self, target: Value) -> Self {
        self.selection_target = Some(target);
        self
    }

    /// Sets (or, with `None`, explicitly deactivates) the text inliner for
    /// the scope of this node's children.
    pub fn with_text_inliner(mut self, inliner: Option<Arc<dyn TextInliner>>) -> Self {
        self.text_inliner_set = true;
        self.text_inliner = inliner;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dom_action_flags() {
        assert!(DomAction::RemoveTag.is_tag_removed());
        assert!(!DomAction::RemoveTag.is_children_removed());

        assert!(DomAction::RemoveTagAndChildren.is_tag_removed());
        assert!(DomAction::RemoveTagAndChildren.is_children_removed());

        assert!(DomAction::SubstituteTag.is_tag_removed());
        assert!(DomAction::SubstituteTag.is_children_removed());
        assert!(DomAction::SubstituteTag.is_tag_substituted());

        assert!(DomAction::RemoveChildren.is_children_removed());
        assert!(!DomAction::RemoveChildren.is_tag_removed());

        assert!(DomAction::RemoveAttribute.is_attribute_removed());
        assert!(!DomAction::RemoveAttribute.is_tag_removed());

        assert!(!DomAction::None.is_tag_removed());
        assert!(!DomAction::None.is_children_removed());
    }

    #[test]
    fn test_process_result_builders() {
        let result = ProcessResult::remove_tag();
        assert_eq!(result.action, DomAction::RemoveTag);
        assert!(result.local_variables.is_empty());
        assert!(!result.text_inliner_set);

        let result = ProcessResult::no_action().with_text_inliner(None);
        assert!(result.text_inliner_set);
        assert!(result.text_inliner.is_none());

        let result =
            ProcessResult::no_action().with_selection_target(serde_json::Value::Null);
        assert_eq!(result.selection_target, Some(serde_json::Value::Null));
    }
}
