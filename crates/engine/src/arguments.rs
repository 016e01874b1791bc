//! The execution context handed to every processor invocation.
//!
//! `Arguments` is an immutable snapshot with structural sharing: deriving a
//! new one (to add local variables, select a target or set an inliner) is a
//! cheap clone plus the delta, and never affects the instance the parent or
//! the siblings see. The single deliberate exception is the id-count map,
//! which is shared by reference across every `Arguments` derived within one
//! top-level template execution so that repeated identifiers receive
//! monotonically increasing suffixes regardless of tree branch.

use crate::config::EngineConfiguration;
use crate::dialect::ExecutionAttribute;
use crate::processor::TextInliner;
use crate::{Context, EngineError, ExpressionEvaluator, EVALUATOR_EXECUTION_ATTRIBUTE};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use weft_dom::TemplateMode;

#[derive(Clone)]
pub struct Arguments {
    configuration: Arc<EngineConfiguration>,
    template_name: Arc<str>,
    template_mode: TemplateMode,
    context: Arc<Context>,
    local_variables: Arc<HashMap<String, Value>>,
    // None = no selection; Some(Value::Null) = an explicitly selected null.
    selection_target: Option<Arc<Value>>,
    text_inliner: Option<Arc<dyn TextInliner>>,
    id_counts: Arc<Mutex<HashMap<String, usize>>>,
}

impl Arguments {
    /// Creates the root `Arguments` of one top-level template execution,
    /// with empty locals and a fresh id-count map.
    pub fn new(
        configuration: Arc<EngineConfiguration>,
        template_name: &str,
        template_mode: TemplateMode,
        context: Arc<Context>,
    ) -> Self {
        Arguments {
            configuration,
            template_name: Arc::from(template_name),
            template_mode,
            context,
            local_variables: Arc::new(HashMap::new()),
            selection_target: None,
            text_inliner: None,
            id_counts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn configuration(&self) -> &Arc<EngineConfiguration> {
        &self.configuration
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn template_mode(&self) -> TemplateMode {
        self.template_mode
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Looks a variable up: local variables shadow context variables.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.local_variables
            .get(name)
            .or_else(|| self.context.variable(name))
    }

    pub fn local_variables(&self) -> &HashMap<String, Value> {
        &self.local_variables
    }

    pub fn has_local_variable(&self, name: &str) -> bool {
        self.local_variables.contains_key(name)
    }

    pub fn has_selection_target(&self) -> bool {
        self.selection_target.is_some()
    }

    pub fn selection_target(&self) -> Option<&Value> {
        self.selection_target.as_deref()
    }

    pub fn has_text_inliner(&self) -> bool {
        self.text_inliner.is_some()
    }

    pub fn text_inliner(&self) -> Option<&Arc<dyn TextInliner>> {
        self.text_inliner.as_ref()
    }

    pub fn execution_attribute(&self, name: &str) -> Option<&ExecutionAttribute> {
        self.configuration.execution_attribute(name)
    }

    /// The expression evaluator registered by the configured dialects.
    pub fn evaluator(&self) -> Result<Arc<dyn ExpressionEvaluator>, EngineError> {
        match self.execution_attribute(EVALUATOR_EXECUTION_ATTRIBUTE) {
            Some(ExecutionAttribute::Evaluator(evaluator)) => Ok(Arc::clone(evaluator)),
            Some(ExecutionAttribute::Value(_)) => Err(EngineError::Configuration(format!(
                "execution attribute \"{EVALUATOR_EXECUTION_ATTRIBUTE}\" is not an \
                 expression evaluator"
            ))),
            None => Err(EngineError::Configuration(format!(
                "no expression evaluator has been configured (no dialect registered the \
                 \"{EVALUATOR_EXECUTION_ATTRIBUTE}\" execution attribute)"
            ))),
        }
    }

    /// Resolves an externalized message through the configured resolvers,
    /// in registration order, using the context's locale.
    pub fn resolve_message(&self, key: &str) -> Option<String> {
        let locale = self.context.locale();
        self.configuration
            .message_resolvers()
            .iter()
            .find_map(|resolver| resolver.resolve_message(locale, key))
    }

    /// Returns the next suffix for a repeated identifier and advances the
    /// count. Counts start at 1 and are shared across the whole top-level
    /// execution.
    pub fn next_id_seq(&self, id: &str) -> usize {
        let mut counts = match self.id_counts.lock() {
            Ok(counts) => counts,
            Err(poisoned) => poisoned.into_inner(),
        };
        let count = counts.entry(id.to_string()).or_insert(1);
        let current = *count;
        *count += 1;
        current
    }

    // --- Derivation ---

    /// Derives an `Arguments` with additional local variables. Returns a
    /// plain clone when the delta is empty.
    pub fn add_local_variables(&self, new_variables: &HashMap<String, Value>) -> Arguments {
        if new_variables.is_empty() {
            return self.clone();
        }
        let mut merged = (*self.local_variables).clone();
        merged.extend(new_variables.iter().map(|(k, v)| (k.clone(), v.clone())));
        let mut derived = self.clone();
        derived.local_variables = Arc::new(merged);
        derived
    }

    /// Derives an `Arguments` with a new selection target.
    pub fn set_selection_target(&self, target: Value) -> Arguments {
        let mut derived = self.clone();
        derived.selection_target = Some(Arc::new(target));
        derived
    }

    /// Derives an `Arguments` with the text inliner set (or, with `None`,
    /// explicitly deactivated for this scope).
    pub fn set_text_inliner(&self, inliner: Option<Arc<dyn TextInliner>>) -> Arguments {
        let mut derived = self.clone();
        derived.text_inliner = inliner;
        derived
    }

    pub fn add_local_variables_and_set_selection_target(
        &self,
        new_variables: &HashMap<String, Value>,
        target: Value,
    ) -> Arguments {
        self.add_local_variables(new_variables)
            .set_selection_target(target)
    }

    pub fn add_local_variables_and_set_text_inliner(
        &self,
        new_variables: &HashMap<String, Value>,
        inliner: Option<Arc<dyn TextInliner>>,
    ) -> Arguments {
        self.add_local_variables(new_variables)
            .set_text_inliner(inliner)
    }

    pub fn set_text_inliner_and_selection_target(
        &self,
        inliner: Option<Arc<dyn TextInliner>>,
        target: Value,
    ) -> Arguments {
        self.set_text_inliner(inliner).set_selection_target(target)
    }

    pub fn add_local_variables_and_text_inliner_and_selection_target(
        &self,
        new_variables: &HashMap<String, Value>,
        inliner: Option<Arc<dyn TextInliner>>,
        target: Value,
    ) -> Arguments {
        self.add_local_variables(new_variables)
            .set_text_inliner(inliner)
            .set_selection_target(target)
    }
}
