//! The caller-supplied processing context: the variables a template is
//! executed against, plus an optional locale for message resolution.

use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Context {
    variables: HashMap<String, Value>,
    locale: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locale(locale: impl Into<String>) -> Self {
        Context {
            variables: HashMap::new(),
            locale: Some(locale.into()),
        }
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }
}
