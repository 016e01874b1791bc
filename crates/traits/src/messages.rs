//! Message resolution for externalized texts (`#{...}` expressions in the
//! standard dialect). Message formats are out of scope; this is only the
//! key → text lookup seam.

use std::collections::HashMap;
use std::sync::RwLock;

/// Resolves an externalized message by key, optionally locale-specific.
pub trait MessageResolver: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the message text, or `None` when the key is unknown to this
    /// resolver (the next registered resolver is then consulted).
    fn resolve_message(&self, locale: Option<&str>, key: &str) -> Option<String>;
}

/// A message resolver backed by an in-memory table. Messages registered
/// without a locale act as fallbacks for every locale.
#[derive(Debug, Default)]
pub struct InMemoryMessageResolver {
    // locale ("" = fallback) -> key -> text
    messages: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl InMemoryMessageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(
        &self,
        locale: Option<&str>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) {
        if let Ok(mut messages) = self.messages.write() {
            messages
                .entry(locale.unwrap_or("").to_string())
                .or_default()
                .insert(key.into(), text.into());
        }
    }
}

impl MessageResolver for InMemoryMessageResolver {
    fn name(&self) -> &str {
        "InMemoryMessageResolver"
    }

    fn resolve_message(&self, locale: Option<&str>, key: &str) -> Option<String> {
        let messages = self.messages.read().ok()?;
        if let Some(locale) = locale {
            if let Some(text) = messages.get(locale).and_then(|table| table.get(key)) {
                return Some(text.clone());
            }
        }
        messages.get("").and_then(|table| table.get(key)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_lookup_with_fallback() {
        let resolver = InMemoryMessageResolver::new();
        resolver.add_message(None, "greeting", "Hello");
        resolver.add_message(Some("es"), "greeting", "Hola");

        assert_eq!(
            resolver.resolve_message(Some("es"), "greeting").as_deref(),
            Some("Hola")
        );
        assert_eq!(
            resolver.resolve_message(Some("de"), "greeting").as_deref(),
            Some("Hello")
        );
        assert_eq!(
            resolver.resolve_message(None, "greeting").as_deref(),
            Some("Hello")
        );
        assert_eq!(resolver.resolve_message(None, "absent"), None);
    }
}
