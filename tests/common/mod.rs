//! Shared fixtures for the integration tests.
#![allow(dead_code)] // each test binary uses its own subset

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use weft::resolver::{
    AlwaysValid, NonCacheable, TemplateResolution, TemplateResolver, TemplateValidity,
};
use weft::{TemplateEngine, TemplateMode, WeftError};

/// An in-memory resolver that counts how often each template's bytes are
/// actually read. A cache hit serves the parsed tree without coming back
/// here, so the counter tells us when a real re-parse happened.
#[derive(Debug)]
pub struct CountingResolver {
    templates: RwLock<HashMap<String, String>>,
    reads: AtomicUsize,
    mode: TemplateMode,
    cacheable: bool,
}

impl CountingResolver {
    pub fn new(mode: TemplateMode, cacheable: bool) -> Self {
        CountingResolver {
            templates: RwLock::new(HashMap::new()),
            reads: AtomicUsize::new(0),
            mode,
            cacheable,
        }
    }

    pub fn add_template(&self, name: impl Into<String>, source: impl Into<String>) {
        self.templates
            .write()
            .expect("template table lock")
            .insert(name.into(), source.into());
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl TemplateResolver for CountingResolver {
    fn name(&self) -> &str {
        "CountingResolver"
    }

    fn resolve(&self, template_name: &str) -> Option<TemplateResolution> {
        let templates = self.templates.read().ok()?;
        if !templates.contains_key(template_name) {
            return None;
        }
        let validity: Arc<dyn TemplateValidity> = if self.cacheable {
            Arc::new(AlwaysValid)
        } else {
            Arc::new(NonCacheable)
        };
        Some(TemplateResolution {
            template_name: template_name.to_string(),
            resource_name: template_name.to_string(),
            mode: self.mode,
            character_encoding: None,
            validity,
        })
    }

    fn read(&self, resource_name: &str) -> Result<Vec<u8>, weft::resolver::ResolverError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.templates
            .read()
            .expect("template table lock")
            .get(resource_name)
            .map(|source| source.as_bytes().to_vec())
            .ok_or_else(|| weft::resolver::ResolverError::NotFound(resource_name.to_string()))
    }
}

/// An engine over one counting resolver pre-loaded with `templates`.
pub fn engine_with_templates(
    mode: TemplateMode,
    cacheable: bool,
    templates: &[(&str, &str)],
) -> Result<(TemplateEngine, Arc<CountingResolver>), WeftError> {
    let _ = env_logger::builder().is_test(true).try_init();
    let resolver = Arc::new(CountingResolver::new(mode, cacheable));
    for (name, source) in templates {
        resolver.add_template(*name, *source);
    }
    let engine = TemplateEngine::new();
    engine.add_template_resolver(Arc::clone(&resolver) as Arc<dyn TemplateResolver>)?;
    Ok((engine, resolver))
}
