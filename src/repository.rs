//! Template resolution, parsing and caching.
//!
//! The repository is where the resolver chain, the parser pool, the
//! executability annotator and the parsed-template cache meet. Its one
//! hard rule is the deep-copy law: a caller never receives an alias of a
//! cached tree — both cache hits and freshly cached parses hand out deep
//! copies, because the caller is about to mutate the tree in place.

use crate::WeftError;
use std::sync::Arc;
use weft_cache::LruCache;
use weft_dom::Document;
use weft_engine::{annotate_document, EngineConfiguration};
use weft_parser::ParserPool;
use weft_traits::{TemplateResolution, TemplateResolver};

/// A parsed, annotated template as stored in (and served from) the
/// repository.
pub struct Template {
    name: String,
    resolution: TemplateResolution,
    document: Document,
}

impl Template {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolution(&self) -> &TemplateResolution {
        &self.resolution
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Deep copy, executability flags included.
    pub fn deep_clone(&self) -> Template {
        Template {
            name: self.name.clone(),
            resolution: self.resolution.clone(),
            document: self.document.deep_clone(),
        }
    }
}

/// Resolves template names to parsed [`Template`]s, caching the parse
/// results of resolutions that declare themselves cacheable.
pub struct TemplateRepository {
    configuration: Arc<EngineConfiguration>,
    resolvers: Vec<Arc<dyn TemplateResolver>>,
    parser_pool: ParserPool,
    cache: LruCache<String, Arc<Template>>,
}

impl TemplateRepository {
    pub fn new(
        configuration: Arc<EngineConfiguration>,
        resolvers: Vec<Arc<dyn TemplateResolver>>,
        cache_capacity: usize,
    ) -> Self {
        TemplateRepository {
            configuration,
            resolvers,
            parser_pool: ParserPool::new(),
            cache: LruCache::new("TEMPLATE_CACHE", cache_capacity),
        }
    }

    /// Fetches a template, from the cache when possible.
    ///
    /// The returned value is always a deep copy owned by the caller; no
    /// amount of mutation affects later calls for the same name. Entries
    /// whose validity predicate has expired are re-resolved and re-parsed.
    pub fn get_template(&self, template_name: &str) -> Result<Template, WeftError> {
        let key = template_name.to_string();
        let cached = self.cache.get_valid(&key, |_, template: &Arc<Template>| {
            template.resolution.validity.is_still_valid()
        });
        if let Some(template) = cached {
            return Ok(template.deep_clone());
        }

        let (resolution, bytes) = self.resolve(template_name)?;
        log::debug!(
            "template \"{}\" resolved as \"{}\" in mode {}",
            template_name,
            resolution.resource_name,
            resolution.mode
        );

        let mut document = self
            .parser_pool
            .parse_bytes(&bytes, resolution.character_encoding.as_deref(), resolution.mode)
            .map_err(|source| WeftError::Parse {
                name: template_name.to_string(),
                source,
            })?;

        annotate_document(&mut document, &self.configuration, resolution.mode)
            .map_err(|source| WeftError::processing(template_name, source))?;

        let template = Template {
            name: template_name.to_string(),
            resolution,
            document,
        };

        if template.resolution.validity.is_cacheable() {
            let stored = Arc::new(template);
            self.cache.put(key, Arc::clone(&stored));
            return Ok(stored.deep_clone());
        }
        Ok(template)
    }

    /// Consults the resolver chain in registration order. A resolver that
    /// resolves the name but cannot serve the bytes is skipped.
    fn resolve(&self, template_name: &str) -> Result<(TemplateResolution, Vec<u8>), WeftError> {
        for resolver in &self.resolvers {
            let Some(resolution) = resolver.resolve(template_name) else {
                continue;
            };
            match resolver.read(&resolution.resource_name) {
                Ok(bytes) => return Ok((resolution, bytes)),
                Err(e) => {
                    log::warn!(
                        "resolver \"{}\" resolved template \"{}\" but could not read it: {}",
                        resolver.name(),
                        template_name,
                        e
                    );
                }
            }
        }
        Err(WeftError::TemplateResolution {
            name: template_name.to_string(),
        })
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn clear_cache_for(&self, template_name: &str) {
        self.cache.remove(&template_name.to_string());
    }
}
