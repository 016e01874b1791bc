//! The engine facade: configuration, one-shot initialization and template
//! processing.

use crate::repository::TemplateRepository;
use crate::WeftError;
use std::sync::{Arc, Mutex};
use weft_engine::{
    transform_document, Arguments, Context, Dialect, DialectConfiguration, EngineConfiguration,
};
use weft_standard::StandardDialect;
use weft_traits::{MessageResolver, TemplateResolver};

/// Templates cached by default before least-recently-used eviction kicks
/// in.
pub const DEFAULT_CACHE_CAPACITY: usize = 200;

/// Everything built at initialization time; read-only afterwards and
/// shared by every concurrent execution.
struct EngineCore {
    configuration: Arc<EngineConfiguration>,
    repository: TemplateRepository,
}

/// The weft template engine.
///
/// Dialects, template resolvers, message resolvers and the cache capacity
/// are configuration-time inputs: they may only be changed before the
/// first execution (or explicit [`TemplateEngine::initialize`] call).
/// After that the engine is immutable and safe to share across threads;
/// [`TemplateEngine::process`] takes `&self` and any number of executions
/// may run concurrently.
pub struct TemplateEngine {
    pending: Mutex<PendingConfiguration>,
    core: Mutex<Option<Arc<EngineCore>>>,
}

struct PendingConfiguration {
    // (prefix override, dialect); None means the dialect's own prefix.
    dialects: Vec<(Option<String>, Arc<dyn Dialect>)>,
    template_resolvers: Vec<Arc<dyn TemplateResolver>>,
    message_resolvers: Vec<Arc<dyn MessageResolver>>,
    cache_capacity: usize,
}

impl TemplateEngine {
    /// A new engine with the standard dialect pre-registered.
    pub fn new() -> Self {
        TemplateEngine {
            pending: Mutex::new(PendingConfiguration {
                dialects: vec![(None, Arc::new(StandardDialect::new()))],
                template_resolvers: Vec::new(),
                message_resolvers: Vec::new(),
                cache_capacity: DEFAULT_CACHE_CAPACITY,
            }),
            core: Mutex::new(None),
        }
    }

    /// A new engine with no dialects at all. At least one dialect must be
    /// registered before initialization.
    pub fn without_dialects() -> Self {
        let engine = Self::new();
        if let Ok(mut pending) = engine.pending.lock() {
            pending.dialects.clear();
        }
        engine
    }

    /// Replaces the registered dialects with exactly this one.
    pub fn set_dialect(&self, dialect: Arc<dyn Dialect>) -> Result<(), WeftError> {
        self.mutate(|pending| pending.dialects = vec![(None, dialect)])
    }

    /// Registers an additional dialect under its own prefix.
    pub fn add_dialect(&self, dialect: Arc<dyn Dialect>) -> Result<(), WeftError> {
        self.mutate(|pending| pending.dialects.push((None, dialect)))
    }

    /// Registers an additional dialect under an explicit prefix,
    /// overriding the dialect's own.
    pub fn add_dialect_with_prefix(
        &self,
        prefix: impl Into<String>,
        dialect: Arc<dyn Dialect>,
    ) -> Result<(), WeftError> {
        let prefix = prefix.into();
        self.mutate(|pending| pending.dialects.push((Some(prefix), dialect)))
    }

    /// Appends a template resolver to the resolution chain.
    pub fn add_template_resolver(
        &self,
        resolver: Arc<dyn TemplateResolver>,
    ) -> Result<(), WeftError> {
        self.mutate(|pending| pending.template_resolvers.push(resolver))
    }

    /// Appends a message resolver to the message lookup chain.
    pub fn add_message_resolver(
        &self,
        resolver: Arc<dyn MessageResolver>,
    ) -> Result<(), WeftError> {
        self.mutate(|pending| pending.message_resolvers.push(resolver))
    }

    /// Sets the parsed-template cache capacity. `0` disables caching.
    pub fn set_cache_capacity(&self, capacity: usize) -> Result<(), WeftError> {
        self.mutate(|pending| pending.cache_capacity = capacity)
    }

    fn mutate(
        &self,
        change: impl FnOnce(&mut PendingConfiguration),
    ) -> Result<(), WeftError> {
        if self.is_initialized() {
            return Err(WeftError::Configuration(
                "the engine has already been initialized: dialects, resolvers and cache \
                 settings can only be changed before the first execution"
                    .to_string(),
            ));
        }
        let mut pending = match self.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        };
        change(&mut pending);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.core.lock().map(|core| core.is_some()).unwrap_or(false)
    }

    /// Builds the merged dialect configuration and the template
    /// repository. Runs at most once; later calls are no-ops. Processing a
    /// template initializes the engine implicitly.
    pub fn initialize(&self) -> Result<(), WeftError> {
        self.initialized_core().map(|_| ())
    }

    fn initialized_core(&self) -> Result<Arc<EngineCore>, WeftError> {
        let mut core = match self.core.lock() {
            Ok(core) => core,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(core) = core.as_ref() {
            return Ok(Arc::clone(core));
        }

        let pending = match self.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        };
        if pending.template_resolvers.is_empty() {
            return Err(WeftError::Configuration(
                "no template resolver has been registered".to_string(),
            ));
        }

        let mut dialect_configurations = Vec::with_capacity(pending.dialects.len());
        for (prefix, dialect) in &pending.dialects {
            let configuration = match prefix {
                Some(prefix) => {
                    DialectConfiguration::with_prefix(Some(prefix.clone()), Arc::clone(dialect))
                }
                None => DialectConfiguration::new(Arc::clone(dialect)),
            }
            .map_err(|e| WeftError::Configuration(e.to_string()))?;
            dialect_configurations.push(configuration);
        }

        let configuration = Arc::new(
            EngineConfiguration::build(
                dialect_configurations,
                pending.message_resolvers.clone(),
            )
            .map_err(|e| WeftError::Configuration(e.to_string()))?,
        );

        log::info!(
            "initializing template engine: {} dialect/s, {} template resolver/s, cache \
             capacity {}",
            pending.dialects.len(),
            pending.template_resolvers.len(),
            pending.cache_capacity
        );

        let repository = TemplateRepository::new(
            Arc::clone(&configuration),
            pending.template_resolvers.clone(),
            pending.cache_capacity,
        );

        let built = Arc::new(EngineCore {
            configuration,
            repository,
        });
        *core = Some(Arc::clone(&built));
        Ok(built)
    }

    /// Processes a template against a context and returns the rendered
    /// markup. Initializes the engine on first use.
    pub fn process(&self, template_name: &str, context: &Context) -> Result<String, WeftError> {
        let core = self.initialized_core()?;

        let template = core.repository.get_template(template_name)?;
        let mode = template.resolution().mode;
        let mut document = template.into_document();

        // Each top-level call gets a fresh Arguments (and with it a fresh
        // identifier-count map).
        let arguments = Arguments::new(
            Arc::clone(&core.configuration),
            template_name,
            mode,
            Arc::new(context.clone()),
        );

        transform_document(&mut document, &arguments)
            .map_err(|source| WeftError::processing(template_name, source))?;

        if let Some(doc_type) = &document.doc_type {
            document.doc_type = Some(core.configuration.translate_doc_type(doc_type));
        }

        weft_dom::write::write_document(&document, mode).map_err(|source| WeftError::Write {
            name: template_name.to_string(),
            source,
        })
    }

    /// Resolves an externalized message outside of template processing.
    pub fn resolve_message(&self, locale: Option<&str>, key: &str) -> Option<String> {
        let core = self.initialized_core().ok()?;
        core.configuration
            .message_resolvers()
            .iter()
            .find_map(|resolver| resolver.resolve_message(locale, key))
    }

    /// Drops every cached parsed template.
    pub fn clear_template_cache(&self) {
        if let Some(core) = self.core.lock().ok().and_then(|core| core.clone()) {
            core.repository.clear_cache();
        }
    }

    /// Drops one template's cached parse result.
    pub fn clear_template_cache_for(&self, template_name: &str) {
        if let Some(core) = self.core.lock().ok().and_then(|core| core.clone()) {
            core.repository.clear_cache_for(template_name);
        }
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}
