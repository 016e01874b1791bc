//! Template resolution: mapping a template name to a readable resource
//! plus the metadata the engine needs to parse and cache it.

use crate::validity::{AlwaysValid, FileTimestampValidity, NonCacheable, TemplateValidity};
use crate::ResolverError;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use weft_dom::TemplateMode;

/// The outcome of resolving a template name: where the bytes live, how they
/// should be parsed, and how long the parsed result may be cached.
#[derive(Clone)]
pub struct TemplateResolution {
    pub template_name: String,
    pub resource_name: String,
    pub mode: TemplateMode,
    /// Declared character encoding of the resource, when known. The engine
    /// only guarantees UTF-8 decoding; other declared encodings surface as
    /// parse faults rather than being silently mis-decoded.
    pub character_encoding: Option<String>,
    pub validity: Arc<dyn TemplateValidity>,
}

impl fmt::Debug for TemplateResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateResolution")
            .field("template_name", &self.template_name)
            .field("resource_name", &self.resource_name)
            .field("mode", &self.mode)
            .field("character_encoding", &self.character_encoding)
            .field("cacheable", &self.validity.is_cacheable())
            .finish()
    }
}

/// Locates templates by name and serves their raw bytes.
///
/// Resolvers are consulted in registration order; the first resolver that
/// both resolves the name and serves a readable resource wins. A resolver
/// that resolves the name but fails to read is skipped (the next resolver
/// gets its chance) and the failure is logged.
pub trait TemplateResolver: Send + Sync + fmt::Debug {
    /// A human-readable name for logging.
    fn name(&self) -> &str;

    /// Maps a template name to resolution metadata, or `None` when this
    /// resolver does not know the template.
    fn resolve(&self, template_name: &str) -> Option<TemplateResolution>;

    /// Reads the bytes of a previously resolved resource.
    fn read(&self, resource_name: &str) -> Result<Vec<u8>, ResolverError>;
}

/// An in-memory resolver mapping template names directly to source strings.
///
/// Non-cacheable by default, mirroring the usual behavior of string-backed
/// template sources; flip with [`StringTemplateResolver::set_cacheable`].
#[derive(Debug)]
pub struct StringTemplateResolver {
    templates: RwLock<HashMap<String, String>>,
    mode: TemplateMode,
    cacheable: bool,
}

impl StringTemplateResolver {
    pub fn new(mode: TemplateMode) -> Self {
        StringTemplateResolver {
            templates: RwLock::new(HashMap::new()),
            mode,
            cacheable: false,
        }
    }

    pub fn set_cacheable(&mut self, cacheable: bool) {
        self.cacheable = cacheable;
    }

    /// Registers a template source under a name. Replaces any previous
    /// source registered under the same name.
    pub fn add_template(&self, template_name: impl Into<String>, source: impl Into<String>) {
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(template_name.into(), source.into());
        }
    }
}

impl TemplateResolver for StringTemplateResolver {
    fn name(&self) -> &str {
        "StringTemplateResolver"
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

    fn read(&self, resource_name: &str) -> Result<Vec<u8>, ResolverError> {
        let templates = self
            .templates
            .read()
            .map_err(|_| ResolverError::ReadFailed {
                resource: resource_name.to_string(),
                message: "template store lock poisoned".to_string(),
            })?;
        templates
            .get(resource_name)
            .map(|source| source.as_bytes().to_vec())
            .ok_or_else(|| ResolverError::NotFound(resource_name.to_string()))
    }
}

/// Resolves templates as files under a base directory, with a configurable
/// suffix (`name` → `<base>/<name><suffix>`). Cached entries are invalidated
/// when the file's modification timestamp changes.
#[derive(Debug)]
pub struct FilesystemTemplateResolver {
    base_dir: PathBuf,
    suffix: String,
    mode: TemplateMode,
}

impl FilesystemTemplateResolver {
    pub fn new(base_dir: impl Into<PathBuf>, suffix: impl Into<String>, mode: TemplateMode) -> Self {
        FilesystemTemplateResolver {
            base_dir: base_dir.into(),
            suffix: suffix.into(),
            mode,
        }
    }

    fn resource_path(&self, template_name: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}{}", template_name, self.suffix))
    }
}

impl TemplateResolver for FilesystemTemplateResolver {
    fn name(&self) -> &str {
        "FilesystemTemplateResolver"
    }

    fn resolve(&self, template_name: &str) -> Option<TemplateResolution> {
        let path = self.resource_path(template_name);
        if !path.is_file() {
            return None;
        }
        let validity = Arc::new(FileTimestampValidity::new(path.clone()));
        Some(TemplateResolution {
            template_name: template_name.to_string(),
            resource_name: path.to_string_lossy().into_owned(),
            mode: self.mode,
            character_encoding: None,
            validity,
        })
    }

    fn read(&self, resource_name: &str) -> Result<Vec<u8>, ResolverError> {
        std::fs::read(resource_name).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ResolverError::NotFound(resource_name.to_string()),
            _ => ResolverError::ReadFailed {
                resource: resource_name.to_string(),
                message: e.to_string(),
            },
        })
    }
}
