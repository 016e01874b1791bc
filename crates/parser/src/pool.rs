//! Fixed pools of reusable tree builders.
//!
//! Template executions may run on many threads at once, but parsing cost is
//! bounded by a small fixed number of builder instances per configuration
//! (validating / non-validating / legacy normalizer). Callers are handed a
//! slot by atomic round-robin; the slot mutex then serializes concurrent
//! reentry into the same slot.

#[cfg(feature = "legacy")]
use crate::legacy::LegacyMarkupNormalizer;
use crate::{builder::TreeBuilder, ParseError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use weft_dom::{Document, TemplateMode};

struct PoolSlots<T> {
    slots: Vec<Mutex<T>>,
    next: AtomicUsize,
}

impl<T> PoolSlots<T> {
    fn new(size: usize, mut build: impl FnMut() -> T) -> Self {
        PoolSlots {
            slots: (0..size).map(|_| Mutex::new(build())).collect(),
            next: AtomicUsize::new(0),
        }
    }

    fn checkout(&self) -> &Mutex<T> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.slots.len();
        &self.slots[index]
    }
}

/// The engine-wide parser pool.
pub struct ParserPool {
    size: usize,
    non_validating: PoolSlots<TreeBuilder>,
    validating: PoolSlots<TreeBuilder>,
    #[cfg(feature = "legacy")]
    legacy: PoolSlots<LegacyMarkupNormalizer>,
}

impl ParserPool {
    /// Creates pools sized `max(1, available parallelism - 1)`.
    pub fn new() -> Self {
        let parallelism = num_cpus::get();
        let size = std::cmp::max(1, parallelism.saturating_sub(1));
        log::info!(
            "initializing template parser pools with {} slot/s (available parallelism: {})",
            size,
            parallelism
        );
        Self::with_size(size)
    }

    /// Creates pools with an explicit slot count (mainly for tests).
    pub fn with_size(size: usize) -> Self {
        let size = std::cmp::max(1, size);
        ParserPool {
            size,
            non_validating: PoolSlots::new(size, || TreeBuilder::new(false)),
            validating: PoolSlots::new(size, || TreeBuilder::new(true)),
            #[cfg(feature = "legacy")]
            legacy: PoolSlots::new(size, LegacyMarkupNormalizer::new),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Parses template source in the given mode, using (and blocking on)
    /// one pooled builder.
    pub fn parse(&self, source: &str, mode: TemplateMode) -> Result<Document, ParseError> {
        if mode.is_legacy() {
            let normalized = self.normalize_legacy(source)?;
            return self.parse_standard(&normalized, mode);
        }
        self.parse_standard(source, mode)
    }

    /// Decodes and parses raw template bytes.
    pub fn parse_bytes(
        &self,
        bytes: &[u8],
        declared_encoding: Option<&str>,
        mode: TemplateMode,
    ) -> Result<Document, ParseError> {
        if let Some(encoding) = declared_encoding {
            let normalized = encoding.trim().to_ascii_lowercase();
            if !matches!(normalized.as_str(), "utf-8" | "utf8" | "us-ascii" | "ascii") {
                return Err(ParseError::UnsupportedEncoding(encoding.to_string()));
            }
        }
        let source = std::str::from_utf8(bytes)?;
        self.parse(source, mode)
    }

    fn parse_standard(&self, source: &str, mode: TemplateMode) -> Result<Document, ParseError> {
        let pool = if mode.is_validating() {
            &self.validating
        } else {
            &self.non_validating
        };
        let slot = pool.checkout();
        let mut builder = match slot.lock() {
            Ok(builder) => builder,
            Err(poisoned) => poisoned.into_inner(),
        };
        builder.parse(source)
    }

    #[cfg(feature = "legacy")]
    fn normalize_legacy(&self, source: &str) -> Result<String, ParseError> {
        let slot = self.legacy.checkout();
        let mut normalizer = match slot.lock() {
            Ok(normalizer) => normalizer,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(normalizer.normalize(source))
    }

    #[cfg(not(feature = "legacy"))]
    fn normalize_legacy(&self, _source: &str) -> Result<String, ParseError> {
        Err(ParseError::LegacyUnavailable)
    }
}

impl Default for ParserPool {
    fn default() -> Self {
        Self::new()
    }
}
