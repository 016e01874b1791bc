//! Cache validity predicates attached to template resolutions.

use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

/// Governs whether a parsed template may be cached, and whether an entry
/// already sitting in the cache is still usable.
///
/// `is_still_valid` may be re-checked by the cache on every read, which is
/// how resolvers backed by mutable resources invalidate entries selectively
/// without a global cache clear.
pub trait TemplateValidity: Send + Sync {
    /// Whether the parsed template may be stored in the cache at all.
    fn is_cacheable(&self) -> bool;

    /// Whether a cached entry created under this validity is still good.
    /// Only consulted for cacheable resolutions.
    fn is_still_valid(&self) -> bool {
        true
    }
}

/// Cacheable forever. The right choice for immutable template sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysValid;

impl TemplateValidity for AlwaysValid {
    fn is_cacheable(&self) -> bool {
        true
    }
}

/// Never cached; every request re-parses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonCacheable;

impl TemplateValidity for NonCacheable {
    fn is_cacheable(&self) -> bool {
        false
    }
}

/// Cacheable for a fixed duration after resolution.
#[derive(Debug)]
pub struct TtlValidity {
    created: Instant,
    time_to_live: Duration,
}

impl TtlValidity {
    pub fn new(time_to_live: Duration) -> Self {
        TtlValidity {
            created: Instant::now(),
            time_to_live,
        }
    }
}

impl TemplateValidity for TtlValidity {
    fn is_cacheable(&self) -> bool {
        true
    }

    fn is_still_valid(&self) -> bool {
        self.created.elapsed() <= self.time_to_live
    }
}

/// Cacheable while the backing file's modification timestamp is unchanged
/// from the moment of resolution.
#[derive(Debug)]
pub struct FileTimestampValidity {
    path: PathBuf,
    modified_at_resolution: Option<SystemTime>,
}

impl FileTimestampValidity {
    pub fn new(path: PathBuf) -> Self {
        let modified_at_resolution = modification_time(&path);
        FileTimestampValidity {
            path,
            modified_at_resolution,
        }
    }
}

impl TemplateValidity for FileTimestampValidity {
    fn is_cacheable(&self) -> bool {
        true
    }

    fn is_still_valid(&self) -> bool {
        modification_time(&self.path) == self.modified_at_resolution
    }
}

fn modification_time(path: &std::path::Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_always_valid() {
        assert!(AlwaysValid.is_cacheable());
        assert!(AlwaysValid.is_still_valid());
    }

    #[test]
    fn test_non_cacheable() {
        assert!(!NonCacheable.is_cacheable());
    }

    #[test]
    fn test_ttl_expiry() {
        let validity = TtlValidity::new(Duration::from_secs(3600));
        assert!(validity.is_still_valid());

        let expired = TtlValidity {
            created: Instant::now() - Duration::from_secs(2),
            time_to_live: Duration::from_secs(1),
        };
        assert!(!expired.is_still_valid());
    }

    #[test]
    fn test_file_timestamp_invalidation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "<p>a</p>").unwrap();
        file.flush().unwrap();

        let validity = FileTimestampValidity::new(file.path().to_path_buf());
        assert!(validity.is_cacheable());
        assert!(validity.is_still_valid());

        // Force a different mtime.
        let new_time = SystemTime::now() + Duration::from_secs(10);
        file.as_file()
            .set_modified(new_time)
            .expect("set_modified supported");
        assert!(!validity.is_still_valid());
    }
}
