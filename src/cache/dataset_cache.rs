//! Memoized dataset loading
//!
//! Entries are keyed by [`SourceKey`]: the canonical path plus the file's
//! modification time and length. A lookup whose key no longer matches the
//! cached entry for that path reloads the file and replaces the entry.
//!
//! File contents are not hashed. A rewrite that keeps the same length and
//! lands within the filesystem's timestamp granularity looks unchanged and
//! is served from the cache; call [`DatasetCache::invalidate`] after such a
//! write.

use crate::dataset::{load_normalized, NormalizedDataset};
use crate::error::{ListingsError, Result};
use crate::preprocessing::NormalizerConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

/// Identity of a source file at one point in time.
///
/// Two stats of the same file compare equal unless its mtime or length moved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceKey {
    /// Stat `path`. A file that cannot be stat'ed is unavailable.
    pub fn for_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let canonical = path
            .canonicalize()
            .map_err(|e| ListingsError::source_unavailable(&display, e))?;
        let metadata = std::fs::metadata(&canonical)
            .map_err(|e| ListingsError::source_unavailable(&display, e))?;

        Ok(Self {
            path: canonical,
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

/// Cache hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub reloads: u64,
}

struct CacheEntry {
    key: SourceKey,
    dataset: Arc<NormalizedDataset>,
}

/// Cache of normalized datasets, one entry per source path
pub struct DatasetCache {
    config: NormalizerConfig,
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
    stats: RwLock<CacheStats>,
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl DatasetCache {
    /// Create an empty cache normalizing with `config`
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Return the normalized dataset for `path`, loading it on first use or
    /// when the file changed since it was cached
    pub fn get_or_load(&self, path: impl AsRef<Path>) -> Result<Arc<NormalizedDataset>> {
        let key = SourceKey::for_path(path.as_ref())?;

        if let Some(dataset) = self.lookup(&key) {
            self.stats.write().hits += 1;
            return Ok(dataset);
        }

        let mut entries = self.entries.write();
        // Another caller may have loaded it while we waited for the lock
        if let Some(entry) = entries.get(&key.path).filter(|e| e.key == key) {
            self.stats.write().hits += 1;
            return Ok(Arc::clone(&entry.dataset));
        }

        let dataset = Arc::new(load_normalized(path.as_ref(), &self.config)?);

        let replaced = entries
            .insert(
                key.path.clone(),
                CacheEntry {
                    key,
                    dataset: Arc::clone(&dataset),
                },
            )
            .is_some();

        let mut stats = self.stats.write();
        stats.misses += 1;
        if replaced {
            stats.reloads += 1;
            tracing::info!(path = %path.as_ref().display(), "Source changed, reloaded dataset");
        }

        Ok(dataset)
    }

    fn lookup(&self, key: &SourceKey) -> Option<Arc<NormalizedDataset>> {
        self.entries
            .read()
            .get(&key.path)
            .filter(|entry| entry.key == *key)
            .map(|entry| Arc::clone(&entry.dataset))
    }

    /// Drop the entry for `path`. Returns whether one was cached.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.entries.write().remove(&canonical).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.read()
    }
}

/// Process-wide cache, created on first access
pub fn global() -> &'static DatasetCache {
    static GLOBAL: OnceLock<DatasetCache> = OnceLock::new();
    GLOBAL.get_or_init(DatasetCache::default)
}

/// Load `path` through the process-wide cache
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Arc<NormalizedDataset>> {
    global().get_or_load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "price,model_year,model,cylinders,odometer,paint_color,is_4wd,days_listed";

    fn write_source(path: &Path, rows: &[&str]) {
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
    }

    #[test]
    fn test_second_lookup_hits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        write_source(&path, &["9400,2011.0,bmw x5,6.0,145000.0,,1.0,19"]);

        let cache = DatasetCache::default();
        let first = cache.get_or_load(&path).unwrap();
        let second = cache.get_or_load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, reloads: 0 });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_file_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        write_source(&path, &["9400,2011.0,bmw x5,6.0,145000.0,,1.0,19"]);

        let cache = DatasetCache::default();
        let first = cache.get_or_load(&path).unwrap();
        assert_eq!(first.n_rows(), 1);

        write_source(
            &path,
            &[
                "9400,2011.0,bmw x5,6.0,145000.0,,1.0,19",
                "25500,,bmw x5,,88705.0,white,,50",
            ],
        );
        let second = cache.get_or_load(&path).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.n_rows(), 2);
        assert_eq!(cache.stats().reloads, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_same_length_rewrite_reloads_on_newer_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        write_source(&path, &["9400,2011.0,bmw x5,6.0,145000.0,,1.0,19"]);

        let cache = DatasetCache::default();
        let first = cache.get_or_load(&path).unwrap();

        write_source(&path, &["9400,2013.0,bmw x5,6.0,145000.0,,1.0,19"]);
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + std::time::Duration::from_secs(60)).unwrap();

        let second = cache.get_or_load(&path).unwrap();
        let years = second.frame().column("model_year").unwrap().i64().unwrap();
        assert_eq!(years.get(0), Some(2013));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().reloads, 1);
    }

    #[test]
    fn test_invalidate_forces_reload_of_unchanged_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        write_source(&path, &["9400,2011.0,bmw x5,6.0,145000.0,,1.0,19"]);

        let cache = DatasetCache::default();
        let first = cache.get_or_load(&path).unwrap();
        cache.invalidate(&path);
        let second = cache.get_or_load(&path).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_missing_source_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::default();

        let err = cache.get_or_load(dir.path().join("vehicles_us.csv")).unwrap_err();

        assert!(err.is_source_unavailable());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        write_source(&path, &["9400,2011.0,bmw x5,6.0,145000.0,,1.0,19"]);

        let cache = DatasetCache::default();
        cache.get_or_load(&path).unwrap();
        assert!(cache.invalidate(&path));
        assert!(!cache.invalidate(&path));

        cache.get_or_load(&path).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 2);
    }
}
