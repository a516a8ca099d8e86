//! Dataset caching
//!
//! The normalized table is computed once per source and shared read-only for
//! the rest of the process.

mod dataset_cache;

pub use dataset_cache::{global, load_dataset, CacheStats, DatasetCache, SourceKey};
