//! Loading and normalizing a listings source

use crate::error::Result;
use crate::preprocessing::{
    classify_columns, ClassifierRules, ColumnLists, ListingNormalizer, NormalizationReport,
    NormalizerConfig,
};
use crate::utils::DataLoader;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

/// Default source read by the command-line shell
pub const DEFAULT_SOURCE: &str = "vehicles_us.csv";

/// A normalized listings table and how it was produced.
///
/// Consumers only ever get shared references to it; it is never mutated after
/// construction.
#[derive(Debug, Clone)]
pub struct NormalizedDataset {
    source: PathBuf,
    frame: DataFrame,
    report: NormalizationReport,
}

impl NormalizedDataset {
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn report(&self) -> &NormalizationReport {
        &self.report
    }

    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }

    pub fn n_cols(&self) -> usize {
        self.frame.width()
    }

    /// Numeric-like and categorical-like column lists for this table
    pub fn column_lists(&self, rules: &ClassifierRules) -> ColumnLists {
        classify_columns(&self.frame, rules)
    }
}

/// Read `path` and run the normalizer over it, without caching
pub fn load_normalized(path: impl AsRef<Path>, config: &NormalizerConfig) -> Result<NormalizedDataset> {
    let path = path.as_ref();
    let raw = DataLoader::new().load_csv(path)?;
    let (frame, report) = ListingNormalizer::with_config(config.clone()).normalize_with_report(&raw)?;

    Ok(NormalizedDataset {
        source: path.to_path_buf(),
        frame,
        report,
    })
}
