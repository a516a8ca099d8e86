//! Vehicles Prep - missing value imputation for vehicle listing datasets
//!
//! Loads a CSV of vehicle listings and fills the gaps in its key columns with
//! deterministic groupwise statistics:
//!
//! - `model_year`: median per `model`
//! - `cylinders`: mode per `model`, median when no mode exists
//! - `odometer`: mean per (imputed) `model_year`
//! - `paint_color`, `is_4wd`: sentinel placeholders
//!
//! then settles `model_year`/`cylinders` as nullable integers and `is_4wd`
//! as a boolean.
//!
//! # Modules
//!
//! - [`preprocessing`] - Normalization passes, grouped imputer, reports, column classification
//! - [`dataset`] - Loading a source into a [`NormalizedDataset`]
//! - [`cache`] - Process-wide memoization keyed by source identity
//! - [`utils`] - CSV reading and writing
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

pub mod preprocessing;
pub mod dataset;
pub mod cache;
pub mod utils;

// Services
pub mod cli;

pub use error::{ListingsError, Result};
pub use dataset::{load_normalized, NormalizedDataset, DEFAULT_SOURCE};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ListingsError, Result};
    pub use crate::preprocessing::{
        classify_columns, ClassifierRules, ColumnLists, GroupImputer, GroupStatistic,
        ListingNormalizer, NormalizationReport, NormalizerConfig,
    };
    pub use crate::dataset::{load_normalized, NormalizedDataset};
    pub use crate::cache::{load_dataset, DatasetCache};
    pub use crate::utils::{DataLoader, DataSaver};
}
