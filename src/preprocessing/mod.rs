//! Listing preprocessing module
//!
//! Provides the normalization passes for vehicle listing tables:
//! - Groupwise missing value imputation (median, mode, mean)
//! - Sentinel placeholders for categorical gaps
//! - Final type coercion (nullable integers, booleans)
//! - Column classification for selection lists

mod config;
mod imputer;
mod pipeline;
pub mod columns;
pub mod report;

pub use config::{NormalizerConfig, DEFAULT_UNKNOWN_COLOR};
pub use imputer::{
    fill_by_group, group_keys, group_statistics, numeric_values, GroupImputer, GroupKey,
    GroupStatistic,
};
pub use pipeline::{
    ListingNormalizer, CYLINDERS, IS_4WD, MISSING_4WD_VALUE, MODEL, MODEL_YEAR, ODOMETER,
    PAINT_COLOR, REQUIRED_COLUMNS, TARGET_COLUMNS,
};
pub use columns::{classify_columns, column_type, ClassifierRules, ColumnLists};
pub use report::{missing_summary, ImputeOutcome, MissingCount, NormalizationReport};

use serde::{Deserialize, Serialize};

/// Column data type for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
    Boolean,
    Unknown,
}
