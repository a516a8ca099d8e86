//! Normalization reporting
//!
//! Records what each imputation step changed and which partitions had no
//! informative values, so gaps left in the data can be diagnosed.

use super::imputer::GroupStatistic;
use serde::{Deserialize, Serialize};
use polars::prelude::DataFrame;

/// Outcome of one groupwise imputation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputeOutcome {
    /// Column that was filled
    pub column: String,
    /// Column that defined the partitions
    pub group_by: String,
    pub statistic: GroupStatistic,
    /// Cells filled from their partition's statistic
    pub filled: usize,
    /// Cells filled from the column-wide statistic
    pub fallback_filled: usize,
    /// Cells left missing
    pub still_missing: usize,
    /// Partitions with no informative values, in order of first appearance
    pub unresolved_groups: Vec<String>,
}

impl ImputeOutcome {
    pub fn new(column: &str, group_by: &str, statistic: GroupStatistic) -> Self {
        Self {
            column: column.to_string(),
            group_by: group_by.to_string(),
            statistic,
            filled: 0,
            fallback_filled: 0,
            still_missing: 0,
            unresolved_groups: Vec::new(),
        }
    }

    /// Whether every missing cell received a value
    pub fn is_complete(&self) -> bool {
        self.still_missing == 0
    }
}

/// Null count of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

/// Per-column null counts, in the order given. Absent columns are skipped.
pub fn missing_summary(df: &DataFrame, columns: &[&str]) -> Vec<MissingCount> {
    columns
        .iter()
        .filter_map(|name| {
            df.column(name).ok().map(|col| MissingCount {
                column: name.to_string(),
                missing: col.null_count(),
            })
        })
        .collect()
}

/// Everything the normalizer did to a table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub n_rows: usize,
    pub n_cols: usize,
    /// Nulls per target column before normalization
    pub missing_before: Vec<MissingCount>,
    /// Nulls per target column after normalization
    pub missing_after: Vec<MissingCount>,
    /// One entry per groupwise imputation step, in execution order
    pub steps: Vec<ImputeOutcome>,
    /// Cells set to the unknown-color sentinel
    pub colors_filled: usize,
    /// Cells set to the not-4WD sentinel
    pub drive_filled: usize,
    pub elapsed_secs: f64,
}

impl NormalizationReport {
    /// Total cells still missing across target columns
    pub fn total_missing_after(&self) -> usize {
        self.missing_after.iter().map(|m| m.missing).sum()
    }

    /// All unresolved partitions, as `(column, group)` pairs
    pub fn unresolved(&self) -> Vec<(&str, &str)> {
        self.steps
            .iter()
            .flat_map(|step| {
                step.unresolved_groups
                    .iter()
                    .map(move |g| (step.column.as_str(), g.as_str()))
            })
            .collect()
    }
}
