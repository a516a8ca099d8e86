//! Groupwise missing value imputation
//!
//! A [`GroupImputer`] partitions rows by a key column, computes one statistic
//! per partition from the non-missing target values (`fit`), then fills the
//! missing target cells of each partition with it (`transform`). Rows whose key
//! is missing belong to no partition and are left as they are.

use super::report::ImputeOutcome;
use crate::error::{ListingsError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Statistic used to fill a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupStatistic {
    /// Median of the non-missing values (mean of the two middle values for
    /// an even count)
    Median,
    /// Arithmetic mean of the non-missing values
    Mean,
    /// Most frequent value, ties broken by first occurrence in row order.
    /// Falls back to the median when the mode is undefined.
    ModeOrMedian,
}

impl GroupStatistic {
    /// Compute the statistic over `values`, which must be in row order.
    /// Returns `None` when there is nothing to compute it from.
    pub fn compute(&self, values: &[f64]) -> Option<f64> {
        match self {
            GroupStatistic::Median => median(values),
            GroupStatistic::Mean => mean(values),
            GroupStatistic::ModeOrMedian => mode_first(values).or_else(|| median(values)),
        }
    }
}

impl fmt::Display for GroupStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupStatistic::Median => "median",
            GroupStatistic::Mean => "mean",
            GroupStatistic::ModeOrMedian => "mode",
        };
        f.write_str(name)
    }
}

/// Value of a grouping key for one partition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Str(String),
    Int(i64),
    /// Bit pattern of a finite `f64`, with `-0.0` folded into `0.0`
    Float(u64),
    Bool(bool),
}

impl GroupKey {
    /// Key for a float value. NaN has no partition.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        let value = if value == 0.0 { 0.0 } else { value };
        Some(GroupKey::Float(value.to_bits()))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Str(s) => f.write_str(s),
            GroupKey::Int(v) => write!(f, "{v}"),
            GroupKey::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            GroupKey::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Imputer that fills one column from statistics over partitions of another
#[derive(Debug, Clone)]
pub struct GroupImputer {
    group_by: String,
    target: String,
    statistic: GroupStatistic,
    global_fallback: bool,
    fill_values: HashMap<GroupKey, f64>,
    /// Partitions without a defined statistic, in order of first appearance
    unresolved: Vec<GroupKey>,
    fallback_value: Option<f64>,
    is_fitted: bool,
}

impl GroupImputer {
    /// Create an imputer filling `target` using `statistic` over partitions of `group_by`
    pub fn new(group_by: impl Into<String>, target: impl Into<String>, statistic: GroupStatistic) -> Self {
        Self {
            group_by: group_by.into(),
            target: target.into(),
            statistic,
            global_fallback: false,
            fill_values: HashMap::new(),
            unresolved: Vec::new(),
            fallback_value: None,
            is_fitted: false,
        }
    }

    /// Fill cells of unresolved partitions with the column-wide statistic
    pub fn with_global_fallback(mut self, enabled: bool) -> Self {
        self.global_fallback = enabled;
        self
    }

    /// Compute the partition -> statistic mapping
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let keys = group_keys(df, &self.group_by)?;
        let values = numeric_values(df, &self.target)?;

        let mut partitions: HashMap<GroupKey, Vec<f64>> = HashMap::new();
        let mut order: Vec<GroupKey> = Vec::new();

        for (key, value) in keys.into_iter().zip(values.iter()) {
            let Some(key) = key else { continue };
            let bucket = partitions.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            if let Some(v) = value {
                bucket.push(*v);
            }
        }

        self.fill_values.clear();
        self.unresolved.clear();

        for key in order {
            let bucket = partitions.get(&key).map(Vec::as_slice).unwrap_or(&[]);
            match self.statistic.compute(bucket) {
                Some(stat) => {
                    self.fill_values.insert(key, stat);
                }
                None => self.unresolved.push(key),
            }
        }

        self.fallback_value = if self.global_fallback {
            let all: Vec<f64> = values.iter().flatten().copied().collect();
            self.statistic.compute(&all)
        } else {
            None
        };

        tracing::debug!(
            target_column = %self.target,
            group_by = %self.group_by,
            statistic = %self.statistic,
            partitions = self.fill_values.len() + self.unresolved.len(),
            unresolved = self.unresolved.len(),
            "Computed partition statistics"
        );

        self.is_fitted = true;
        Ok(self)
    }

    /// Fill missing target cells from the fitted mapping.
    ///
    /// The target column is replaced in place by a `Float64` column; every
    /// other column is untouched.
    pub fn transform(&self, df: &DataFrame) -> Result<(DataFrame, ImputeOutcome)> {
        if !self.is_fitted {
            return Err(ListingsError::DataError(format!(
                "imputer for '{}' used before fit",
                self.target
            )));
        }

        let keys = group_keys(df, &self.group_by)?;
        let values = numeric_values(df, &self.target)?;

        let mut outcome = ImputeOutcome::new(&self.target, &self.group_by, self.statistic);
        outcome.unresolved_groups = self.unresolved.iter().map(ToString::to_string).collect();

        let filled: Float64Chunked = keys
            .iter()
            .zip(values)
            .map(|(key, value)| {
                if value.is_some() {
                    return value;
                }
                let from_partition = key.as_ref().and_then(|k| self.fill_values.get(k)).copied();
                match (from_partition, self.fallback_value) {
                    (Some(v), _) => {
                        outcome.filled += 1;
                        Some(v)
                    }
                    (None, Some(v)) => {
                        outcome.fallback_filled += 1;
                        Some(v)
                    }
                    (None, None) => {
                        outcome.still_missing += 1;
                        None
                    }
                }
            })
            .collect();

        let mut result = df.clone();
        result
            .with_column(filled.with_name(self.target.as_str().into()).into_series())
            .map_err(|e| ListingsError::DataError(e.to_string()))?;

        Ok((result, outcome))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<(DataFrame, ImputeOutcome)> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Fitted statistic for a partition
    pub fn fill_value(&self, key: &GroupKey) -> Option<f64> {
        self.fill_values.get(key).copied()
    }

    /// Partitions whose statistic is undefined
    pub fn unresolved(&self) -> &[GroupKey] {
        &self.unresolved
    }
}

/// Partition -> statistic map of `target` over partitions of `key`.
///
/// Partitions whose statistic is undefined are absent from the map.
pub fn group_statistics(
    df: &DataFrame,
    key: &str,
    target: &str,
    stat: GroupStatistic,
) -> Result<HashMap<GroupKey, f64>> {
    let mut imputer = GroupImputer::new(key, target, stat);
    imputer.fit(df)?;
    Ok(imputer.fill_values)
}

/// Fill missing `target` cells with their `key` partition's statistic.
///
/// Returns the filled `Float64` column and what was changed.
pub fn fill_by_group(
    df: &DataFrame,
    key: &str,
    target: &str,
    stat: GroupStatistic,
) -> Result<(Series, ImputeOutcome)> {
    let (result, outcome) = GroupImputer::new(key, target, stat).fit_transform(df)?;
    let filled = result
        .column(target)
        .map_err(|_| ListingsError::MissingColumn(target.to_string()))?
        .as_materialized_series()
        .clone();
    Ok((filled, outcome))
}

/// Read the grouping key of every row. Missing keys (and NaN) are `None`.
pub fn group_keys(df: &DataFrame, column: &str) -> Result<Vec<Option<GroupKey>>> {
    let series = df
        .column(column)
        .map_err(|_| ListingsError::MissingColumn(column.to_string()))?
        .as_materialized_series();

    let keys: Vec<Option<GroupKey>> = match series.dtype() {
        DataType::String => series
            .str()?
            .into_iter()
            .map(|v| v.map(|s| GroupKey::Str(s.to_string())))
            .collect(),
        DataType::Boolean => series.bool()?.into_iter().map(|v| v.map(GroupKey::Bool)).collect(),
        dtype if dtype.is_float() => {
            let casted = series.cast(&DataType::Float64)?;
            let keys: Vec<_> = casted.f64()?.into_iter().map(|v| v.and_then(GroupKey::from_f64)).collect();
            keys
        }
        dtype if dtype.is_integer() => {
            let casted = series.cast(&DataType::Int64)?;
            let keys: Vec<_> = casted.i64()?.into_iter().map(|v| v.map(GroupKey::Int)).collect();
            keys
        }
        _ => {
            let casted = series.cast(&DataType::String)?;
            let keys: Vec<_> = casted
                .str()?
                .into_iter()
                .map(|v| v.map(|s| GroupKey::Str(s.to_string())))
                .collect();
            keys
        }
    };

    Ok(keys)
}

/// Read a numeric column as `f64`. Nulls and NaN are `None`.
///
/// Numeric text is parsed; any value that cannot be read as a number fails
/// with [`ListingsError::DataError`].
pub fn numeric_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(column)
        .map_err(|_| ListingsError::MissingColumn(column.to_string()))?
        .as_materialized_series();

    // Strict: text that does not parse as a number is an error, not a gap
    let casted = series.strict_cast(&DataType::Float64).map_err(|e| {
        ListingsError::DataError(format!("column '{column}' is not numeric: {e}"))
    })?;

    let values: Vec<Option<f64>> = casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();

    Ok(values)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Most frequent value; on equal counts the one seen first wins
fn mode_first(values: &[f64]) -> Option<f64> {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    let mut first_seen: Vec<f64> = Vec::new();

    for &v in values {
        let count = counts.entry(v.to_bits()).or_insert(0);
        if *count == 0 {
            first_seen.push(v);
        }
        *count += 1;
    }

    let mut best: Option<(f64, usize)> = None;
    for v in first_seen {
        let count = counts[&v.to_bits()];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((v, count));
        }
    }
    best.map(|(v, _)| v)
}
