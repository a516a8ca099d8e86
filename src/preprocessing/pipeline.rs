//! Listing normalization pipeline
//!
//! Runs the fixed sequence of passes over a raw listings table:
//!
//! 1. `model_year` <- median per `model`
//! 2. `cylinders` <- mode per `model` (median when the mode is undefined)
//! 3. `odometer` <- mean per `model_year`, keyed on the output of step 1
//! 4. `paint_color` / `is_4wd` <- sentinel placeholders
//! 5. `model_year` / `cylinders` -> nullable `Int64`, `is_4wd` -> `Boolean`
//!
//! Each pass completes before the next one starts.

use super::{
    config::NormalizerConfig,
    imputer::{numeric_values, GroupImputer, GroupStatistic},
    report::{missing_summary, ImputeOutcome, NormalizationReport},
};
use crate::error::{ListingsError, Result};
use polars::prelude::*;
use std::time::Instant;

pub const MODEL: &str = "model";
pub const MODEL_YEAR: &str = "model_year";
pub const CYLINDERS: &str = "cylinders";
pub const ODOMETER: &str = "odometer";
pub const PAINT_COLOR: &str = "paint_color";
pub const IS_4WD: &str = "is_4wd";

/// Value written into missing numeric `is_4wd` cells; coerces to `false`
pub const MISSING_4WD_VALUE: f64 = 0.0;

/// Columns the normalizer fills
pub const TARGET_COLUMNS: [&str; 5] = [MODEL_YEAR, CYLINDERS, ODOMETER, PAINT_COLOR, IS_4WD];

/// Columns that must be present in a raw table
pub const REQUIRED_COLUMNS: [&str; 6] = [MODEL, MODEL_YEAR, CYLINDERS, ODOMETER, PAINT_COLOR, IS_4WD];

/// Normalizer for vehicle listing tables
#[derive(Debug, Clone, Default)]
pub struct ListingNormalizer {
    config: NormalizerConfig,
}

impl ListingNormalizer {
    /// Create a normalizer with default configuration
    pub fn new() -> Self {
        Self::with_config(NormalizerConfig::default())
    }

    /// Create a normalizer with custom configuration
    pub fn with_config(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Run every pass and return the normalized table
    pub fn normalize(&self, df: &DataFrame) -> Result<DataFrame> {
        self.normalize_with_report(df).map(|(df, _)| df)
    }

    /// Run every pass, also returning what each pass changed
    pub fn normalize_with_report(&self, df: &DataFrame) -> Result<(DataFrame, NormalizationReport)> {
        let start = Instant::now();
        self.config.validate()?;
        Self::check_schema(df)?;

        let mut report = NormalizationReport {
            n_rows: df.height(),
            n_cols: df.width(),
            missing_before: missing_summary(df, &TARGET_COLUMNS),
            ..Default::default()
        };

        let (result, step) = self.impute_model_year(df)?;
        report.steps.push(step);

        let (result, step) = self.impute_cylinders(&result)?;
        report.steps.push(step);

        let (result, step) = self.impute_odometer(&result)?;
        report.steps.push(step);

        let (result, colors_filled, drive_filled) = self.fill_placeholders(&result)?;
        report.colors_filled = colors_filled;
        report.drive_filled = drive_filled;

        let result = self.coerce_types(&result)?;

        report.missing_after = missing_summary(&result, &TARGET_COLUMNS);
        report.elapsed_secs = start.elapsed().as_secs_f64();

        tracing::info!(
            rows = report.n_rows,
            columns = report.n_cols,
            still_missing = report.total_missing_after(),
            elapsed_ms = (report.elapsed_secs * 1000.0) as u64,
            "Normalized listings"
        );

        Ok((result, report))
    }

    /// Step 1: fill `model_year` with the median of its `model` partition
    pub fn impute_model_year(&self, df: &DataFrame) -> Result<(DataFrame, ImputeOutcome)> {
        self.run_imputer(df, GroupImputer::new(MODEL, MODEL_YEAR, GroupStatistic::Median))
    }

    /// Step 2: fill `cylinders` with the mode of its `model` partition
    pub fn impute_cylinders(&self, df: &DataFrame) -> Result<(DataFrame, ImputeOutcome)> {
        self.run_imputer(df, GroupImputer::new(MODEL, CYLINDERS, GroupStatistic::ModeOrMedian))
    }

    /// Step 3: fill `odometer` with the mean of its `model_year` partition.
    ///
    /// Partitions come from whatever `model_year` holds in `df`, so this must
    /// run on the output of [`Self::impute_model_year`].
    pub fn impute_odometer(&self, df: &DataFrame) -> Result<(DataFrame, ImputeOutcome)> {
        self.run_imputer(df, GroupImputer::new(MODEL_YEAR, ODOMETER, GroupStatistic::Mean))
    }

    fn run_imputer(&self, df: &DataFrame, imputer: GroupImputer) -> Result<(DataFrame, ImputeOutcome)> {
        let mut imputer = imputer.with_global_fallback(self.config.global_fallback);
        let (result, outcome) = imputer.fit_transform(df)?;

        tracing::debug!(
            column = %outcome.column,
            group_by = %outcome.group_by,
            statistic = %outcome.statistic,
            filled = outcome.filled,
            fallback_filled = outcome.fallback_filled,
            still_missing = outcome.still_missing,
            "Imputation step finished"
        );

        if self.config.warn_unresolved {
            for group in &outcome.unresolved_groups {
                tracing::warn!(
                    column = %outcome.column,
                    group_by = %outcome.group_by,
                    group = %group,
                    fallback = self.config.global_fallback,
                    "Partition has no values to compute a {} from",
                    outcome.statistic
                );
            }
        }

        Ok((result, outcome))
    }

    /// Step 4: write sentinels into missing `paint_color` and `is_4wd` cells.
    ///
    /// Returns the table and the number of cells filled in each column.
    pub fn fill_placeholders(&self, df: &DataFrame) -> Result<(DataFrame, usize, usize)> {
        let mut result = df.clone();

        let colors = column_series(df, PAINT_COLOR)?;
        let colors_filled = colors.null_count();
        let colors = colors.cast(&DataType::String)?;
        let sentinel = self.config.unknown_color.as_str();
        let filled: StringChunked = colors
            .str()?
            .into_iter()
            .map(|v| Some(v.unwrap_or(sentinel)))
            .collect();
        result.with_column(filled.with_name(PAINT_COLOR.into()).into_series())?;

        let drive = column_series(df, IS_4WD)?;
        let drive_filled = drive.null_count();
        let drive = match drive.dtype() {
            DataType::Boolean => {
                let ca: BooleanChunked = drive.bool()?.into_iter().map(|v| Some(v.unwrap_or(false))).collect();
                ca.with_name(IS_4WD.into()).into_series()
            }
            DataType::String => {
                let ca: StringChunked = drive
                    .str()?
                    .into_iter()
                    .map(|v| Some(v.unwrap_or("0")))
                    .collect();
                ca.with_name(IS_4WD.into()).into_series()
            }
            _ => {
                let casted = drive.strict_cast(&DataType::Float64)?;
                let ca: Float64Chunked = casted
                    .f64()?
                    .into_iter()
                    .map(|v| Some(v.unwrap_or(MISSING_4WD_VALUE)))
                    .collect();
                ca.with_name(IS_4WD.into()).into_series()
            }
        };
        result.with_column(drive)?;

        Ok((result, colors_filled, drive_filled))
    }

    /// Step 5: settle final column types.
    ///
    /// `model_year` and `cylinders` are rounded half-to-even and become
    /// nullable `Int64`; cells that are still missing stay null. `is_4wd`
    /// becomes `Boolean`.
    pub fn coerce_types(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();

        for name in [MODEL_YEAR, CYLINDERS] {
            let ca: Int64Chunked = numeric_values(df, name)?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()).map(|x| x.round_ties_even() as i64))
                .collect();
            result.with_column(ca.with_name(name.into()).into_series())?;
        }

        let drive = column_series(df, IS_4WD)?;
        let flags: BooleanChunked = match drive.dtype() {
            DataType::Boolean => drive.bool()?.clone(),
            DataType::String => drive.str()?.into_iter().map(|v| v.map(is_truthy_str)).collect(),
            _ => {
                let casted = drive.strict_cast(&DataType::Float64)?;
                let flags: BooleanChunked = casted.f64()?.into_iter().map(|v| v.map(|x| x != 0.0)).collect();
                flags
            }
        };
        result.with_column(flags.with_name(IS_4WD.into()).into_series())?;

        Ok(result)
    }

    fn check_schema(df: &DataFrame) -> Result<()> {
        for name in REQUIRED_COLUMNS {
            if df.column(name).is_err() {
                return Err(ListingsError::MissingColumn(name.to_string()));
            }
        }
        Ok(())
    }
}

fn column_series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| ListingsError::MissingColumn(name.to_string()))
}

/// Boolean reading of a text flag. Common literals are recognised; any other
/// non-empty text counts as true.
fn is_truthy_str(value: &str) -> bool {
    let v = value.trim();
    if v.is_empty() {
        return false;
    }
    match v.to_ascii_lowercase().as_str() {
        "false" | "f" | "no" | "n" | "0" | "0.0" => false,
        "true" | "t" | "yes" | "y" | "1" | "1.0" => true,
        other => other.parse::<f64>().map(|x| x != 0.0).unwrap_or(true),
    }
}
