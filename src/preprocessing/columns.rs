//! Column classification for selection lists
//!
//! Splits a normalized table's columns into numeric-like and
//! categorical-like lists from their declared types. The adjustments applied
//! on top of the types live in [`ClassifierRules`].

use super::ColumnType;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Adjustments applied after type-based classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierRules {
    /// Never listed as numeric
    pub excluded_numeric: Vec<String>,
    /// Moved to the front of the numeric list when present
    pub leading_numeric: Option<String>,
    /// Appended to the categorical list when present, whatever their type
    pub forced_categorical: Vec<String>,
    /// Never listed as categorical
    pub excluded_categorical: Vec<String>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            excluded_numeric: vec!["days_listed".to_string()],
            leading_numeric: Some("price".to_string()),
            forced_categorical: vec!["is_4wd".to_string(), "cylinders".to_string()],
            excluded_categorical: vec!["model_year".to_string()],
        }
    }
}

/// Column names grouped for display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLists {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

/// Classify a polars dtype
pub fn column_type(dtype: &DataType) -> ColumnType {
    match dtype {
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 |
        DataType::Float32 | DataType::Float64 => ColumnType::Numeric,
        DataType::String => ColumnType::Categorical,
        DataType::Boolean => ColumnType::Boolean,
        _ => ColumnType::Unknown,
    }
}

/// Build the numeric-like and categorical-like column lists of `df`
pub fn classify_columns(df: &DataFrame, rules: &ClassifierRules) -> ColumnLists {
    let mut numeric = Vec::new();
    let mut categorical = Vec::new();

    for col in df.get_columns() {
        let name = col.name().to_string();
        match column_type(col.dtype()) {
            ColumnType::Numeric => numeric.push(name),
            ColumnType::Categorical => categorical.push(name),
            _ => {}
        }
    }

    numeric.retain(|n| !rules.excluded_numeric.contains(n));
    if let Some(lead) = &rules.leading_numeric {
        if let Some(pos) = numeric.iter().position(|n| n == lead) {
            let lead = numeric.remove(pos);
            numeric.insert(0, lead);
        }
    }

    for forced in &rules.forced_categorical {
        if df.column(forced).is_ok() && !categorical.contains(forced) {
            categorical.push(forced.clone());
        }
    }
    categorical.retain(|n| !rules.excluded_categorical.contains(n));

    ColumnLists { numeric, categorical }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized() -> DataFrame {
        df!(
            "odometer" => &[145000.0, 88705.0],
            "price" => &[9400.0, 25500.0],
            "model_year" => &[2011i64, 2013],
            "model" => &["bmw x5", "ford f-150"],
            "cylinders" => &[6i64, 6],
            "is_4wd" => &[true, false],
            "days_listed" => &[19i64, 50],
        )
        .unwrap()
    }

    #[test]
    fn test_price_first_and_days_listed_excluded() {
        let lists = classify_columns(&normalized(), &ClassifierRules::default());
        assert_eq!(lists.numeric, vec!["price", "odometer", "model_year", "cylinders"]);
    }

    #[test]
    fn test_forced_categorical() {
        let lists = classify_columns(&normalized(), &ClassifierRules::default());
        assert_eq!(lists.categorical, vec!["model", "is_4wd", "cylinders"]);
    }

    #[test]
    fn test_absent_forced_columns_are_skipped() {
        let df = normalized().drop("is_4wd").unwrap();
        let lists = classify_columns(&df, &ClassifierRules::default());
        assert_eq!(lists.categorical, vec!["model", "cylinders"]);
    }

    #[test]
    fn test_boolean_type() {
        assert_eq!(column_type(&DataType::Boolean), ColumnType::Boolean);
        assert_eq!(column_type(&DataType::Int64), ColumnType::Numeric);
        assert_eq!(column_type(&DataType::String), ColumnType::Categorical);
    }
}
