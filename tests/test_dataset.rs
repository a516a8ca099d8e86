//! Integration test: loading listings from CSV through the cache

use std::io::Write;
use std::sync::Arc;
use vehicles_prep::cache::DatasetCache;
use vehicles_prep::preprocessing::{ClassifierRules, NormalizerConfig};
use vehicles_prep::utils::{DataLoader, DataSaver};
use vehicles_prep::{load_normalized, ListingsError};

const CSV: &str = "\
price,model_year,model,condition,cylinders,fuel,odometer,transmission,type,paint_color,is_4wd,date_posted,days_listed
9400,2011.0,bmw x5,good,6.0,gas,145000.0,automatic,SUV,,1.0,2018-06-23,19
25500,,ford f-150,good,6.0,gas,88705.0,automatic,pickup,white,1.0,2018-10-19,50
5500,2013.0,hyundai sonata,like new,4.0,gas,110000.0,automatic,sedan,red,,2019-02-07,79
1500,2003.0,ford f-150,fair,8.0,gas,,automatic,pickup,,,2019-03-22,9
14900,2017.0,chrysler 200,excellent,4.0,gas,80903.0,automatic,sedan,black,,2019-04-02,28
14990,2014.0,chrysler 300,excellent,6.0,gas,57954.0,automatic,sedan,black,1.0,2018-06-20,15
12990,,hyundai sonata,excellent,4.0,gas,79212.0,automatic,sedan,white,,2018-12-27,73
";

fn write_csv(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(CSV.as_bytes()).unwrap();
    path
}

#[test]
fn test_csv_to_normalized_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "vehicles_us.csv");

    let dataset = load_normalized(&path, &NormalizerConfig::default()).unwrap();
    let df = dataset.frame();

    assert_eq!(dataset.n_rows(), 7);
    assert_eq!(dataset.n_cols(), 13);
    assert_eq!(dataset.report().total_missing_after(), 0);

    let years = df.column("model_year").unwrap().i64().unwrap();
    assert_eq!(years.get(1), Some(2003));
    assert_eq!(years.get(6), Some(2013));

    let odometer = df.column("odometer").unwrap().f64().unwrap();
    assert_eq!(odometer.get(3), Some(88705.0));

    let flags = df.column("is_4wd").unwrap().bool().unwrap();
    assert_eq!(flags.get(0), Some(true));
    assert_eq!(flags.get(2), Some(false));
}

#[test]
fn test_selection_lists() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "vehicles_us.csv");

    let dataset = load_normalized(&path, &NormalizerConfig::default()).unwrap();
    let lists = dataset.column_lists(&ClassifierRules::default());

    assert_eq!(lists.numeric.first().map(String::as_str), Some("price"));
    assert!(lists.numeric.iter().any(|c| c == "odometer"));
    assert!(!lists.numeric.iter().any(|c| c == "days_listed"));
    assert!(lists.categorical.iter().any(|c| c == "is_4wd"));
    assert!(lists.categorical.iter().any(|c| c == "cylinders"));
    assert!(!lists.categorical.iter().any(|c| c == "model_year"));
}

#[test]
fn test_cache_shares_one_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "vehicles_us.csv");

    let cache = DatasetCache::default();
    let a = cache.get_or_load(&path).unwrap();
    let b = cache.get_or_load(dir.path().join(".").join("vehicles_us.csv")).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn test_missing_source_reports_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("vehicles_us.csv");

    let err = load_normalized(&missing, &NormalizerConfig::default()).unwrap_err();
    assert!(matches!(err, ListingsError::SourceUnavailable { .. }));

    let err = DatasetCache::default().get_or_load(&missing).unwrap_err();
    assert!(err.is_source_unavailable());
}

#[test]
fn test_saved_output_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "vehicles_us.csv");
    let out = dir.path().join("normalized.csv");

    let dataset = load_normalized(&path, &NormalizerConfig::default()).unwrap();
    let mut frame = dataset.frame().clone();
    DataSaver::save_csv(&mut frame, &out).unwrap();

    let reloaded = DataLoader::new().load_csv(&out).unwrap();
    assert_eq!(reloaded.shape(), frame.shape());
    assert_eq!(reloaded.column("paint_color").unwrap().null_count(), 0);
    assert_eq!(
        reloaded.column("paint_color").unwrap().str().unwrap().get(0),
        Some("unknown")
    );
}
