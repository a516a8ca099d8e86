//! Vehicles Prep CLI Module
//!
//! Command-line shell over the normalizer: normalize a source to CSV, inspect
//! the normalized table, preview its first rows.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::cache;
use crate::dataset::{load_normalized, NormalizedDataset, DEFAULT_SOURCE};
use crate::preprocessing::{
    ClassifierRules, ListingNormalizer, NormalizationReport, NormalizerConfig, TARGET_COLUMNS,
};
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn warn(s: &str) -> ColoredString   { s.truecolor(230, 180, 80) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "vehicles-prep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fill missing values in vehicle listing datasets")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize a listings CSV and write the result
    Normalize {
        /// Input data file (CSV)
        #[arg(short, long, default_value = DEFAULT_SOURCE)]
        data: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Normalizer configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fill partitions without informative values from the whole column
        #[arg(long)]
        global_fallback: bool,
    },

    /// Show the normalized table's shape, columns and selection lists
    Info {
        /// Input data file (CSV)
        #[arg(short, long, default_value = DEFAULT_SOURCE)]
        data: PathBuf,

        /// Normalizer configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the first rows of the normalized table
    Preview {
        /// Input data file (CSV)
        #[arg(short, long, default_value = DEFAULT_SOURCE)]
        data: PathBuf,

        /// Number of rows to print
        #[arg(short = 'n', long, default_value = "50")]
        rows: usize,
    },
}

/// Resolve the normalizer configuration from an optional file and flags
pub fn resolve_config(path: Option<&Path>, global_fallback: bool) -> anyhow::Result<NormalizerConfig> {
    let config = match path {
        Some(p) => NormalizerConfig::load(p)?,
        None => NormalizerConfig::default(),
    };
    Ok(if global_fallback { config.with_global_fallback(true) } else { config })
}

fn open_dataset(data: &Path, config: Option<&Path>) -> anyhow::Result<Arc<NormalizedDataset>> {
    match config {
        Some(_) => {
            let config = resolve_config(config, false)?;
            Ok(Arc::new(load_normalized(data, &config)?))
        }
        None => Ok(cache::load_dataset(data)?),
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_normalize(
    data_path: &Path,
    output_path: &Path,
    config_path: Option<&Path>,
    global_fallback: bool,
) -> anyhow::Result<()> {
    section("Normalize");

    let config = resolve_config(config_path, global_fallback)?;

    step_run("Loading data");
    let raw = DataLoader::new().load_csv(data_path)?;
    step_done(&format!("{} rows × {} cols", raw.height(), raw.width()));

    step_run("Imputing");
    let start = Instant::now();
    let (mut normalized, report) = ListingNormalizer::with_config(config).normalize_with_report(&raw)?;
    step_done(&format!("{:?}", start.elapsed()));

    step_run(&format!("Saving → {}", output_path.display()));
    DataSaver::save_csv(&mut normalized, output_path)?;
    step_done(&format!("{} rows × {} cols", normalized.height(), normalized.width()));

    print_report(&report);
    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path, config_path: Option<&Path>) -> anyhow::Result<()> {
    section("Data Info");

    let file_info = DataLoader::new().get_file_info(data_path)?;
    let dataset = open_dataset(data_path, config_path)?;
    let df = dataset.frame();

    println!("  {:<12} {}", muted("File"), file_info.path);
    println!("  {:<12} {:.2} MB", muted("Size"), file_info.file_size as f64 / 1024.0 / 1024.0);
    println!("  {:<12} {}", muted("Rows"), dataset.n_rows());
    println!("  {:<12} {}", muted("Columns"), dataset.n_cols());
    println!();

    println!("  {:<20} {:<12} {:>6}", muted("Column"), muted("Type"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(40)));

    for col in df.get_columns() {
        println!(
            "  {:<20} {:<12} {:>6}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
        );
    }

    let lists = dataset.column_lists(&ClassifierRules::default());
    println!();
    println!("  {:<12} {}", muted("Numeric"), lists.numeric.join(", "));
    println!("  {:<12} {}", muted("Categorical"), lists.categorical.join(", "));

    print_report(dataset.report());
    println!();
    Ok(())
}

pub fn cmd_preview(data_path: &Path, rows: usize) -> anyhow::Result<()> {
    section("Preview");

    let dataset = open_dataset(data_path, None)?;
    println!("{}", dataset.frame().head(Some(rows)));
    println!(
        "  {}",
        dim(&format!(
            "{} rows × {} columns loaded",
            dataset.n_rows(),
            dataset.n_cols()
        ))
    );
    Ok(())
}

fn print_report(report: &NormalizationReport) {
    section("Missing values");

    println!("  {:<14} {:>8} {:>8}", muted("Column"), muted("Before"), muted("After"));
    for name in TARGET_COLUMNS {
        let before = report.missing_before.iter().find(|m| m.column == name).map_or(0, |m| m.missing);
        let after = report.missing_after.iter().find(|m| m.column == name).map_or(0, |m| m.missing);
        let after_str = after.to_string();
        let after_fmt = if after == 0 { ok(&after_str) } else { warn(&after_str) };
        println!("  {:<14} {:>8} {:>8}", name, before, after_fmt);
    }

    println!();
    for step in &report.steps {
        println!(
            "  {} {} by {} ({}): {} filled",
            accent("›"),
            step.column,
            step.group_by,
            step.statistic,
            step.filled + step.fallback_filled
        );
    }
    println!("  {} paint_color placeholder: {} filled", accent("›"), report.colors_filled);
    println!("  {} is_4wd placeholder: {} filled", accent("›"), report.drive_filled);

    let unresolved = report.unresolved();
    if !unresolved.is_empty() {
        println!();
        println!("  {}", warn("Partitions without values to impute from:"));
        for (column, group) in unresolved {
            println!("    {} {}", muted(column), group);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_normalize() {
        let cli = Cli::try_parse_from([
            "vehicles-prep",
            "normalize",
            "--output",
            "out.csv",
            "--global-fallback",
        ])
        .unwrap();

        match cli.command {
            Commands::Normalize { data, output, config, global_fallback } => {
                assert_eq!(data, PathBuf::from(DEFAULT_SOURCE));
                assert_eq!(output, PathBuf::from("out.csv"));
                assert!(config.is_none());
                assert!(global_fallback);
            }
            _ => panic!("expected normalize"),
        }
    }

    #[test]
    fn test_cli_preview_rows() {
        let cli = Cli::try_parse_from(["vehicles-prep", "preview", "-n", "10"]).unwrap();
        assert!(matches!(cli.command, Commands::Preview { rows: 10, .. }));
    }

    #[test]
    fn test_info_runs_on_csv() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicles_us.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "price,model_year,model,cylinders,odometer,paint_color,is_4wd,days_listed").unwrap();
        writeln!(file, "9400,2011.0,bmw x5,6.0,145000.0,,1.0,19").unwrap();
        writeln!(file, "25500,,bmw x5,,88705.0,white,,50").unwrap();

        cmd_info(&path, None).unwrap();
    }

    #[test]
    fn test_info_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_info(&dir.path().join("vehicles_us.csv"), None).unwrap_err();
        let err = err.downcast_ref::<crate::ListingsError>().unwrap();
        assert!(err.is_source_unavailable());
    }

    #[test]
    fn test_resolve_config_flag_overrides() {
        let config = resolve_config(None, true).unwrap();
        assert!(config.global_fallback);
        assert_eq!(config.unknown_color, "unknown");
    }
}
