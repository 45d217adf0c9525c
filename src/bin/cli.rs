//! Racecast CLI - Command-line interface for race outcome predictions

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use racecast::config::AppConfig;
use racecast::data::FeatureTable;
use racecast::models::PredictionRecord;
use racecast::pipeline;
use racecast::report;

#[derive(Parser)]
#[command(name = "racecast")]
#[command(author, version, about = "F1 race outcome prediction CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the feature table CSV (overrides DATA_PATH)
    #[arg(long)]
    data_path: Option<PathBuf>,

    /// Directory containing the ONNX classifiers (overrides MODELS_DIR)
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Directory containing dimension CSVs (overrides DIMS_DIR)
    #[arg(long)]
    dims_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export temporal train/val/test feature splits
    Export {
        /// Directory to save the split CSVs
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Predict a single race, a year, or the full table
    Predict {
        /// Filter to a specific year
        #[arg(short, long)]
        year: Option<i32>,

        /// Filter to a specific race ID
        #[arg(short, long)]
        race_id: Option<i64>,

        /// Path to save predictions CSV
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the human-readable summary
        #[arg(long)]
        summary: bool,

        /// Output predictions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Batch predict the test split (or explicit years) and write artifacts
    Batch {
        /// Years to predict (default: configured test years)
        #[arg(long, num_args = 1..)]
        years: Option<Vec<i32>>,

        /// Directory to save prediction files
        #[arg(long, default_value = "predictions")]
        output_dir: PathBuf,

        /// Evaluate predictions against ground truth
        #[arg(long)]
        evaluate: bool,
    },

    /// List available years and races
    List {
        /// Show races for a specific year
        #[arg(short, long)]
        year: Option<i32>,
    },
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    println!("{}", "Racecast CLI".cyan().bold());
    println!();

    match cli.command {
        Commands::Export { ref output_dir } => run_export(&config, output_dir.as_deref()),
        Commands::Predict {
            year,
            race_id,
            ref output,
            summary,
            json,
        } => run_predict(&config, year, race_id, output.as_deref(), summary, json),
        Commands::Batch {
            ref years,
            ref output_dir,
            evaluate,
        } => run_batch(&config, years.as_deref(), output_dir, evaluate),
        Commands::List { year } => run_list(&config, year),
    }
}

fn build_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(path) = &cli.data_path {
        config.data_path = path.clone();
    }
    if let Some(dir) = &cli.models_dir {
        config.models_dir = dir.clone();
    }
    if let Some(dir) = &cli.dims_dir {
        config.dims_dir = dir.clone();
    }
    Ok(config)
}

fn run_export(config: &AppConfig, output_dir: Option<&std::path::Path>) -> Result<()> {
    let splits = pipeline::export_features(config, output_dir)
        .context("Failed to export feature splits")?;

    println!("{}", "Temporal splits:".yellow().bold());
    for (name, split) in [
        ("train", &splits.train),
        ("val", &splits.val),
        ("test", &splits.test),
    ] {
        let years = split.years().unwrap_or_default();
        println!(
            "  {:<6} {:>7} rows  years {:?}",
            name,
            split.height(),
            years
        );
    }

    if output_dir.is_some() {
        println!();
        println!("{}", "✓ Split CSVs written".green());
    }
    Ok(())
}

fn run_predict(
    config: &AppConfig,
    year: Option<i32>,
    race_id: Option<i64>,
    output: Option<&std::path::Path>,
    summary: bool,
    json: bool,
) -> Result<()> {
    let spinner = scoring_spinner();
    let records = pipeline::predict_from_store(config, year, race_id)
        .context("Prediction pipeline failed")?;
    spinner.finish_and_clear();

    if let Some(path) = output {
        report::write_predictions_csv(&records, path)
            .with_context(|| format!("Failed to write predictions to {:?}", path))?;
        println!("{} {:?}", "Predictions saved to".green(), path);
    }

    if summary {
        println!("{}", report::format_summary(&records));
    } else if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_records_table(&records, 20);
    }

    println!();
    println!(
        "{} {} predictions",
        "✓ Generated".green(),
        records.len()
    );
    Ok(())
}

fn run_batch(
    config: &AppConfig,
    years: Option<&[i32]>,
    output_dir: &std::path::Path,
    evaluate: bool,
) -> Result<()> {
    let spinner = scoring_spinner();
    let records = pipeline::batch_predict(config, years, Some(output_dir))
        .context("Batch prediction failed")?;
    spinner.finish_and_clear();

    let race_count = records
        .iter()
        .map(|r| r.race_id)
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    println!(
        "{} {} predictions across {} races",
        "✓ Generated".green(),
        records.len(),
        race_count
    );
    println!("Artifacts written to {:?}", output_dir);

    if evaluate {
        let metrics = pipeline::evaluate_predictions(&records);
        println!();
        println!("{}", "EVALUATION RESULTS".yellow().bold());
        println!("{}", "=".repeat(60));

        match metrics.top10_accuracy {
            Some(acc) => {
                println!("Top-10 overall accuracy: {:.2}%", acc * 100.0);
                for (year, acc) in &metrics.top10_accuracy_by_year {
                    println!("  {}: {:.2}%", year, acc * 100.0);
                }
            }
            None => println!("{}", "No top-10 ground truth available".dimmed()),
        }

        println!();
        match metrics.dnf_accuracy {
            Some(acc) => {
                println!("DNF overall accuracy: {:.2}%", acc * 100.0);
                for (year, acc) in &metrics.dnf_accuracy_by_year {
                    println!("  {}: {:.2}%", year, acc * 100.0);
                }
            }
            None => println!("{}", "No DNF ground truth available".dimmed()),
        }
    }

    Ok(())
}

fn run_list(config: &AppConfig, year: Option<i32>) -> Result<()> {
    let table = FeatureTable::load_csv(&config.data_path)
        .context("Failed to load the feature table")?;

    match year {
        None => {
            println!("{}", "Available years:".yellow().bold());
            for year in table.years()? {
                let count = table.filter_year(year)?.height();
                println!("  {}  ({} rows)", year, count);
            }
        }
        Some(year) => {
            let filtered = table.filter_year(year)?;
            if filtered.is_empty() {
                println!("{}", format!("No races found for {}.", year).red());
                return Ok(());
            }

            // (round, race_id) -> driver count
            let mut races: BTreeMap<(i32, i64), usize> = BTreeMap::new();
            for row in filtered.meta_rows()? {
                *races.entry((row.round, row.race_id)).or_default() += 1;
            }

            println!("{}", format!("Races in {}:", year).yellow().bold());
            println!("{:>6} {:>9} {:>8}", "Round", "Race ID", "Drivers");
            for ((round, race_id), drivers) in races {
                println!("{:>6} {:>9} {:>8}", round, race_id, drivers);
            }
        }
    }
    Ok(())
}

fn print_records_table(records: &[PredictionRecord], limit: usize) {
    println!("{}", "Predictions:".yellow().bold());
    println!(
        "{:>6} {:<24} {:>6} {:>12} {:>10} {:>16}",
        "Year", "Driver", "Grid", "Top-10 Prob", "DNF Prob", "Prediction"
    );
    println!("{}", "-".repeat(80));

    for record in records.iter().take(limit) {
        let grid = record
            .grid_position
            .map(|g| format!("{:.0}", g))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6} {:<24} {:>6} {:>11.1}% {:>9.1}% {:>16}",
            record.year,
            truncate(&record.driver_name, 24),
            grid,
            record.top10_probability.unwrap_or(0.0) * 100.0,
            record.dnf_probability.unwrap_or(0.0) * 100.0,
            record.final_prediction.label()
        );
    }

    if records.len() > limit {
        println!("... and {} more rows", records.len() - limit);
    }
}

fn scoring_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap()
            .tick_strings(&["-", "\\", "|", "/"]),
    );
    spinner.set_message("Scoring...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
