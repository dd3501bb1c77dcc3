use clap::{Parser, Subcommand};
use rastbench::config::persistence::ResultsStorage;
use rastbench::config::BenchmarkConfig;
use rastbench::error::user_friendly_message;
use rastbench::models::RunRecord;
use rastbench::runner::{run_read, run_write};
use rastbench::util::units::format_duration;
use rastbench::{RasterBenchError, Result};
use std::path::PathBuf;

/// GeoTIFF compression benchmark
#[derive(Parser)]
#[command(author, version, about = "Raster compression read/write benchmark")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the benchmark root directory
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write every datapoint with every compression option
    Write,
    /// Read the written tree and measure compression rates
    Read,
    /// Run the write benchmark, then the read benchmark
    All,
    /// Write a configuration file with the default settings
    InitConfig {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show previous runs
    History {
        /// Number of runs to show
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Delete the stored history instead of showing it
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", user_friendly_message(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::InitConfig { path, force } => {
            let path = match path.or(cli.config) {
                Some(path) => path,
                None => BenchmarkConfig::config_file_path()?,
            };
            if path.exists() && !force {
                return Err(RasterBenchError::ConfigError(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            BenchmarkConfig::default().save_to(&path)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        Command::History { limit, clear } => {
            let storage = ResultsStorage::new()?;
            if clear {
                storage.clear_runs()?;
                println!("Cleared run history in {}", storage.results_path().display());
                return Ok(());
            }
            let runs = storage.get_recent_runs(limit)?;
            if runs.is_empty() {
                println!("No runs recorded in {}", storage.results_path().display());
            }
            for run in &runs {
                println!("{}", run.summary_line());
            }
            Ok(())
        }
        Command::Write => run_benchmarks(cli.config, cli.root, true, false).await,
        Command::Read => run_benchmarks(cli.config, cli.root, false, true).await,
        Command::All => run_benchmarks(cli.config, cli.root, true, true).await,
    }
}

async fn run_benchmarks(
    config_path: Option<PathBuf>,
    root: Option<PathBuf>,
    write: bool,
    read: bool,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => BenchmarkConfig::load_from(path)?,
        None => BenchmarkConfig::load()?,
    };
    if let Some(root) = root {
        config = config.with_root_dir(root);
        config.validate()?;
    }

    let storage = ResultsStorage::new()?;

    if write {
        let record = run_write(config.clone(), Some(&storage)).await?;
        print_record(&record);
    }
    if read {
        let record = run_read(config, Some(&storage)).await?;
        print_record(&record);
    }
    Ok(())
}

fn print_record(record: &RunRecord) {
    println!(
        "\n{}: {} recorded, {} skipped, {} failed in {}",
        record.pipeline.description(),
        record.recorded,
        record.skipped,
        record.failed,
        format_duration(record.elapsed)
    );
    for row in &record.summary.rows {
        let means: Vec<String> = row.stats.iter().map(|s| format!("{:.3}", s.mean)).collect();
        println!(
            "  {:<22} {:<8} n={:<3} {}",
            row.compression,
            row.data_type.name(),
            row.count,
            means.join(" ")
        );
    }
}
