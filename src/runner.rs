//! Async pipeline runner
//!
//! Hosts a blocking benchmark pipeline on a `spawn_blocking` thread, streams
//! its progress to an `indicatif` bar, then writes the CSV report and appends
//! the run to the history file.

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::bench::{ProgressReporter, ProgressUpdate, ReadBenchmark, WriteBenchmark};
use crate::config::persistence::ResultsStorage;
use crate::config::BenchmarkConfig;
use crate::models::result::{BenchRun, Pipeline, RunRecord};
use crate::report::{summarize, Metrics};
use crate::{RasterBenchError, Result};

/// Run the write benchmark and produce its report
pub async fn run_write(
    config: BenchmarkConfig,
    history: Option<&ResultsStorage>,
) -> Result<RunRecord> {
    let benchmark = WriteBenchmark::new(config.clone())?;
    let source = config.source.build();

    let run = run_with_progress(Pipeline::Write, move |progress| {
        benchmark.run(source.as_ref(), progress)
    })
    .await?;

    finish(Pipeline::Write, &config, run, config.write_report_path(), history)
}

/// Run the read benchmark and produce its report
pub async fn run_read(
    config: BenchmarkConfig,
    history: Option<&ResultsStorage>,
) -> Result<RunRecord> {
    let benchmark = ReadBenchmark::new(config.clone())?;

    let run = run_with_progress(Pipeline::Read, move |progress| benchmark.run(progress)).await?;

    finish(Pipeline::Read, &config, run, config.read_report_path(), history)
}

/// Drive a blocking pipeline while a task renders its progress
async fn run_with_progress<T, F>(pipeline: Pipeline, job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut ProgressReporter) -> Result<T> + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressUpdate>();

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{prefix} {spinner} [{bar:40}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_prefix(pipeline.description());

    let handle = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            pb.set_length(update.total as u64);
            pb.set_position(update.completed as u64);
            pb.set_message(update.message);
        }
        pb.finish_and_clear();
    });

    let result = tokio::task::spawn_blocking(move || {
        let mut progress = ProgressReporter::new(tx);
        job(&mut progress)
    })
    .await
    .map_err(|e| RasterBenchError::BenchmarkError(format!("Benchmark task failed: {}", e)))?;

    handle.await.ok();
    result
}

fn finish<M: Metrics>(
    pipeline: Pipeline,
    config: &BenchmarkConfig,
    run: BenchRun<M>,
    report_path: PathBuf,
    history: Option<&ResultsStorage>,
) -> Result<RunRecord> {
    let summary = summarize(&run.attempts);
    summary.write_csv(&report_path)?;
    println!(
        "{} report ({} groups) written to {}",
        pipeline.description(),
        summary.rows.len(),
        report_path.display()
    );

    let record = RunRecord::new(pipeline, config.root_dir.clone(), &run, summary);
    if let Some(storage) = history {
        storage.append_run(record.clone())?;
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::models::compression::{CompressionOption, Codec};
    use crate::models::data_type::DataType;
    use tempfile::TempDir;

    fn config(temp_dir: &TempDir) -> BenchmarkConfig {
        BenchmarkConfig::default()
            .with_root_dir(temp_dir.path().join("bench"))
            .with_source(SourceConfig::Synthetic {
                count: 2,
                width: 32,
                height: 32,
                bands: 2,
                seed: 3,
            })
            .with_data_types(vec![DataType::Byte, DataType::Int16])
            .with_options(vec![
                CompressionOption::baseline(),
                CompressionOption::new("lzw", Codec::Lzw),
                CompressionOption::new("deflate", Codec::Deflate),
            ])
    }

    #[tokio::test]
    async fn test_write_then_read_produces_reports_and_history() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(&temp_dir);
        let history = ResultsStorage::with_path(temp_dir.path().join("results.json"));

        let write = run_write(config.clone(), Some(&history)).await.unwrap();
        assert_eq!(write.failed, 0);
        assert_eq!(write.recorded + write.skipped, 12);
        assert!(config.write_report_path().exists());

        let read = run_read(config.clone(), Some(&history)).await.unwrap();
        assert_eq!(read.failed, 0);
        assert!(read.recorded > 0);
        let report = std::fs::read_to_string(config.read_report_path()).unwrap();
        assert!(report.starts_with("Compression Method,Data Type,Avg. Uncompressed Read Time (s)"));

        let runs = history.load_runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].pipeline, Pipeline::Write);
        assert_eq!(runs[1].pipeline, Pipeline::Read);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(&temp_dir).with_source(SourceConfig::Catalog {
            path: temp_dir.path().join("missing.csv"),
        });

        let result = run_write(config, None).await;
        assert!(matches!(result, Err(RasterBenchError::CatalogError(_))));
    }
}
