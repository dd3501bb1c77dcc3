//! Write benchmark
//!
//! Writes every datapoint once per (data type, compression option) and
//! times each write. Existing files are never overwritten, so an
//! interrupted run can simply be restarted.

use std::fs::{self, File};
use std::path::Path;
use std::time::Instant;

use crate::bench::ProgressReporter;
use crate::config::BenchmarkConfig;
use crate::io::driver::{default_driver, RasterDriver};
use crate::io::layout::BenchLayout;
use crate::models::compression::CompressionOption;
use crate::models::raster::{Datapoint, RasterData};
use crate::models::result::{
    Attempt, BenchRun, MeasurementKey, Outcome, SkipReason, WriteMeasurement,
};
use crate::source::DatasetSource;
use crate::util::units::{format_bytes, format_duration, format_throughput};
use crate::{RasterBenchError, Result};

/// Write benchmark executor
pub struct WriteBenchmark {
    config: BenchmarkConfig,
    layout: BenchLayout,
    driver: Box<dyn RasterDriver>,
}

impl WriteBenchmark {
    /// Create a new write benchmark executor using the default raster driver
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        config.validate()?;
        let layout = config.layout();

        Ok(Self {
            config,
            layout,
            driver: default_driver(),
        })
    }

    /// Write through a different raster driver
    pub fn with_driver(mut self, driver: Box<dyn RasterDriver>) -> Self {
        self.driver = driver;
        self
    }

    /// Execute the write benchmark over the first `sample_size` datapoints
    pub fn run(
        &self,
        source: &dyn DatasetSource,
        progress: &mut ProgressReporter,
    ) -> Result<BenchRun<WriteMeasurement>> {
        let start_time = Instant::now();

        let entries = source.catalog()?;
        let selected = &entries[..entries.len().min(self.config.sample_size)];
        progress.set_total(selected.len() * self.config.data_types.len() * self.config.options.len());

        println!(
            "Starting write benchmark: {} datapoints from {}, {} data types, {} options, driver {}",
            selected.len(),
            source.describe(),
            self.config.data_types.len(),
            self.config.options.len(),
            self.driver.name()
        );

        let mut attempts = Vec::new();
        for entry in selected {
            let datapoint = source.load(entry)?;
            println!("Loaded datapoint {}", datapoint.id);
            self.write_datapoint(&datapoint, progress, &mut attempts)?;
        }

        let run = BenchRun::new(attempts, start_time.elapsed());
        println!(
            "Write benchmark finished in {}: {} recorded, {} skipped, {} failed",
            format_duration(run.elapsed),
            run.recorded_count(),
            run.skipped_count(),
            run.failed_count()
        );
        Ok(run)
    }

    fn write_datapoint(
        &self,
        datapoint: &Datapoint,
        progress: &mut ProgressReporter,
        attempts: &mut Vec<Attempt<WriteMeasurement>>,
    ) -> Result<()> {
        for &dtype in &self.config.data_types {
            // One cast per data type, shared by every option
            let data = datapoint.data.cast(dtype);

            for option in &self.config.options {
                let key = MeasurementKey::new(&option.name, dtype, &datapoint.id);
                let attempt = self.write_one(key, datapoint, &data, option);

                match &attempt.outcome {
                    Outcome::Recorded(m) => println!(
                        "{}: {} in {} ({})",
                        attempt.key,
                        format_bytes(m.file_size),
                        format_duration(m.elapsed),
                        format_throughput(m.write_speed_mbps)
                    ),
                    Outcome::Skipped(reason) => {
                        println!("Skipping {}: {}", attempt.key, reason)
                    }
                    Outcome::Failed(error) => {
                        eprintln!("Write of {} failed: {}", attempt.key, error)
                    }
                }

                progress.advance(1, attempt.key.to_string())?;
                attempts.push(attempt);
            }
        }
        Ok(())
    }

    /// Attempt a single timed write. Never fails the run.
    fn write_one(
        &self,
        key: MeasurementKey,
        datapoint: &Datapoint,
        data: &RasterData,
        option: &CompressionOption,
    ) -> Attempt<WriteMeasurement> {
        let dtype = key.data_type;
        let path = self.layout.file_path(&option.name, dtype, &datapoint.id);

        if path.exists() {
            return Attempt::skipped(key, SkipReason::AlreadyExists { path });
        }

        if !option.supports(dtype) {
            let predictor = option.predictor.map(|p| p.value()).unwrap_or_default();
            return Attempt::skipped(key, SkipReason::IncompatiblePredictor { predictor });
        }

        let profile = datapoint.profile.merged(dtype, option);

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                return Attempt::failed(
                    key,
                    format!("failed to create {}: {}", parent.display(), e),
                );
            }
        }

        let start = Instant::now();
        let result = self
            .driver
            .write(&path, data, &profile)
            .and_then(|()| self.sync(&path));
        let elapsed = start.elapsed();

        if let Err(error) = result {
            remove_partial(&path);
            return match error {
                RasterBenchError::UnsupportedOption(detail) => Attempt::skipped(
                    key,
                    SkipReason::Unsupported {
                        driver: self.driver.name().to_string(),
                        detail,
                    },
                ),
                other => Attempt::failed(key, other),
            };
        }

        let size = match fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(e) => return Attempt::failed(key, format!("failed to stat {}: {}", path.display(), e)),
        };

        if size == 0 || elapsed.is_zero() {
            return Attempt::skipped(key, SkipReason::DegenerateMeasurement { size, elapsed });
        }

        Attempt::recorded(key, WriteMeasurement::new(size, elapsed))
    }

    fn sync(&self, path: &Path) -> Result<()> {
        if self.config.sync_writes {
            File::open(path)?.sync_all()?;
        }
        Ok(())
    }
}

/// Remove a file left behind by a failed write so a re-run retries it
fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            eprintln!("Failed to remove partial file {}: {}", path.display(), e);
        }
    }
}
