//! Read benchmark
//!
//! Reads every uncompressed baseline file and its compressed counterparts,
//! timing each full decode and relating the file sizes. Files are visited in
//! sorted order so repeated runs see the same cache history.

use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::bench::ProgressReporter;
use crate::config::BenchmarkConfig;
use crate::io::cache;
use crate::io::driver::{default_driver, RasterDriver};
use crate::io::layout::{datapoint_id, BenchLayout};
use crate::models::compression::{CompressionOption, BASELINE_OPTION};
use crate::models::data_type::DataType;
use crate::models::result::{
    Attempt, BenchRun, MeasurementKey, Outcome, ReadMeasurement, ReadTiming, SkipReason,
};
use crate::util::units::{format_duration, format_throughput};
use crate::Result;

/// Read benchmark executor
pub struct ReadBenchmark {
    config: BenchmarkConfig,
    layout: BenchLayout,
    driver: Box<dyn RasterDriver>,
}

impl ReadBenchmark {
    /// Create a new read benchmark executor using the default raster driver
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        config.validate()?;
        let layout = config.layout();

        Ok(Self {
            config,
            layout,
            driver: default_driver(),
        })
    }

    /// Read through a different raster driver
    pub fn with_driver(mut self, driver: Box<dyn RasterDriver>) -> Self {
        self.driver = driver;
        self
    }

    fn compressed_options(&self) -> Vec<&CompressionOption> {
        self.config.options.iter().filter(|o| !o.is_baseline()).collect()
    }

    /// Execute the read benchmark over the whole baseline tree
    pub fn run(&self, progress: &mut ProgressReporter) -> Result<BenchRun<ReadMeasurement>> {
        let start_time = Instant::now();
        let options = self.compressed_options();

        let mut baselines = Vec::new();
        for &dtype in &self.config.data_types {
            let files = self.layout.baseline_files(dtype)?;
            println!(
                "Found {} uncompressed {} files under {}",
                files.len(),
                dtype,
                self.layout.option_dir(BASELINE_OPTION, dtype).display()
            );
            baselines.push((dtype, files));
        }

        let file_count: usize = baselines.iter().map(|(_, files)| files.len()).sum();
        progress.set_total(file_count * (1 + options.len()));

        let mut attempts = Vec::new();
        for (dtype, files) in &baselines {
            for file in files {
                self.read_datapoint(*dtype, file, &options, progress, &mut attempts)?;
            }
        }

        let run = BenchRun::new(attempts, start_time.elapsed());
        println!(
            "Read benchmark finished in {}: {} recorded, {} skipped, {} failed",
            format_duration(run.elapsed),
            run.recorded_count(),
            run.skipped_count(),
            run.failed_count()
        );
        Ok(run)
    }

    fn read_datapoint(
        &self,
        dtype: DataType,
        baseline: &Path,
        options: &[&CompressionOption],
        progress: &mut ProgressReporter,
        attempts: &mut Vec<Attempt<ReadMeasurement>>,
    ) -> Result<()> {
        let id = datapoint_id(baseline);

        let uncompressed = match self.timed_read(baseline) {
            Ok(timing) => timing,
            Err(e) => {
                let key = MeasurementKey::new(BASELINE_OPTION, dtype, &id);
                eprintln!("Read of {} failed: {}", key, e);
                progress.advance(1 + options.len(), key.to_string())?;
                attempts.push(Attempt::failed(key, e));
                return Ok(());
            }
        };

        progress.advance(1, format!("{}/{}/{}", BASELINE_OPTION, dtype, id))?;

        for option in options {
            let key = MeasurementKey::new(&option.name, dtype, &id);
            let attempt = self.read_one(key, baseline, uncompressed);

            match &attempt.outcome {
                Outcome::Recorded(m) => println!(
                    "{}: rate {:.2}, {} -> {}",
                    attempt.key,
                    m.compression_rate,
                    format_throughput(m.uncompressed.speed_mbps),
                    format_throughput(m.compressed.speed_mbps)
                ),
                Outcome::Skipped(reason) => println!("Skipping {}: {}", attempt.key, reason),
                Outcome::Failed(error) => eprintln!("Read of {} failed: {}", attempt.key, error),
            }

            progress.advance(1, attempt.key.to_string())?;
            attempts.push(attempt);
        }

        Ok(())
    }

    fn read_one(
        &self,
        key: MeasurementKey,
        baseline: &Path,
        uncompressed: ReadTiming,
    ) -> Attempt<ReadMeasurement> {
        let path = self
            .layout
            .counterpart(baseline, &key.compression, key.data_type);
        if !path.is_file() {
            return Attempt::skipped(key, SkipReason::MissingCompressed { path });
        }

        let compressed = match self.timed_read(&path) {
            Ok(timing) => timing,
            Err(e) => return Attempt::failed(key, e),
        };

        if compressed.size == 0 {
            return Attempt::skipped(
                key,
                SkipReason::DegenerateMeasurement {
                    size: 0,
                    elapsed: compressed.elapsed,
                },
            );
        }

        Attempt::recorded(key, ReadMeasurement::new(uncompressed, compressed))
    }

    /// Time a full decode of `path`
    fn timed_read(&self, path: &Path) -> Result<ReadTiming> {
        if self.config.drop_page_cache {
            if let Err(e) = cache::evict(path) {
                eprintln!("Could not evict {} from the page cache: {}", path.display(), e);
            }
        }

        let size = fs::metadata(path)?.len();

        let start = Instant::now();
        self.driver.read(path)?;
        let elapsed = start.elapsed();

        Ok(ReadTiming::new(size, elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::compression::Codec;
    use crate::models::raster::{RasterData, RasterProfile};
    use crate::{RasterBenchError, Result};
    use tempfile::TempDir;

    /// Sleeps briefly per read, rejecting paths that contain "corrupt"
    struct StubDriver;

    impl RasterDriver for StubDriver {
        fn name(&self) -> &str {
            "stub"
        }

        fn write(&self, _path: &Path, _data: &RasterData, _profile: &RasterProfile) -> Result<()> {
            Ok(())
        }

        fn read(&self, path: &Path) -> Result<(RasterData, RasterProfile)> {
            if path.to_string_lossy().contains("corrupt") {
                return Err(RasterBenchError::RasterError("corrupt strip".to_string()));
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
            Ok((
                RasterData::Byte(vec![0]),
                RasterProfile::new(1, 1, 1, DataType::Byte),
            ))
        }
    }

    fn setup(temp_dir: &TempDir) -> ReadBenchmark {
        let config = BenchmarkConfig::default()
            .with_root_dir(temp_dir.path().to_path_buf())
            .with_data_types(vec![DataType::Byte])
            .with_options(vec![
                CompressionOption::baseline(),
                CompressionOption::new("lzw", Codec::Lzw),
                CompressionOption::new("packbits", Codec::Packbits),
            ]);
        ReadBenchmark::new(config)
            .unwrap()
            .with_driver(Box::new(StubDriver))
    }

    fn put(bench: &ReadBenchmark, option: &str, id: &str, size: usize) {
        let path = bench.layout.file_path(option, DataType::Byte, id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![1u8; size]).unwrap();
    }

    #[test]
    fn test_rate_and_missing_counterpart() {
        let temp_dir = TempDir::new().unwrap();
        let bench = setup(&temp_dir);
        put(&bench, "none", "a", 4000);
        put(&bench, "lzw", "a", 1000);

        let run = bench.run(&mut ProgressReporter::silent()).unwrap();
        assert_eq!(run.attempts.len(), 2);

        let lzw = run.attempts[0].measurement().unwrap();
        assert_eq!(run.attempts[0].key.compression, "lzw");
        assert!((lzw.compression_rate - 4.0).abs() < 1e-12);
        assert_eq!(lzw.uncompressed.size, 4000);

        assert!(matches!(
            run.attempts[1].outcome,
            Outcome::Skipped(SkipReason::MissingCompressed { .. })
        ));
    }

    #[test]
    fn test_baseline_read_failure_moves_on() {
        let temp_dir = TempDir::new().unwrap();
        let bench = setup(&temp_dir);
        put(&bench, "none", "a_corrupt", 100);
        put(&bench, "none", "b", 100);
        put(&bench, "lzw", "b", 50);
        put(&bench, "packbits", "b", 0);

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut progress = ProgressReporter::new(tx);
        let run = bench.run(&mut progress).unwrap();

        assert_eq!(run.attempts[0].key, MeasurementKey::new("none", DataType::Byte, "a_corrupt"));
        assert!(run.attempts[0].is_failed());
        assert_eq!(run.recorded_count(), 1);
        assert!(matches!(
            run.attempts[2].outcome,
            Outcome::Skipped(SkipReason::DegenerateMeasurement { size: 0, .. })
        ));

        // Two files, each accounting for the baseline plus two options
        assert_eq!(progress.completed(), 6);
        let mut last = None;
        while let Ok(update) = rx.try_recv() {
            last = Some(update);
        }
        let last = last.unwrap();
        assert_eq!((last.completed, last.total), (6, 6));
    }

    #[test]
    fn test_counterpart_directory_is_missing() {
        let temp_dir = TempDir::new().unwrap();
        let bench = setup(&temp_dir);
        put(&bench, "none", "x", 10);
        let dir = bench.layout.file_path("lzw", DataType::Byte, "x");
        // Counterpart exists but is a directory, not a file
        fs::create_dir_all(&dir).unwrap();

        let run = bench.run(&mut ProgressReporter::silent()).unwrap();
        assert!(matches!(
            run.attempts[0].outcome,
            Outcome::Skipped(SkipReason::MissingCompressed { .. })
        ));
    }

    #[test]
    fn test_empty_tree() {
        let temp_dir = TempDir::new().unwrap();
        let run = setup(&temp_dir).run(&mut ProgressReporter::silent()).unwrap();
        assert!(run.attempts.is_empty());
    }
}
