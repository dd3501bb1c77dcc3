#![cfg(feature = "gdal")]

use rastbench::bench::{ProgressReporter, ReadBenchmark, WriteBenchmark};
use rastbench::config::BenchmarkConfig;
use rastbench::io::GdalDriver;
use rastbench::models::{default_options, DataType, Outcome, SkipReason};
use rastbench::report::summarize;
use rastbench::source::SyntheticSource;
use tempfile::TempDir;

#[test]
fn test_default_table_is_fully_measured() {
    let temp_dir = TempDir::new().unwrap();
    let config = BenchmarkConfig::default()
        .with_root_dir(temp_dir.path().to_path_buf())
        .with_sample_size(1);
    let source = SyntheticSource::new(1, 32, 32, 1, 3);

    let run = WriteBenchmark::new(config.clone())
        .unwrap()
        .with_driver(Box::new(GdalDriver::new()))
        .run(&source, &mut ProgressReporter::silent())
        .unwrap();

    let options = default_options();
    let data_types = [DataType::Byte, DataType::Int16, DataType::Float32];
    assert_eq!(run.attempts.len(), options.len() * data_types.len());

    let unsupported = run
        .attempts
        .iter()
        .filter(|a| matches!(a.outcome, Outcome::Skipped(SkipReason::Unsupported { .. })))
        .count();
    assert_eq!(unsupported, 0);
    assert_eq!(run.failed_count(), 0);

    // Everything except the floating point predictor on integer types
    let allowed = options
        .iter()
        .map(|o| data_types.iter().filter(|&&dtype| o.supports(dtype)).count())
        .sum::<usize>();
    assert_eq!(run.recorded_count(), allowed);

    let read = ReadBenchmark::new(config)
        .unwrap()
        .with_driver(Box::new(GdalDriver::new()))
        .run(&mut ProgressReporter::silent())
        .unwrap();
    assert_eq!(read.recorded_count(), allowed - data_types.len());

    let summary = summarize(&read.attempts);
    assert!(summary.row("zstd_pred3", DataType::Float32).is_some());
    assert!(summary.row("lzma", DataType::Int16).is_some());
    assert!(summary.row("deflate_pred2", DataType::Float32).is_some());
}
