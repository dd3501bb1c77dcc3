use rastbench::bench::{ProgressReporter, ReadBenchmark, WriteBenchmark};
use rastbench::config::BenchmarkConfig;
use rastbench::io::{RasterDriver, TiffDriver};
use rastbench::models::{
    CompressionOption, Codec, DataType, Outcome, Predictor, RasterData, RasterProfile, SkipReason,
};
use rastbench::report::summarize;
use rastbench::source::SyntheticSource;
use rastbench::Result;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn config(root: &Path) -> BenchmarkConfig {
    BenchmarkConfig::default()
        .with_root_dir(root.to_path_buf())
        .with_sample_size(3)
        .with_data_types(vec![DataType::Byte, DataType::Float32])
        .with_options(vec![
            CompressionOption::baseline(),
            CompressionOption::new("lzw", Codec::Lzw),
            CompressionOption::new("deflate_pred2", Codec::Deflate)
                .with_predictor(Predictor::Horizontal),
        ])
}

#[test]
fn test_rates_follow_file_sizes() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(temp_dir.path());

    WriteBenchmark::new(config.clone())
        .unwrap()
        .with_driver(Box::new(TiffDriver::new()))
        .run(&SyntheticSource::new(3, 64, 64, 1, 5), &mut ProgressReporter::silent())
        .unwrap();

    let run = ReadBenchmark::new(config)
        .unwrap()
        .with_driver(Box::new(TiffDriver::new()))
        .run(&mut ProgressReporter::silent())
        .unwrap();

    // 3 datapoints x 2 data types x 2 compressed options
    assert_eq!(run.attempts.len(), 12);
    assert_eq!(run.failed_count(), 0);

    for (key, m) in run.measurements() {
        let baseline = temp_dir
            .path()
            .join("none")
            .join(key.data_type.name())
            .join(format!("{}.tif", key.datapoint_id));
        let compressed = temp_dir
            .path()
            .join(&key.compression)
            .join(key.data_type.name())
            .join(format!("{}.tif", key.datapoint_id));
        let expected =
            fs::metadata(baseline).unwrap().len() as f64 / fs::metadata(compressed).unwrap().len() as f64;
        assert!((m.compression_rate - expected).abs() < 1e-12);
    }

    // The tiff encoder has no horizontal predictor for float32, so its counterpart is missing
    let missing: Vec<_> = run
        .attempts
        .iter()
        .filter(|a| matches!(a.outcome, Outcome::Skipped(SkipReason::MissingCompressed { .. })))
        .map(|a| (a.key.compression.as_str(), a.key.data_type))
        .collect();
    assert_eq!(missing, vec![("deflate_pred2", DataType::Float32); 3]);
}

#[test]
fn test_read_order_is_sorted_by_file_name() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(temp_dir.path()).with_data_types(vec![DataType::Byte]);

    WriteBenchmark::new(config.clone())
        .unwrap()
        .run(&SyntheticSource::new(3, 8, 8, 1, 1), &mut ProgressReporter::silent())
        .unwrap();

    let run = ReadBenchmark::new(config)
        .unwrap()
        .run(&mut ProgressReporter::silent())
        .unwrap();
    let ids: Vec<_> = run
        .attempts
        .iter()
        .filter(|a| a.key.compression == "lzw")
        .map(|a| a.key.datapoint_id.clone())
        .collect();
    assert_eq!(ids, vec!["synthetic_0000", "synthetic_0001", "synthetic_0002"]);
}

/// Driver whose read time is proportional to file size: 1 MB per 100 ms
struct PacedDriver;

impl RasterDriver for PacedDriver {
    fn name(&self) -> &str {
        "paced"
    }

    fn write(&self, _path: &Path, _data: &RasterData, _profile: &RasterProfile) -> Result<()> {
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<(RasterData, RasterProfile)> {
        let size = fs::metadata(path)?.len();
        std::thread::sleep(Duration::from_millis(size * 100 / (1024 * 1024)));
        Ok((
            RasterData::Byte(Vec::new()),
            RasterProfile::new(1, 1, 1, DataType::Byte),
        ))
    }
}

#[test]
fn test_summary_speeds_with_paced_reads() {
    const MB: usize = 1024 * 1024;
    let temp_dir = TempDir::new().unwrap();
    let config = config(temp_dir.path()).with_data_types(vec![DataType::Byte]);

    for (id, mb) in [("a", 1), ("b", 2), ("c", 3)] {
        for (option, size) in [("none", mb * MB), ("lzw", mb * MB / 4)] {
            let dir = temp_dir.path().join(option).join("byte");
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(format!("{}.tif", id)), vec![0u8; size]).unwrap();
        }
    }

    let run = ReadBenchmark::new(config)
        .unwrap()
        .with_driver(Box::new(PacedDriver))
        .run(&mut ProgressReporter::silent())
        .unwrap();

    let summary = summarize(&run.attempts);
    let lzw = summary.row("lzw", DataType::Byte).unwrap();
    assert_eq!(lzw.count, 3);

    // Rate column is exact, speeds are bounded by the pacing (10 MB/s at most)
    let rate = &lzw.stats[4];
    assert!((rate.mean - 4.0).abs() < 1e-12);
    assert_eq!(rate.std_dev, Some(0.0));
    assert!(lzw.stats[1].mean <= 10.0);
    assert!(lzw.stats[1].mean > 1.0);
    assert!(summary.row("deflate_pred2", DataType::Byte).is_none());
}
