use rastbench::bench::{ProgressReporter, WriteBenchmark};
use rastbench::config::BenchmarkConfig;
use rastbench::error;
use rastbench::source::{CatalogSource, SyntheticSource};
use rastbench::RasterBenchError;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_user_friendly_messages() {
    let msg = error::user_friendly_message(&RasterBenchError::PermissionDenied("x".into()));
    assert!(msg.contains("Permission denied"));

    let msg = error::user_friendly_message(&RasterBenchError::CatalogError("no rows".into()));
    assert!(msg.contains("catalog"));
    assert!(msg.contains("no rows"));

    let msg = error::user_friendly_message(&RasterBenchError::RasterError("bad strip".into()));
    assert_eq!(msg, "Raster error: bad strip");
}

#[test]
fn test_error_conversions() {
    let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
    assert!(matches!(
        RasterBenchError::from(denied),
        RasterBenchError::PermissionDenied(_)
    ));

    let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err = RasterBenchError::from(missing);
    assert!(std::error::Error::source(&err).is_some());

    let toml_err = toml::from_str::<BenchmarkConfig>("sample_size = [").unwrap_err();
    assert!(matches!(
        RasterBenchError::from(toml_err),
        RasterBenchError::ConfigError(_)
    ));

    let json_err = serde_json::from_str::<u32>("{").unwrap_err();
    assert!(matches!(
        RasterBenchError::from(json_err),
        RasterBenchError::PersistenceError(_)
    ));
}

#[test]
fn test_catalog_without_id_column_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = temp_dir.path().join("catalog.csv");
    fs::write(&catalog, "name,path\nfoo,foo.tif\n").unwrap();

    let config = BenchmarkConfig::default().with_root_dir(temp_dir.path().join("bench"));
    let bench = WriteBenchmark::new(config).unwrap();

    let result = bench.run(&CatalogSource::new(&catalog), &mut ProgressReporter::silent());
    assert!(matches!(result, Err(RasterBenchError::CatalogError(_))));
    assert!(!temp_dir.path().join("bench").exists());
}

#[test]
fn test_unloadable_datapoint_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = temp_dir.path().join("catalog.csv");
    fs::write(&catalog, "datapoint_id,path\nbroken,broken.tif\n").unwrap();
    fs::write(temp_dir.path().join("broken.tif"), b"not a tiff").unwrap();

    let config = BenchmarkConfig::default().with_root_dir(temp_dir.path().join("bench"));
    let bench = WriteBenchmark::new(config).unwrap();

    let result = bench.run(&CatalogSource::new(&catalog), &mut ProgressReporter::silent());
    assert!(matches!(result, Err(RasterBenchError::CatalogError(_))));
}

#[test]
fn test_dropped_progress_receiver_cancels_run() {
    let temp_dir = TempDir::new().unwrap();
    let config = BenchmarkConfig::default()
        .with_root_dir(temp_dir.path().to_path_buf())
        .with_sample_size(1);
    let bench = WriteBenchmark::new(config).unwrap();

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    drop(rx);
    let mut progress = ProgressReporter::new(tx);

    let result = bench.run(&SyntheticSource::new(1, 8, 8, 1, 0), &mut progress);
    assert!(matches!(result, Err(RasterBenchError::CancellationError(_))));
    assert_eq!(progress.completed(), 1);
}
