//! Data models module
//!
//! Contains compression presets, pixel data types, raster samples and the
//! measurement records produced by the benchmark pipelines.

pub mod compression;
pub mod data_type;
pub mod raster;
pub mod result;

// Re-export commonly used types
pub use compression::{default_options, Codec, CompressionOption, Predictor, BASELINE_OPTION};
pub use data_type::DataType;
pub use raster::{Datapoint, GeoTransform, RasterData, RasterProfile};
pub use result::{
    Attempt, BenchRun, MeasurementKey, Outcome, Pipeline, ReadMeasurement, ReadTiming, RunRecord,
    SkipReason, WriteMeasurement,
};
