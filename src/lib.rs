//! rastbench - Raster compression benchmark
//!
//! Measures read/write throughput and compression ratios of GeoTIFF tiles
//! written with different compression presets and pixel data types, and
//! aggregates the measurements into CSV reports.

use std::fmt;

pub mod bench;
pub mod config;
pub mod io;
pub mod models;
pub mod report;
pub mod runner;
pub mod source;
pub mod util;

// Common error types
#[derive(Debug)]
pub enum RasterBenchError {
    /// I/O operation failed
    IoError(std::io::Error),
    /// Configuration validation or parsing error
    ConfigError(String),
    /// Benchmark execution error
    BenchmarkError(String),
    /// Permission denied for disk operations
    PermissionDenied(String),
    /// Raster encoding or decoding failed
    RasterError(String),
    /// The raster driver cannot express a compression option
    UnsupportedOption(String),
    /// Dataset catalog could not be read or a datapoint could not be loaded
    CatalogError(String),
    /// CSV report could not be written
    ReportError(String),
    /// Run history persistence error
    PersistenceError(String),
    /// Cancellation error
    CancellationError(String),
}

impl fmt::Display for RasterBenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterBenchError::IoError(err) => write!(f, "I/O error: {}", err),
            RasterBenchError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            RasterBenchError::BenchmarkError(msg) => write!(f, "Benchmark error: {}", msg),
            RasterBenchError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            RasterBenchError::RasterError(msg) => write!(f, "Raster error: {}", msg),
            RasterBenchError::UnsupportedOption(msg) => write!(f, "Unsupported option: {}", msg),
            RasterBenchError::CatalogError(msg) => write!(f, "Catalog error: {}", msg),
            RasterBenchError::ReportError(msg) => write!(f, "Report error: {}", msg),
            RasterBenchError::PersistenceError(msg) => {
                write!(f, "Results persistence error: {}", msg)
            }
            RasterBenchError::CancellationError(msg) => write!(f, "Cancellation error: {}", msg),
        }
    }
}

impl std::error::Error for RasterBenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RasterBenchError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RasterBenchError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                RasterBenchError::PermissionDenied(format!("Access denied: {}", err))
            }
            _ => RasterBenchError::IoError(err),
        }
    }
}

impl From<serde_json::Error> for RasterBenchError {
    fn from(err: serde_json::Error) -> Self {
        RasterBenchError::PersistenceError(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::de::Error> for RasterBenchError {
    fn from(err: toml::de::Error) -> Self {
        RasterBenchError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for RasterBenchError {
    fn from(err: toml::ser::Error) -> Self {
        RasterBenchError::ConfigError(format!("TOML serialization error: {}", err))
    }
}

impl From<tiff::TiffError> for RasterBenchError {
    fn from(err: tiff::TiffError) -> Self {
        match err {
            tiff::TiffError::IoError(io_err) => RasterBenchError::from(io_err),
            other => RasterBenchError::RasterError(other.to_string()),
        }
    }
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for RasterBenchError {
    fn from(err: gdal::errors::GdalError) -> Self {
        RasterBenchError::RasterError(format!("GDAL error: {}", err))
    }
}

/// Result type alias for rastbench operations
pub type Result<T> = std::result::Result<T, RasterBenchError>;

/// Error handling utilities
pub mod error {
    use super::RasterBenchError;

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &RasterBenchError) -> String {
        match error {
            RasterBenchError::PermissionDenied(_) => {
                "Permission denied. Check permissions on the benchmark root directory."
                    .to_string()
            }
            RasterBenchError::ConfigError(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            RasterBenchError::CatalogError(msg) => {
                format!("Could not load the dataset catalog: {}", msg)
            }
            RasterBenchError::ReportError(_) => {
                "Failed to write the CSV report. Check disk space and permissions.".to_string()
            }
            RasterBenchError::PersistenceError(_) => {
                "Failed to save run history. Check disk space and permissions.".to_string()
            }
            RasterBenchError::UnsupportedOption(msg) => {
                format!("The raster driver cannot write this option: {}", msg)
            }
            RasterBenchError::CancellationError(_) => "Operation was cancelled.".to_string(),
            _ => error.to_string(),
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "rastbench";
pub const CONFIG_FILE: &str = "rastbench.toml";
pub const RESULTS_FILE: &str = "results.json";
pub const MAX_RESULTS_HISTORY: usize = 100;
pub const READ_REPORT_FILE: &str = "Read_speed_rate_summary_2000.csv";
pub const WRITE_REPORT_FILE: &str = "Write_speed_summary_2000.csv";
