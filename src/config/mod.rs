//! Configuration management module
//!
//! Handles loading, saving, and validation of the benchmark configuration:
//! root directory, dataset source, sample bound, data types and the
//! compression option table.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::io::layout::BenchLayout;
use crate::models::compression::{default_options, Codec, CompressionOption, BASELINE_OPTION};
use crate::models::data_type::DataType;
use crate::source::{CatalogSource, DatasetSource, SyntheticSource};
use crate::{RasterBenchError, Result, APP_NAME, CONFIG_FILE, READ_REPORT_FILE, WRITE_REPORT_FILE};

pub mod persistence;

/// Where the write benchmark gets its datapoints from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// CSV catalog with `datapoint_id` and `path` columns
    Catalog { path: PathBuf },
    /// Generated pseudo-imagery
    Synthetic {
        count: usize,
        width: u32,
        height: u32,
        bands: u16,
        seed: u64,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Synthetic {
            count: 5,
            width: 512,
            height: 512,
            bands: 3,
            seed: 42,
        }
    }
}

impl SourceConfig {
    /// Instantiate the configured source
    pub fn build(&self) -> Box<dyn DatasetSource> {
        match self {
            SourceConfig::Catalog { path } => Box::new(CatalogSource::new(path.clone())),
            SourceConfig::Synthetic {
                count,
                width,
                height,
                bands,
                seed,
            } => Box::new(SyntheticSource::new(*count, *width, *height, *bands, *seed)),
        }
    }
}

/// Benchmark configuration structure containing all run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Root of the `<option>/<dtype>/<datapoint>.tif` tree
    pub root_dir: PathBuf,
    /// Number of catalog entries written per run
    pub sample_size: usize,
    /// Data types each datapoint is written as
    pub data_types: Vec<DataType>,
    /// Evict each file from the page cache before reading it
    pub drop_page_cache: bool,
    /// fsync written files inside the timed region
    pub sync_writes: bool,
    /// Read report file name, relative to the root directory
    pub read_report: String,
    /// Write report file name, relative to the root directory
    pub write_report: String,
    /// Dataset source
    pub source: SourceConfig,
    /// Compression option table, baseline included
    pub options: Vec<CompressionOption>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("rastbench_data"),
            sample_size: 5,
            data_types: DataType::ALL.to_vec(),
            drop_page_cache: false,
            sync_writes: false,
            read_report: READ_REPORT_FILE.to_string(),
            write_report: WRITE_REPORT_FILE.to_string(),
            source: SourceConfig::default(),
            options: default_options(),
        }
    }
}

impl BenchmarkConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(RasterBenchError::ConfigError(
                "Root directory must not be empty".to_string(),
            ));
        }

        if self.root_dir.exists() && !self.root_dir.is_dir() {
            return Err(RasterBenchError::ConfigError(format!(
                "Root path is not a directory: {}",
                self.root_dir.display()
            )));
        }

        if self.sample_size == 0 {
            return Err(RasterBenchError::ConfigError(
                "Sample size must be greater than 0".to_string(),
            ));
        }

        if self.data_types.is_empty() {
            return Err(RasterBenchError::ConfigError(
                "At least one data type is required".to_string(),
            ));
        }
        let unique_types: HashSet<_> = self.data_types.iter().collect();
        if unique_types.len() != self.data_types.len() {
            return Err(RasterBenchError::ConfigError(
                "Data types must not repeat".to_string(),
            ));
        }

        for report in [&self.read_report, &self.write_report] {
            if !is_plain_file_name(report) {
                return Err(RasterBenchError::ConfigError(format!(
                    "Report name must be a plain file name: '{}'",
                    report
                )));
            }
        }
        if self.read_report == self.write_report {
            return Err(RasterBenchError::ConfigError(
                "Read and write reports must have different names".to_string(),
            ));
        }

        self.validate_source()?;
        self.validate_options()
    }

    fn validate_source(&self) -> Result<()> {
        match &self.source {
            SourceConfig::Catalog { path } => {
                if path.as_os_str().is_empty() {
                    return Err(RasterBenchError::ConfigError(
                        "Catalog path must not be empty".to_string(),
                    ));
                }
            }
            SourceConfig::Synthetic {
                count,
                width,
                height,
                bands,
                ..
            } => {
                if *count == 0 || *width == 0 || *height == 0 || *bands == 0 {
                    return Err(RasterBenchError::ConfigError(
                        "Synthetic source needs a nonzero count, width, height and band count"
                            .to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_options(&self) -> Result<()> {
        let mut names = HashSet::new();
        for option in &self.options {
            if !is_path_safe(&option.name) {
                return Err(RasterBenchError::ConfigError(format!(
                    "Option name '{}' must only contain letters, digits, '_' or '-'",
                    option.name
                )));
            }
            if !names.insert(option.name.as_str()) {
                return Err(RasterBenchError::ConfigError(format!(
                    "Duplicate compression option: {}",
                    option.name
                )));
            }

            if option.predictor.is_some() && !option.codec.accepts_predictor() {
                return Err(RasterBenchError::ConfigError(format!(
                    "Option {} sets a predictor but {:?} does not accept one",
                    option.name, option.codec
                )));
            }

            if let Some(level) = option.level {
                let (min, max) = option.codec.level_range().ok_or_else(|| {
                    RasterBenchError::ConfigError(format!(
                        "Option {} sets a level but {:?} does not take one",
                        option.name, option.codec
                    ))
                })?;
                if level < min || level > max {
                    return Err(RasterBenchError::ConfigError(format!(
                        "Option {} level {} is outside {}-{}",
                        option.name, level, min, max
                    )));
                }
            }
        }

        match self.options.iter().find(|o| o.is_baseline()) {
            None => Err(RasterBenchError::ConfigError(format!(
                "The '{}' baseline option is required",
                BASELINE_OPTION
            ))),
            Some(baseline)
                if baseline.codec != Codec::None
                    || baseline.predictor.is_some()
                    || baseline.level.is_some() =>
            {
                Err(RasterBenchError::ConfigError(format!(
                    "The '{}' option must be uncompressed",
                    BASELINE_OPTION
                )))
            }
            Some(_) => Ok(()),
        }
    }

    /// Set the benchmark root directory
    pub fn with_root_dir(mut self, path: PathBuf) -> Self {
        self.root_dir = path;
        self
    }

    /// Set the dataset source
    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }

    /// Set the number of datapoints written per run
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Set the data types under benchmark
    pub fn with_data_types(mut self, data_types: Vec<DataType>) -> Self {
        self.data_types = data_types;
        self
    }

    /// Replace the compression option table
    pub fn with_options(mut self, options: Vec<CompressionOption>) -> Self {
        self.options = options;
        self
    }

    /// Set whether files are evicted from the page cache before reads
    pub fn with_drop_page_cache(mut self, drop: bool) -> Self {
        self.drop_page_cache = drop;
        self
    }

    /// Set whether writes are fsync'd inside the timed region
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Directory layout rooted at `root_dir`
    pub fn layout(&self) -> BenchLayout {
        BenchLayout::new(&self.root_dir)
    }

    pub fn read_report_path(&self) -> PathBuf {
        self.root_dir.join(&self.read_report)
    }

    pub fn write_report_path(&self) -> PathBuf {
        self.root_dir.join(&self.write_report)
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load configuration from an explicit path
    /// Returns default configuration if file doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            RasterBenchError::ConfigError(format!(
                "Failed to read config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            RasterBenchError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the standard config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    RasterBenchError::ConfigError(format!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| {
            RasterBenchError::ConfigError(format!(
                "Failed to write config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/rastbench/rastbench.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            RasterBenchError::ConfigError("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

fn is_path_safe(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A single path component that stays inside its parent directory
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}
