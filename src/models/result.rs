//! Benchmark measurement data models
//!
//! Contains the per-file measurement records, the tagged outcome of each
//! attempted measurement, and the run record persisted to the history file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::data_type::DataType;
use crate::report::Summary;
use crate::util::units::calculate_throughput_mbps;

/// Identifies one cell of the (compression option x data type x datapoint) matrix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasurementKey {
    pub compression: String,
    pub data_type: DataType,
    pub datapoint_id: String,
}

impl MeasurementKey {
    pub fn new(compression: &str, data_type: DataType, datapoint_id: &str) -> Self {
        Self {
            compression: compression.to_string(),
            data_type,
            datapoint_id: datapoint_id.to_string(),
        }
    }
}

impl fmt::Display for MeasurementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.compression, self.data_type, self.datapoint_id)
    }
}

/// One timed write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteMeasurement {
    /// Size of the written file in bytes
    pub file_size: u64,
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    /// Write speed in MB/s
    pub write_speed_mbps: f64,
}

impl WriteMeasurement {
    pub fn new(file_size: u64, elapsed: Duration) -> Self {
        Self {
            file_size,
            elapsed,
            write_speed_mbps: calculate_throughput_mbps(file_size, elapsed),
        }
    }
}

/// One timed read of a file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadTiming {
    /// File size in bytes
    pub size: u64,
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    /// Read speed in MB/s, zero when no time elapsed
    pub speed_mbps: f64,
}

impl ReadTiming {
    pub fn new(size: u64, elapsed: Duration) -> Self {
        Self {
            size,
            elapsed,
            speed_mbps: calculate_throughput_mbps(size, elapsed),
        }
    }
}

/// Uncompressed and compressed read of the same datapoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadMeasurement {
    pub uncompressed: ReadTiming,
    pub compressed: ReadTiming,
    /// uncompressed size / compressed size
    pub compression_rate: f64,
}

impl ReadMeasurement {
    pub fn new(uncompressed: ReadTiming, compressed: ReadTiming) -> Self {
        let compression_rate = if compressed.size == 0 {
            0.0
        } else {
            uncompressed.size as f64 / compressed.size as f64
        };
        Self {
            uncompressed,
            compressed,
            compression_rate,
        }
    }
}

/// Why an attempt produced no measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Output file already present; existing files are never overwritten
    AlreadyExists { path: PathBuf },
    /// Predictor cannot be applied to this data type
    IncompatiblePredictor { predictor: u8 },
    /// The raster driver cannot express the option
    Unsupported { driver: String, detail: String },
    /// Compressed counterpart of a baseline file is absent
    MissingCompressed { path: PathBuf },
    /// Zero elapsed time or zero file size
    DegenerateMeasurement { size: u64, #[serde(with = "duration_serde")] elapsed: Duration },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyExists { path } => {
                write!(f, "file {} already exists", path.display())
            }
            SkipReason::IncompatiblePredictor { predictor } => {
                write!(f, "predictor {} is incompatible with the data type", predictor)
            }
            SkipReason::Unsupported { driver, detail } => {
                write!(f, "{} driver cannot write it: {}", driver, detail)
            }
            SkipReason::MissingCompressed { path } => {
                write!(f, "compressed file not found: {}", path.display())
            }
            SkipReason::DegenerateMeasurement { size, elapsed } => write!(
                f,
                "degenerate measurement ({} bytes in {:?})",
                size, elapsed
            ),
        }
    }
}

/// Tagged result of a single attempted measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome<T> {
    Recorded(T),
    Skipped(SkipReason),
    Failed(String),
}

/// An attempted measurement and its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt<T> {
    pub key: MeasurementKey,
    pub outcome: Outcome<T>,
}

impl<T> Attempt<T> {
    pub fn recorded(key: MeasurementKey, measurement: T) -> Self {
        Self {
            key,
            outcome: Outcome::Recorded(measurement),
        }
    }

    pub fn skipped(key: MeasurementKey, reason: SkipReason) -> Self {
        Self {
            key,
            outcome: Outcome::Skipped(reason),
        }
    }

    pub fn failed(key: MeasurementKey, error: impl fmt::Display) -> Self {
        Self {
            key,
            outcome: Outcome::Failed(error.to_string()),
        }
    }

    /// The measurement, if one was recorded
    pub fn measurement(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Recorded(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// All attempts of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchRun<T> {
    pub attempts: Vec<Attempt<T>>,
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
}

impl<T> BenchRun<T> {
    pub fn new(attempts: Vec<Attempt<T>>, elapsed: Duration) -> Self {
        Self { attempts, elapsed }
    }

    /// Recorded measurements with their keys
    pub fn measurements(&self) -> impl Iterator<Item = (&MeasurementKey, &T)> {
        self.attempts
            .iter()
            .filter_map(|a| a.measurement().map(|m| (&a.key, m)))
    }

    pub fn recorded_count(&self) -> usize {
        self.measurements().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.attempts.iter().filter(|a| a.is_skipped()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.attempts.iter().filter(|a| a.is_failed()).count()
    }
}

/// Which pipeline produced a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    Write,
    Read,
}

impl Pipeline {
    pub fn description(&self) -> &'static str {
        match self {
            Pipeline::Write => "Write benchmark",
            Pipeline::Read => "Read benchmark",
        }
    }
}

/// Run history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Timestamp when the run finished
    pub timestamp: DateTime<Utc>,
    pub pipeline: Pipeline,
    pub root_dir: PathBuf,
    pub recorded: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    /// Aggregated statistics written to the CSV report
    pub summary: Summary,
}

impl RunRecord {
    pub fn new<T>(pipeline: Pipeline, root_dir: PathBuf, run: &BenchRun<T>, summary: Summary) -> Self {
        Self {
            timestamp: Utc::now(),
            pipeline,
            root_dir,
            recorded: run.recorded_count(),
            skipped: run.skipped_count(),
            failed: run.failed_count(),
            elapsed: run.elapsed,
            summary,
        }
    }

    /// Get a human-readable summary of the run
    pub fn summary_line(&self) -> String {
        format!(
            "{} - {} - {} recorded, {} skipped, {} failed - {} groups - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.pipeline.description(),
            self.recorded,
            self.skipped,
            self.failed,
            self.summary.rows.len(),
            self.root_dir.display()
        )
    }
}

// Durations are stored as integer nanoseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_nanos() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}
