//! Aggregation and CSV reporting
//!
//! Groups recorded measurements by (compression option, data type), computes
//! mean and sample standard deviation per metric, sorts the groups slowest
//! first and writes them with human-readable column labels.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::models::data_type::DataType;
use crate::models::result::{Attempt, ReadMeasurement, WriteMeasurement};
use crate::util::stats::{mean, sample_std_dev};
use crate::{RasterBenchError, Result};

/// Report column labels for one metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricColumn {
    pub key: &'static str,
    pub mean_label: &'static str,
    pub std_label: &'static str,
}

/// A measurement record that can be aggregated into a report
pub trait Metrics {
    /// Metric columns in report order
    const COLUMNS: &'static [MetricColumn];
    /// Index into [`Metrics::COLUMNS`] the summary is sorted by
    const SORT_COLUMN: usize;

    /// Metric values, one per column
    fn values(&self) -> Vec<f64>;

    /// Whether the record may enter the aggregation
    fn is_valid(&self) -> bool;
}

const WRITE_COLUMNS: &[MetricColumn] = &[MetricColumn {
    key: "write_speed",
    mean_label: "Average Write Speed (MB/s)",
    std_label: "Standard Deviation of Write Speed (MB/s)",
}];

impl Metrics for WriteMeasurement {
    const COLUMNS: &'static [MetricColumn] = WRITE_COLUMNS;
    const SORT_COLUMN: usize = 0;

    fn values(&self) -> Vec<f64> {
        vec![self.write_speed_mbps]
    }

    fn is_valid(&self) -> bool {
        self.file_size > 0 && !self.elapsed.is_zero() && self.write_speed_mbps != 0.0
    }
}

const READ_COLUMNS: &[MetricColumn] = &[
    MetricColumn {
        key: "uncompressed_read_time",
        mean_label: "Avg. Uncompressed Read Time (s)",
        std_label: "Std Dev of Uncompressed Read Time (s)",
    },
    MetricColumn {
        key: "uncompressed_speed",
        mean_label: "Avg. Uncompressed Speed (MB/s)",
        std_label: "Std Dev of Uncompressed Speed (MB/s)",
    },
    MetricColumn {
        key: "compressed_read_time",
        mean_label: "Avg. Compressed Read Time (s)",
        std_label: "Std Dev of Compressed Read Time (s)",
    },
    MetricColumn {
        key: "compressed_speed",
        mean_label: "Avg. Compressed Speed (MB/s)",
        std_label: "Std Dev of Compressed Speed (MB/s)",
    },
    MetricColumn {
        key: "compression_rate",
        mean_label: "Avg. Compression Rate",
        std_label: "Std Dev of Compression Rate",
    },
];

impl Metrics for ReadMeasurement {
    const COLUMNS: &'static [MetricColumn] = READ_COLUMNS;
    const SORT_COLUMN: usize = 3;

    fn values(&self) -> Vec<f64> {
        vec![
            self.uncompressed.elapsed.as_secs_f64(),
            self.uncompressed.speed_mbps,
            self.compressed.elapsed.as_secs_f64(),
            self.compressed.speed_mbps,
            self.compression_rate,
        ]
    }

    fn is_valid(&self) -> bool {
        self.uncompressed.speed_mbps != 0.0 && self.compressed.speed_mbps != 0.0
    }
}

/// Mean and sample standard deviation of one metric within a group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    /// Undefined for single-sample groups
    pub std_dev: Option<f64>,
}

/// One (compression option, data type) group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub compression: String,
    pub data_type: DataType,
    /// Number of measurements aggregated into the row
    pub count: usize,
    /// One entry per metric column
    pub stats: Vec<MetricStats>,
}

/// Aggregated report, rows sorted ascending by the sort metric's mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Human-readable CSV header
    pub headers: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

/// Group, aggregate and sort the recorded measurements of a run.
///
/// Attempts without a measurement and invalid records (zero speed) are
/// excluded before grouping.
pub fn summarize<M: Metrics>(attempts: &[Attempt<M>]) -> Summary {
    let mut groups: BTreeMap<(String, DataType), Vec<Vec<f64>>> = BTreeMap::new();

    for attempt in attempts {
        let Some(measurement) = attempt.measurement() else {
            continue;
        };
        if !measurement.is_valid() {
            continue;
        }
        groups
            .entry((attempt.key.compression.clone(), attempt.key.data_type))
            .or_default()
            .push(measurement.values());
    }

    let mut rows: Vec<SummaryRow> = groups
        .into_iter()
        .map(|((compression, data_type), samples)| {
            let stats = (0..M::COLUMNS.len())
                .map(|column| {
                    let values: Vec<f64> = samples.iter().map(|s| s[column]).collect();
                    MetricStats {
                        mean: mean(&values).unwrap_or(0.0),
                        std_dev: sample_std_dev(&values),
                    }
                })
                .collect();
            SummaryRow {
                compression,
                data_type,
                count: samples.len(),
                stats,
            }
        })
        .collect();

    // Stable sort keeps the (option, data type) order among equal means
    rows.sort_by(|a, b| {
        a.stats[M::SORT_COLUMN]
            .mean
            .total_cmp(&b.stats[M::SORT_COLUMN].mean)
    });

    Summary {
        headers: headers_for(M::COLUMNS),
        rows,
    }
}

fn headers_for(columns: &[MetricColumn]) -> Vec<String> {
    let mut headers = vec!["Compression Method".to_string(), "Data Type".to_string()];
    for column in columns {
        headers.push(column.mean_label.to_string());
        headers.push(column.std_label.to_string());
    }
    headers
}

impl Summary {
    /// Find the row for a group
    pub fn row(&self, compression: &str, data_type: DataType) -> Option<&SummaryRow> {
        self.rows
            .iter()
            .find(|row| row.compression == compression && row.data_type == data_type)
    }

    /// Write the report as CSV to any writer
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.headers)
            .map_err(|e| RasterBenchError::ReportError(format!("Failed to write header: {}", e)))?;

        for row in &self.rows {
            let mut record = vec![row.compression.clone(), row.data_type.name().to_string()];
            for stats in &row.stats {
                record.push(stats.mean.to_string());
                record.push(stats.std_dev.map(|s| s.to_string()).unwrap_or_default());
            }
            csv.write_record(&record).map_err(|e| {
                RasterBenchError::ReportError(format!(
                    "Failed to write row {}/{}: {}",
                    row.compression, row.data_type, e
                ))
            })?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Write the report to a file, replacing any previous report
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path).map_err(|e| {
            RasterBenchError::ReportError(format!(
                "Failed to create report {}: {}",
                path.display(),
                e
            ))
        })?;
        self.write_csv_to(file)
    }
}
