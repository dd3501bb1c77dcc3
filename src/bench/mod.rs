//! Benchmark engine module
//!
//! Contains the write and read pipelines and the progress channel they
//! report through.

pub mod read;
pub mod write;

use tokio::sync::mpsc;

use crate::{RasterBenchError, Result};

// Re-export commonly used types
pub use read::ReadBenchmark;
pub use write::WriteBenchmark;

/// Progress update sent after every attempted measurement
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Attempts finished so far
    pub completed: usize,
    /// Attempts planned for the run
    pub total: usize,
    /// Key of the last attempt
    pub message: String,
}

impl ProgressUpdate {
    /// Calculate completion percentage (0.0 to 1.0)
    pub fn completion_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Counts attempts and forwards them to an optional listener.
///
/// Once a listener has been attached, dropping its receiver cancels the run.
#[derive(Debug, Default)]
pub struct ProgressReporter {
    tx: Option<mpsc::UnboundedSender<ProgressUpdate>>,
    completed: usize,
    total: usize,
}

impl ProgressReporter {
    pub fn new(tx: mpsc::UnboundedSender<ProgressUpdate>) -> Self {
        Self {
            tx: Some(tx),
            completed: 0,
            total: 0,
        }
    }

    /// Reporter without a listener
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn set_total(&mut self, total: usize) {
        self.total = total;
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Record `steps` finished attempts
    pub fn advance(&mut self, steps: usize, message: impl Into<String>) -> Result<()> {
        self.completed += steps;
        let Some(tx) = &self.tx else {
            return Ok(());
        };

        let update = ProgressUpdate {
            completed: self.completed,
            total: self.total.max(self.completed),
            message: message.into(),
        };
        tx.send(update).map_err(|_| {
            RasterBenchError::CancellationError("Progress receiver dropped".to_string())
        })
    }
}
