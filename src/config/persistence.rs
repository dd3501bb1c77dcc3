//! Run history persistence module
//!
//! Appends one [`RunRecord`] per pipeline run to a JSON file and rotates
//! out the oldest runs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::result::RunRecord;
use crate::{RasterBenchError, Result, APP_NAME, MAX_RESULTS_HISTORY, RESULTS_FILE};

/// Run history storage manager
#[derive(Debug)]
pub struct ResultsStorage {
    results_path: PathBuf,
}

/// History file structure for JSON persistence
#[derive(Debug, Serialize, Deserialize)]
struct ResultsFile {
    version: u32,
    runs: Vec<RunRecord>,
}

impl ResultsStorage {
    /// Create a storage manager at the standard location
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(Self::results_file_path()?))
    }

    /// Create a storage manager backed by an explicit file
    pub fn with_path(results_path: impl Into<PathBuf>) -> Self {
        Self {
            results_path: results_path.into(),
        }
    }

    /// Get the standard history file path
    /// Uses $DATA_HOME/rastbench/results.json
    pub fn results_file_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            RasterBenchError::PersistenceError("Unable to determine data directory".to_string())
        })?;

        Ok(data_dir.join(APP_NAME).join(RESULTS_FILE))
    }

    /// Load all runs, oldest first
    pub fn load_runs(&self) -> Result<Vec<RunRecord>> {
        if !self.results_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.results_path).map_err(|e| {
            RasterBenchError::PersistenceError(format!(
                "Failed to read results file {}: {}",
                self.results_path.display(),
                e
            ))
        })?;

        let results_file: ResultsFile = serde_json::from_str(&content).map_err(|e| {
            RasterBenchError::PersistenceError(format!(
                "Failed to parse results file {}: {}",
                self.results_path.display(),
                e
            ))
        })?;

        Ok(results_file.runs)
    }

    /// Append a run to the history file
    /// Keeps only the most recent MAX_RESULTS_HISTORY runs
    pub fn append_run(&self, run: RunRecord) -> Result<()> {
        let mut runs = self.load_runs()?;
        runs.push(run);

        if runs.len() > MAX_RESULTS_HISTORY {
            let skip_count = runs.len() - MAX_RESULTS_HISTORY;
            runs.drain(..skip_count);
        }

        self.save_runs(runs)
    }

    fn save_runs(&self, runs: Vec<RunRecord>) -> Result<()> {
        if let Some(parent) = self.results_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RasterBenchError::PersistenceError(format!(
                    "Failed to create results directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let results_file = ResultsFile { version: 1, runs };
        let content = serde_json::to_string_pretty(&results_file)?;

        fs::write(&self.results_path, content).map_err(|e| {
            RasterBenchError::PersistenceError(format!(
                "Failed to write results file {}: {}",
                self.results_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the most recent N runs, oldest first
    pub fn get_recent_runs(&self, count: usize) -> Result<Vec<RunRecord>> {
        let mut runs = self.load_runs()?;
        if runs.len() > count {
            runs.drain(..runs.len() - count);
        }
        Ok(runs)
    }

    /// Clear all stored runs
    pub fn clear_runs(&self) -> Result<()> {
        if self.results_path.exists() {
            fs::remove_file(&self.results_path)?;
        }
        Ok(())
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::{Attempt, BenchRun, MeasurementKey, Pipeline, WriteMeasurement};
    use crate::models::DataType;
    use crate::report::summarize;
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_test_run(recorded: usize) -> RunRecord {
        let attempts: Vec<_> = (0..recorded)
            .map(|i| {
                Attempt::recorded(
                    MeasurementKey::new("lzw", DataType::Byte, &format!("dp-{}", i)),
                    WriteMeasurement::new(1024 * 1024, Duration::from_millis(100)),
                )
            })
            .collect();
        let summary = summarize(&attempts);
        let run = BenchRun::new(attempts, Duration::from_secs(1));
        RunRecord::new(Pipeline::Write, PathBuf::from("/bench"), &run, summary)
    }

    fn storage(temp_dir: &TempDir) -> ResultsStorage {
        ResultsStorage::with_path(temp_dir.path().join("history").join("results.json"))
    }

    #[test]
    fn test_results_storage_new() {
        let storage = ResultsStorage::new();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_load_empty_history() {
        let temp_dir = TempDir::new().unwrap();
        assert!(storage(&temp_dir).load_runs().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_load_run() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);

        storage.append_run(create_test_run(3)).unwrap();

        let runs = storage.load_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].recorded, 3);
        assert_eq!(runs[0].pipeline, Pipeline::Write);
        assert_eq!(runs[0].summary.rows.len(), 1);
    }

    #[test]
    fn test_history_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);

        for i in 0..MAX_RESULTS_HISTORY + 10 {
            storage.append_run(create_test_run(i % 4)).unwrap();
        }

        let runs = storage.load_runs().unwrap();
        assert_eq!(runs.len(), MAX_RESULTS_HISTORY);
        // The first ten runs were rotated out
        assert_eq!(runs[0].recorded, 10 % 4);
        assert_eq!(runs[runs.len() - 1].recorded, (MAX_RESULTS_HISTORY + 9) % 4);
    }

    #[test]
    fn test_get_recent_runs() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);

        for i in 0..6 {
            storage.append_run(create_test_run(i)).unwrap();
        }

        let recent = storage.get_recent_runs(2).unwrap();
        assert_eq!(recent.iter().map(|r| r.recorded).collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(storage.get_recent_runs(20).unwrap().len(), 6);
    }

    #[test]
    fn test_clear_runs() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);

        storage.append_run(create_test_run(1)).unwrap();
        storage.clear_runs().unwrap();
        assert!(storage.load_runs().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_history_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);
        fs::create_dir_all(storage.results_path().parent().unwrap()).unwrap();
        fs::write(storage.results_path(), "{ not json").unwrap();

        assert!(matches!(
            storage.load_runs(),
            Err(RasterBenchError::PersistenceError(_))
        ));
    }

    #[test]
    fn test_results_file_format() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir);
        storage.append_run(create_test_run(2)).unwrap();

        let content = fs::read_to_string(storage.results_path()).unwrap();
        let results_file: ResultsFile = serde_json::from_str(&content).unwrap();

        assert_eq!(results_file.version, 1);
        assert_eq!(results_file.runs.len(), 1);
        assert!(content.contains("\"pipeline\": \"write\""));
    }
}
