//! Benchmark directory layout
//!
//! Files live at `<root>/<option>/<dtype>/<datapoint_id>.tif`; the
//! uncompressed baseline sits under the `none` option directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::compression::BASELINE_OPTION;
use crate::models::data_type::DataType;
use crate::Result;

/// Extension of every benchmark file
pub const RASTER_EXTENSION: &str = "tif";

#[derive(Debug, Clone)]
pub struct BenchLayout {
    root: PathBuf,
}

impl BenchLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one option's files for one data type
    pub fn option_dir(&self, option: &str, dtype: DataType) -> PathBuf {
        self.root.join(option).join(dtype.name())
    }

    pub fn file_path(&self, option: &str, dtype: DataType, datapoint_id: &str) -> PathBuf {
        self.option_dir(option, dtype)
            .join(format!("{}.{}", datapoint_id, RASTER_EXTENSION))
    }

    /// Uncompressed baseline files for a data type, sorted by file name.
    ///
    /// A missing directory yields no files; other directory entries are ignored.
    pub fn baseline_files(&self, dtype: DataType) -> Result<Vec<PathBuf>> {
        let dir = self.option_dir(BASELINE_OPTION, dtype);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// The file with the same name under another option directory
    pub fn counterpart(&self, baseline: &Path, option: &str, dtype: DataType) -> PathBuf {
        let dir = self.option_dir(option, dtype);
        match baseline.file_name() {
            Some(name) => dir.join(name),
            None => dir,
        }
    }
}

/// Datapoint id of a benchmark file (its file stem)
pub fn datapoint_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
