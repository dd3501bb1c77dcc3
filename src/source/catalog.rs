//! CSV catalog of source GeoTIFF files

use std::path::{Path, PathBuf};

use crate::config::is_plain_file_name;
use crate::io::driver::{default_driver, RasterDriver};
use crate::models::compression::CompressionOption;
use crate::models::raster::Datapoint;
use crate::source::{CatalogEntry, DatasetSource};
use crate::{RasterBenchError, Result};

const ID_COLUMN: &str = "datapoint_id";
const PATH_COLUMN: &str = "path";

/// Catalog backed by a CSV file with `datapoint_id` and `path` columns.
///
/// Extra columns are ignored. Relative paths resolve against the directory
/// holding the catalog.
pub struct CatalogSource {
    catalog_path: PathBuf,
    driver: Box<dyn RasterDriver>,
}

impl CatalogSource {
    pub fn new(catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            driver: default_driver(),
        }
    }

    /// Load source rasters through a different driver
    pub fn with_driver(mut self, driver: Box<dyn RasterDriver>) -> Self {
        self.driver = driver;
        self
    }

    fn catalog_error(&self, detail: impl std::fmt::Display) -> RasterBenchError {
        RasterBenchError::CatalogError(format!("{}: {}", self.catalog_path.display(), detail))
    }

    fn resolve(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.catalog_path.parent() {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }
}

impl DatasetSource for CatalogSource {
    fn describe(&self) -> String {
        format!("catalog {}", self.catalog_path.display())
    }

    fn catalog(&self) -> Result<Vec<CatalogEntry>> {
        let mut reader =
            csv::Reader::from_path(&self.catalog_path).map_err(|e| self.catalog_error(e))?;

        let headers = reader.headers().map_err(|e| self.catalog_error(e))?.clone();
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);
        let id_index = column(ID_COLUMN)
            .ok_or_else(|| self.catalog_error(format!("missing '{}' column", ID_COLUMN)))?;
        let path_index = column(PATH_COLUMN)
            .ok_or_else(|| self.catalog_error(format!("missing '{}' column", PATH_COLUMN)))?;

        let mut entries = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| self.catalog_error(e))?;
            let datapoint_id = record.get(id_index).unwrap_or("").trim();
            let path = record.get(path_index).unwrap_or("").trim();
            if datapoint_id.is_empty() || path.is_empty() {
                return Err(self.catalog_error(format!("row {} has an empty id or path", index + 1)));
            }
            // The id becomes the file stem under every option directory
            if !is_plain_file_name(datapoint_id) {
                return Err(self.catalog_error(format!(
                    "row {}: datapoint id '{}' is not a plain file name",
                    index + 1,
                    datapoint_id
                )));
            }

            entries.push(CatalogEntry {
                index,
                datapoint_id: datapoint_id.to_string(),
                path: Some(self.resolve(path)),
            });
        }

        Ok(entries)
    }

    fn load(&self, entry: &CatalogEntry) -> Result<Datapoint> {
        let path = entry.path.as_ref().ok_or_else(|| {
            RasterBenchError::CatalogError(format!("datapoint {} has no path", entry.datapoint_id))
        })?;

        let (data, mut profile) = self.driver.read(path).map_err(|e| {
            RasterBenchError::CatalogError(format!(
                "failed to load datapoint {} from {}: {}",
                entry.datapoint_id,
                path.display(),
                e
            ))
        })?;

        profile.driver = "GTiff".to_string();
        profile.compression = CompressionOption::baseline();

        Ok(Datapoint {
            id: entry.datapoint_id.clone(),
            data,
            profile,
        })
    }
}
