//! Dataset sources
//!
//! A source lists the datapoints available for benchmarking and loads them
//! one at a time. [`CatalogSource`] reads a CSV catalog of GeoTIFF files,
//! [`SyntheticSource`] generates deterministic pseudo-imagery.

pub mod catalog;
pub mod synthetic;

use std::path::PathBuf;

use crate::models::raster::Datapoint;
use crate::Result;

pub use catalog::CatalogSource;
pub use synthetic::SyntheticSource;

/// One row of a dataset catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// Position in the catalog
    pub index: usize,
    pub datapoint_id: String,
    /// Location of the source raster, if the source is file based
    pub path: Option<PathBuf>,
}

/// Provides raster datapoints to the write benchmark
pub trait DatasetSource: Send {
    /// Short description for log output
    fn describe(&self) -> String;

    /// Ordered catalog entries
    fn catalog(&self) -> Result<Vec<CatalogEntry>>;

    /// Load exactly one datapoint
    fn load(&self, entry: &CatalogEntry) -> Result<Datapoint>;
}
