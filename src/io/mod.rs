//! I/O operations module
//!
//! Contains the raster driver seam, GeoTIFF tag handling, the benchmark
//! directory layout and page cache eviction.

pub mod cache;
pub mod driver;
#[cfg(feature = "gdal")]
pub mod gdal_driver;
pub mod geotiff;
pub mod layout;

pub use driver::{default_driver, RasterDriver, TiffDriver};
#[cfg(feature = "gdal")]
pub use gdal_driver::GdalDriver;
pub use layout::{datapoint_id, BenchLayout};
