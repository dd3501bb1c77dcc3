//! GeoTIFF driver backed by GDAL
//!
//! Compression presets are handed to the GTiff driver verbatim as creation
//! options, so every codec and predictor libtiff was built with is
//! available. Only compiled with the `gdal` feature.

use std::path::Path;

use gdal::config::set_thread_local_config_option;
use gdal::raster::{Buffer, GdalDataType, GdalType, RasterBand, RasterCreationOption};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags, Metadata};

use crate::io::driver::RasterDriver;
use crate::models::compression::CompressionOption;
use crate::models::raster::{GeoTransform, RasterData, RasterProfile};
use crate::{RasterBenchError, Result};

const GTIFF: &str = "GTiff";

/// Raster driver on top of GDAL's GTiff driver.
///
/// Bands are written band-sequentially from [`RasterData`] into a single
/// multi-band dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalDriver;

impl GdalDriver {
    pub fn new() -> Self {
        Self
    }

    /// Fail if the linked libtiff lacks the requested codec
    fn ensure_codec(&self, driver: &gdal::Driver, option: &CompressionOption) -> Result<()> {
        let Some(codec) = option.codec.gdal_name() else {
            return Ok(());
        };
        let options = driver
            .metadata_item("DMD_CREATIONOPTIONLIST", "")
            .unwrap_or_default();
        if options.contains(&format!("<Value>{}</Value>", codec)) {
            Ok(())
        } else {
            Err(RasterBenchError::UnsupportedOption(format!(
                "{} compression is not built into this GDAL",
                codec
            )))
        }
    }
}

impl RasterDriver for GdalDriver {
    fn name(&self) -> &str {
        GTIFF
    }

    fn write(&self, path: &Path, data: &RasterData, profile: &RasterProfile) -> Result<()> {
        profile.check(data)?;

        let driver = DriverManager::get_driver_by_name(GTIFF)?;
        self.ensure_codec(&driver, &profile.compression)?;

        let pairs = profile.compression.creation_options();
        let options: Vec<RasterCreationOption> = pairs
            .iter()
            .map(|(key, value)| RasterCreationOption {
                key: *key,
                value: value.as_str(),
            })
            .collect();

        let (width, height, bands) = (
            profile.width as isize,
            profile.height as isize,
            profile.count as isize,
        );
        let mut dataset = match data {
            RasterData::Byte(_) => driver
                .create_with_band_type_with_options::<u8, _>(path, width, height, bands, &options)?,
            RasterData::Int16(_) => driver
                .create_with_band_type_with_options::<i16, _>(path, width, height, bands, &options)?,
            RasterData::Float32(_) => driver
                .create_with_band_type_with_options::<f32, _>(path, width, height, bands, &options)?,
        };

        if let Some(transform) = profile.transform {
            dataset.set_geo_transform(&transform.to_gdal())?;
        }
        if let Some(epsg) = profile.crs {
            dataset.set_spatial_ref(&SpatialRef::from_epsg(u32::from(epsg))?)?;
        }

        // The dataset is flushed and closed when it drops at the end of this call
        match data {
            RasterData::Byte(samples) => write_bands(&dataset, samples, profile),
            RasterData::Int16(samples) => write_bands(&dataset, samples, profile),
            RasterData::Float32(samples) => write_bands(&dataset, samples, profile),
        }
    }

    fn read(&self, path: &Path) -> Result<(RasterData, RasterProfile)> {
        // Skip the sibling-file scan so only the tile itself is opened
        set_thread_local_config_option("GDAL_DISABLE_READDIR_ON_OPEN", "EMPTY_DIR")?;

        let dataset = Dataset::open_ex(
            path,
            DatasetOptions {
                open_flags: GdalOpenFlags::GDAL_OF_RASTER | GdalOpenFlags::GDAL_OF_READONLY,
                allowed_drivers: Some(&[GTIFF]),
                open_options: None,
                sibling_files: None,
            },
        )?;

        let (width, height) = dataset.raster_size();
        let count = u16::try_from(dataset.raster_count()).map_err(|_| {
            RasterBenchError::RasterError(format!("{} has too many bands", path.display()))
        })?;

        let mut data = read_band(&dataset.rasterband(1)?)?;
        for index in 2..=count {
            data.extend(read_band(&dataset.rasterband(index as isize)?)?)?;
        }

        let mut profile = RasterProfile::new(width as u32, height as u32, count, data.data_type());
        profile.transform = dataset.geo_transform().ok().and_then(north_up);
        profile.crs = dataset
            .spatial_ref()
            .ok()
            .and_then(|srs| srs.auth_code().ok())
            .and_then(|code| u16::try_from(code).ok());

        Ok((data, profile))
    }
}

fn write_bands<T: GdalType + Copy>(
    dataset: &Dataset,
    samples: &[T],
    profile: &RasterProfile,
) -> Result<()> {
    let size = (profile.width as usize, profile.height as usize);
    for (index, band_samples) in samples.chunks(profile.band_len()).enumerate() {
        let mut band = dataset.rasterband(index as isize + 1)?;
        band.write((0, 0), size, &Buffer::new(size, band_samples.to_vec()))?;
    }
    Ok(())
}

fn read_band(band: &RasterBand) -> Result<RasterData> {
    match band.band_type() {
        GdalDataType::UInt8 => Ok(RasterData::Byte(band.read_band_as::<u8>()?.data)),
        GdalDataType::Int16 => Ok(RasterData::Int16(band.read_band_as::<i16>()?.data)),
        GdalDataType::Float32 => Ok(RasterData::Float32(band.read_band_as::<f32>()?.data)),
        other => Err(RasterBenchError::RasterError(format!(
            "Unsupported band type {:?} (expected uint8, int16 or float32)",
            other
        ))),
    }
}

/// Rotated transforms cannot be represented and are dropped
fn north_up(coefficients: [f64; 6]) -> Option<GeoTransform> {
    if coefficients[2] != 0.0 || coefficients[4] != 0.0 {
        return None;
    }
    Some(GeoTransform::new(
        coefficients[0],
        coefficients[3],
        coefficients[1],
        -coefficients[5],
    ))
}
