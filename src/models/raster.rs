//! Raster sample data and metadata

use serde::{Deserialize, Serialize};

use crate::models::compression::CompressionOption;
use crate::models::data_type::DataType;
use crate::{RasterBenchError, Result};

/// Pixel samples in band-sequential order (bands x height x width)
#[derive(Debug, Clone, PartialEq)]
pub enum RasterData {
    Byte(Vec<u8>),
    Int16(Vec<i16>),
    Float32(Vec<f32>),
}

impl RasterData {
    pub fn data_type(&self) -> DataType {
        match self {
            RasterData::Byte(_) => DataType::Byte,
            RasterData::Int16(_) => DataType::Int16,
            RasterData::Float32(_) => DataType::Float32,
        }
    }

    /// Number of samples across all bands
    pub fn len(&self) -> usize {
        match self {
            RasterData::Byte(v) => v.len(),
            RasterData::Int16(v) => v.len(),
            RasterData::Float32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the raw samples in bytes
    pub fn byte_len(&self) -> usize {
        self.len() * self.data_type().sample_size()
    }

    /// Coerce the samples to another data type.
    ///
    /// Narrowing conversions saturate at the target range; NaN becomes zero.
    pub fn cast(&self, target: DataType) -> RasterData {
        if self.data_type() == target {
            return self.clone();
        }

        match target {
            DataType::Byte => RasterData::Byte(match self {
                RasterData::Byte(v) => v.clone(),
                RasterData::Int16(v) => v.iter().map(|&x| x.clamp(0, u8::MAX as i16) as u8).collect(),
                RasterData::Float32(v) => v.iter().map(|&x| x as u8).collect(),
            }),
            DataType::Int16 => RasterData::Int16(match self {
                RasterData::Byte(v) => v.iter().map(|&x| x as i16).collect(),
                RasterData::Int16(v) => v.clone(),
                RasterData::Float32(v) => v.iter().map(|&x| x as i16).collect(),
            }),
            DataType::Float32 => RasterData::Float32(match self {
                RasterData::Byte(v) => v.iter().map(|&x| x as f32).collect(),
                RasterData::Int16(v) => v.iter().map(|&x| x as f32).collect(),
                RasterData::Float32(v) => v.clone(),
            }),
        }
    }

    /// Append another band block of the same data type
    pub fn extend(&mut self, other: RasterData) -> Result<()> {
        match (self, other) {
            (RasterData::Byte(a), RasterData::Byte(b)) => a.extend(b),
            (RasterData::Int16(a), RasterData::Int16(b)) => a.extend(b),
            (RasterData::Float32(a), RasterData::Float32(b)) => a.extend(b),
            (this, other) => {
                return Err(RasterBenchError::RasterError(format!(
                    "Cannot mix {} and {} bands in one raster",
                    this.data_type(),
                    other.data_type()
                )))
            }
        }
        Ok(())
    }
}

/// North-up affine transform (no rotation terms)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// World X of the upper-left corner
    pub origin_x: f64,
    /// World Y of the upper-left corner
    pub origin_y: f64,
    /// Pixel width in world units
    pub pixel_width: f64,
    /// Pixel height in world units (positive, rows grow southwards)
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// GDAL coefficient order: `[x0, dx, 0, y0, 0, -dy]`
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            -self.pixel_height,
        ]
    }
}

/// Raster metadata that accompanies the pixel data on write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterProfile {
    /// Output driver name
    pub driver: String,
    pub width: u32,
    pub height: u32,
    /// Number of bands
    pub count: u16,
    pub dtype: DataType,
    /// EPSG code of the coordinate reference system
    pub crs: Option<u16>,
    pub transform: Option<GeoTransform>,
    /// Compression applied on write
    pub compression: CompressionOption,
}

impl RasterProfile {
    pub fn new(width: u32, height: u32, count: u16, dtype: DataType) -> Self {
        Self {
            driver: "GTiff".to_string(),
            width,
            height,
            count,
            dtype,
            crs: None,
            transform: None,
            compression: CompressionOption::baseline(),
        }
    }

    pub fn with_crs(mut self, epsg: u16) -> Self {
        self.crs = Some(epsg);
        self
    }

    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Samples in a single band
    pub fn band_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Samples across all bands
    pub fn sample_count(&self) -> usize {
        self.band_len() * self.count as usize
    }

    /// Merge the base profile with a compression option and output data type
    pub fn merged(&self, dtype: DataType, compression: &CompressionOption) -> RasterProfile {
        RasterProfile {
            dtype,
            compression: compression.clone(),
            ..self.clone()
        }
    }

    /// Check that pixel data matches the declared shape and type
    pub fn check(&self, data: &RasterData) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.count == 0 {
            return Err(RasterBenchError::RasterError(format!(
                "Raster has zero dimensions: {}x{}x{}",
                self.count, self.height, self.width
            )));
        }
        if data.data_type() != self.dtype {
            return Err(RasterBenchError::RasterError(format!(
                "Pixel data is {} but profile declares {}",
                data.data_type(),
                self.dtype
            )));
        }
        if data.len() != self.sample_count() {
            return Err(RasterBenchError::RasterError(format!(
                "Expected {} samples ({} bands of {}x{}), got {}",
                self.sample_count(),
                self.count,
                self.width,
                self.height,
                data.len()
            )));
        }
        Ok(())
    }
}

/// One raster sample from the dataset source
#[derive(Debug, Clone)]
pub struct Datapoint {
    pub id: String,
    pub data: RasterData,
    pub profile: RasterProfile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::compression::Codec;

    #[test]
    fn test_cast_saturates() {
        let data = RasterData::Float32(vec![-5.0, 12.7, 300.0, f32::NAN]);
        assert_eq!(data.cast(DataType::Byte), RasterData::Byte(vec![0, 12, 255, 0]));
        assert_eq!(
            data.cast(DataType::Int16),
            RasterData::Int16(vec![-5, 12, 300, 0])
        );

        let ints = RasterData::Int16(vec![-1, 128, 1000]);
        assert_eq!(ints.cast(DataType::Byte), RasterData::Byte(vec![0, 128, 255]));
        assert_eq!(
            ints.cast(DataType::Float32),
            RasterData::Float32(vec![-1.0, 128.0, 1000.0])
        );
    }

    #[test]
    fn test_byte_len() {
        assert_eq!(RasterData::Int16(vec![0; 10]).byte_len(), 20);
        assert_eq!(RasterData::Float32(vec![0.0; 10]).byte_len(), 40);
    }

    #[test]
    fn test_extend_rejects_mixed_types() {
        let mut data = RasterData::Byte(vec![1, 2]);
        data.extend(RasterData::Byte(vec![3])).unwrap();
        assert_eq!(data, RasterData::Byte(vec![1, 2, 3]));
        assert!(data.extend(RasterData::Int16(vec![4])).is_err());
    }

    #[test]
    fn test_profile_merge_and_check() {
        let base = RasterProfile::new(4, 2, 3, DataType::Float32).with_crs(32630);
        let option = CompressionOption::new("lzw", Codec::Lzw);
        let merged = base.merged(DataType::Int16, &option);

        assert_eq!(merged.dtype, DataType::Int16);
        assert_eq!(merged.compression.name, "lzw");
        assert_eq!(merged.crs, Some(32630));
        assert_eq!(merged.sample_count(), 24);

        assert!(merged.check(&RasterData::Int16(vec![0; 24])).is_ok());
        assert!(merged.check(&RasterData::Int16(vec![0; 23])).is_err());
        assert!(merged.check(&RasterData::Byte(vec![0; 24])).is_err());
    }

    #[test]
    fn test_geo_transform_gdal_order() {
        let transform = GeoTransform::new(500000.0, 4100000.0, 10.0, 10.0);
        assert_eq!(transform.to_gdal(), [500000.0, 10.0, 0.0, 4100000.0, 0.0, -10.0]);
    }
}
