//! Raster driver abstraction
//!
//! The benchmark pipelines only select compression knobs; encoding and
//! decoding happen behind [`RasterDriver`]. [`TiffDriver`] is the pure Rust
//! implementation on top of the `tiff` crate; builds with the `gdal` feature
//! default to the GDAL driver instead.

use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::{Gray32Float, Gray8, GrayI16};
use tiff::encoder::{Compression, DeflateLevel, TiffEncoder};
use tiff::tags::Predictor as TiffPredictor;

use crate::io::geotiff::{read_geo_tags, write_geo_tags};
use crate::models::compression::{Codec, CompressionOption, Predictor};
use crate::models::data_type::DataType;
use crate::models::raster::{RasterData, RasterProfile};
use crate::{RasterBenchError, Result};

/// Encodes and decodes raster files
pub trait RasterDriver: Send + Sync {
    /// Driver name used in log lines and skip reasons
    fn name(&self) -> &str;

    /// Write the full pixel array to `path` using the profile's compression
    fn write(&self, path: &Path, data: &RasterData, profile: &RasterProfile) -> Result<()>;

    /// Read a raster file back into memory
    fn read(&self, path: &Path) -> Result<(RasterData, RasterProfile)>;
}

/// Driver the pipelines and catalog use unless given another one
pub fn default_driver() -> Box<dyn RasterDriver> {
    #[cfg(feature = "gdal")]
    {
        Box::new(crate::io::gdal_driver::GdalDriver::new())
    }
    #[cfg(not(feature = "gdal"))]
    {
        Box::new(TiffDriver::new())
    }
}

/// GeoTIFF driver backed by the `tiff` crate.
///
/// Each band is stored as its own grayscale image directory; georeferencing
/// tags go on the first directory only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffDriver;

impl TiffDriver {
    pub fn new() -> Self {
        Self
    }

    /// Map a compression option onto the encoder's settings
    fn encoder_settings(
        &self,
        option: &CompressionOption,
        dtype: DataType,
    ) -> Result<(Compression, TiffPredictor)> {
        let compression = match option.codec {
            Codec::None => Compression::Uncompressed,
            Codec::Packbits => Compression::Packbits,
            Codec::Lzw => Compression::Lzw,
            Codec::Deflate => Compression::Deflate(deflate_level(option.level)),
            Codec::Zstd | Codec::Lzma => {
                return Err(RasterBenchError::UnsupportedOption(format!(
                    "{} compression is not available",
                    option.codec.gdal_name().unwrap_or("unknown")
                )))
            }
        };

        let predictor = match option.predictor {
            None => TiffPredictor::None,
            Some(Predictor::Horizontal) if !dtype.is_float() => TiffPredictor::Horizontal,
            Some(predictor) => {
                return Err(RasterBenchError::UnsupportedOption(format!(
                    "predictor {} is not available for {} data",
                    predictor.value(),
                    dtype
                )))
            }
        };

        Ok((compression, predictor))
    }

    fn encode<W: Write + Seek>(
        &self,
        writer: W,
        data: &RasterData,
        profile: &RasterProfile,
        compression: Compression,
        predictor: TiffPredictor,
    ) -> Result<()> {
        let mut encoder = TiffEncoder::new(writer)?
            .with_compression(compression)
            .with_predictor(predictor);

        let (width, height) = (profile.width, profile.height);
        let band_len = profile.band_len();

        for band in 0..profile.count as usize {
            let range = band * band_len..(band + 1) * band_len;
            match data {
                RasterData::Byte(samples) => {
                    let mut image = encoder.new_image::<Gray8>(width, height)?;
                    if band == 0 {
                        write_geo_tags(image.encoder(), profile)?;
                    }
                    image.write_data(&samples[range])?;
                }
                RasterData::Int16(samples) => {
                    let mut image = encoder.new_image::<GrayI16>(width, height)?;
                    if band == 0 {
                        write_geo_tags(image.encoder(), profile)?;
                    }
                    image.write_data(&samples[range])?;
                }
                RasterData::Float32(samples) => {
                    let mut image = encoder.new_image::<Gray32Float>(width, height)?;
                    if band == 0 {
                        write_geo_tags(image.encoder(), profile)?;
                    }
                    image.write_data(&samples[range])?;
                }
            }
        }

        Ok(())
    }
}

/// ZLEVEL 1-3 is fast, 7-9 is best, anything else is the balanced default
fn deflate_level(level: Option<u8>) -> DeflateLevel {
    match level {
        Some(1..=3) => DeflateLevel::Fast,
        Some(7..=9) => DeflateLevel::Best,
        _ => DeflateLevel::Balanced,
    }
}

impl RasterDriver for TiffDriver {
    fn name(&self) -> &str {
        "GTiff"
    }

    fn write(&self, path: &Path, data: &RasterData, profile: &RasterProfile) -> Result<()> {
        // Reject before creating the file so nothing is left behind
        let (compression, predictor) = self.encoder_settings(&profile.compression, profile.dtype)?;
        profile.check(data)?;

        let mut writer = BufWriter::new(File::create(path)?);
        self.encode(&mut writer, data, profile, compression, predictor)?;
        writer.flush()?;
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<(RasterData, RasterProfile)> {
        let reader = BufReader::new(File::open(path)?);
        let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions()?;
        let (transform, crs) = read_geo_tags(&mut decoder)?;

        let mut data = decode_band(&mut decoder)?;
        let mut count: u16 = 1;

        while decoder.more_images() {
            decoder.next_image()?;
            if decoder.dimensions()? != (width, height) {
                return Err(RasterBenchError::RasterError(format!(
                    "Band {} of {} does not match the first band's dimensions",
                    count + 1,
                    path.display()
                )));
            }
            data.extend(decode_band(&mut decoder)?)?;
            count += 1;
        }

        let mut profile = RasterProfile::new(width, height, count, data.data_type());
        profile.crs = crs;
        profile.transform = transform;

        Ok((data, profile))
    }
}

fn decode_band<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> Result<RasterData> {
    match decoder.read_image()? {
        DecodingResult::U8(samples) => Ok(RasterData::Byte(samples)),
        DecodingResult::I16(samples) => Ok(RasterData::Int16(samples)),
        DecodingResult::F32(samples) => Ok(RasterData::Float32(samples)),
        _ => Err(RasterBenchError::RasterError(
            "Unsupported sample format (expected uint8, int16 or float32)".to_string(),
        )),
    }
}
