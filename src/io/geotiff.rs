//! GeoTIFF georeferencing tags
//!
//! Writes and reads the GeoTIFF tags the benchmark preserves: pixel scale,
//! tie point and a minimal GeoKey directory carrying the EPSG code.

use std::io::{Read, Seek, Write};

use tiff::decoder::Decoder;
use tiff::encoder::{DirectoryEncoder, TiffKind};
use tiff::tags::Tag;

use crate::models::raster::{GeoTransform, RasterProfile};
use crate::Result;

// GeoTIFF Tag IDs (not in standard tiff crate)
const GEOTIFF_MODELPIXELSCALE: u16 = 33550;
const GEOTIFF_MODELTIEPOINT: u16 = 33922;
const GEOTIFF_GEOKEYDIRECTORY: u16 = 34735;

// GeoKey IDs
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

// GeoKey values
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// EPSG codes in the 4000 range are geographic coordinate systems
fn is_geographic(epsg: u16) -> bool {
    (4000..5000).contains(&epsg)
}

/// Write georeferencing tags for the profile into the current directory
pub fn write_geo_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<W, K>,
    profile: &RasterProfile,
) -> Result<()> {
    if let Some(transform) = profile.transform {
        let pixel_scale = [transform.pixel_width, transform.pixel_height, 0.0];
        dir.write_tag(Tag::Unknown(GEOTIFF_MODELPIXELSCALE), pixel_scale.as_slice())?;

        // Ties pixel (0, 0) to the upper-left corner
        let tiepoint = [0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0];
        dir.write_tag(Tag::Unknown(GEOTIFF_MODELTIEPOINT), tiepoint.as_slice())?;
    }

    if let Some(epsg) = profile.crs {
        let geokeys = build_geokey_directory(epsg);
        dir.write_tag(Tag::Unknown(GEOTIFF_GEOKEYDIRECTORY), geokeys.as_slice())?;
    }

    Ok(())
}

/// GeoKeyDirectory layout:
/// `[version, revision, minor, key count, (key id, location, count, value)*]`
fn build_geokey_directory(epsg: u16) -> Vec<u16> {
    let geographic = is_geographic(epsg);
    let model_type = if geographic {
        MODEL_TYPE_GEOGRAPHIC
    } else {
        MODEL_TYPE_PROJECTED
    };
    let crs_key = if geographic {
        GEOGRAPHIC_TYPE_GEO_KEY
    } else {
        PROJECTED_CS_TYPE_GEO_KEY
    };

    vec![
        1, 1, 0, 3,
        GT_MODEL_TYPE_GEO_KEY, 0, 1, model_type,
        GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA,
        crs_key, 0, 1, epsg,
    ]
}

/// EPSG code stored inline in a GeoKey directory
fn parse_geokey_directory(keys: &[u16]) -> Option<u16> {
    if keys.len() < 4 {
        return None;
    }
    let count = keys[3] as usize;
    keys[4..]
        .chunks_exact(4)
        .take(count)
        .find(|entry| {
            (entry[0] == PROJECTED_CS_TYPE_GEO_KEY || entry[0] == GEOGRAPHIC_TYPE_GEO_KEY)
                && entry[1] == 0
        })
        .map(|entry| entry[3])
}

/// Read the geo transform and EPSG code of the current image directory
pub fn read_geo_tags<R: Read + Seek>(
    decoder: &mut Decoder<R>,
) -> Result<(Option<GeoTransform>, Option<u16>)> {
    let scale = match decoder.find_tag(Tag::Unknown(GEOTIFF_MODELPIXELSCALE))? {
        Some(value) => Some(value.into_f64_vec()?),
        None => None,
    };
    let tiepoint = match decoder.find_tag(Tag::Unknown(GEOTIFF_MODELTIEPOINT))? {
        Some(value) => Some(value.into_f64_vec()?),
        None => None,
    };

    let transform = match (scale, tiepoint) {
        (Some(scale), Some(tie)) if scale.len() >= 2 && tie.len() >= 6 => Some(GeoTransform::new(
            tie[3] - tie[0] * scale[0],
            tie[4] + tie[1] * scale[1],
            scale[0],
            scale[1],
        )),
        _ => None,
    };

    let crs = decoder
        .find_tag_unsigned_vec::<u16>(Tag::Unknown(GEOTIFF_GEOKEYDIRECTORY))?
        .and_then(|keys| parse_geokey_directory(&keys));

    Ok((transform, crs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geokey_directory_projected() {
        let geokeys = build_geokey_directory(32610);

        assert_eq!(&geokeys[..4], &[1, 1, 0, 3]);
        assert_eq!(geokeys[4], GT_MODEL_TYPE_GEO_KEY);
        assert_eq!(geokeys[7], MODEL_TYPE_PROJECTED);
        assert_eq!(geokeys[12], PROJECTED_CS_TYPE_GEO_KEY);
        assert_eq!(geokeys[15], 32610);
    }

    #[test]
    fn test_geokey_directory_geographic() {
        let geokeys = build_geokey_directory(4326);

        assert_eq!(geokeys[7], MODEL_TYPE_GEOGRAPHIC);
        assert_eq!(geokeys[12], GEOGRAPHIC_TYPE_GEO_KEY);
        assert_eq!(geokeys[15], 4326);
    }

    #[test]
    fn test_parse_geokey_directory() {
        assert_eq!(parse_geokey_directory(&build_geokey_directory(32630)), Some(32630));
        assert_eq!(parse_geokey_directory(&build_geokey_directory(4326)), Some(4326));
        assert_eq!(parse_geokey_directory(&[1, 1, 0]), None);
        // Model type only, no CRS key
        assert_eq!(parse_geokey_directory(&[1, 1, 0, 1, 1024, 0, 1, 1]), None);
    }
}
