//! Deterministic synthetic imagery

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::models::data_type::DataType;
use crate::models::raster::{Datapoint, GeoTransform, RasterData, RasterProfile};
use crate::source::{CatalogEntry, DatasetSource};
use crate::{RasterBenchError, Result};

/// UTM zone 30N
const SYNTHETIC_EPSG: u16 = 32630;
const PIXEL_SIZE: f64 = 10.0;

/// Generates smooth reflectance-like gradients with bounded noise.
///
/// The same seed always yields the same datapoints, so synthetic runs can be
/// repeated and compared.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    count: usize,
    width: u32,
    height: u32,
    bands: u16,
    seed: u64,
}

impl SyntheticSource {
    pub fn new(count: usize, width: u32, height: u32, bands: u16, seed: u64) -> Self {
        Self {
            count,
            width,
            height,
            bands,
            seed,
        }
    }

    fn generate(&self, index: usize) -> Vec<f32> {
        let mut rng = SmallRng::seed_from_u64(self.seed.wrapping_add(index as u64));
        let (width, height) = (self.width as usize, self.height as usize);
        let mut samples = Vec::with_capacity(width * height * self.bands as usize);

        for band in 0..self.bands as usize {
            let base = 400.0 + 350.0 * band as f32;
            let slope_x: f32 = rng.gen_range(0.5..4.0);
            let slope_y: f32 = rng.gen_range(0.5..4.0);
            for row in 0..height {
                for col in 0..width {
                    let gradient = slope_x * col as f32 + slope_y * row as f32;
                    let noise: f32 = rng.gen_range(-25.0..25.0);
                    samples.push((base + gradient + noise).max(0.0));
                }
            }
        }

        samples
    }
}

impl DatasetSource for SyntheticSource {
    fn describe(&self) -> String {
        format!(
            "synthetic ({} x {}x{}x{}, seed {})",
            self.count, self.bands, self.height, self.width, self.seed
        )
    }

    fn catalog(&self) -> Result<Vec<CatalogEntry>> {
        Ok((0..self.count)
            .map(|index| CatalogEntry {
                index,
                datapoint_id: format!("synthetic_{:04}", index),
                path: None,
            })
            .collect())
    }

    fn load(&self, entry: &CatalogEntry) -> Result<Datapoint> {
        if entry.index >= self.count {
            return Err(RasterBenchError::CatalogError(format!(
                "synthetic datapoint {} is out of range (count {})",
                entry.datapoint_id, self.count
            )));
        }

        let origin_x = 500_000.0 + entry.index as f64 * self.width as f64 * PIXEL_SIZE;
        let profile = RasterProfile::new(self.width, self.height, self.bands, DataType::Float32)
            .with_crs(SYNTHETIC_EPSG)
            .with_transform(GeoTransform::new(origin_x, 4_500_000.0, PIXEL_SIZE, PIXEL_SIZE));

        Ok(Datapoint {
            id: entry.datapoint_id.clone(),
            data: RasterData::Float32(self.generate(entry.index)),
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids() {
        let source = SyntheticSource::new(3, 8, 8, 1, 7);
        let ids: Vec<_> = source
            .catalog()
            .unwrap()
            .into_iter()
            .map(|e| e.datapoint_id)
            .collect();
        assert_eq!(ids, vec!["synthetic_0000", "synthetic_0001", "synthetic_0002"]);
    }

    #[test]
    fn test_load_is_deterministic() {
        let source = SyntheticSource::new(2, 16, 4, 3, 42);
        let entries = source.catalog().unwrap();

        let first = source.load(&entries[1]).unwrap();
        let second = source.load(&entries[1]).unwrap();
        assert_eq!(first.data, second.data);
        assert_ne!(first.data, source.load(&entries[0]).unwrap().data);

        assert!(first.profile.check(&first.data).is_ok());
        assert_eq!(first.profile.crs, Some(SYNTHETIC_EPSG));
        assert!(matches!(&first.data, RasterData::Float32(v) if v.iter().all(|&x| x >= 0.0)));
    }

    #[test]
    fn test_load_out_of_range() {
        let source = SyntheticSource::new(1, 4, 4, 1, 0);
        let entry = CatalogEntry {
            index: 5,
            datapoint_id: "synthetic_0005".to_string(),
            path: None,
        };
        assert!(matches!(source.load(&entry), Err(RasterBenchError::CatalogError(_))));
    }
}
