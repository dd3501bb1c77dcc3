//! Compression presets
//!
//! A [`CompressionOption`] names one codec configuration (compressor,
//! optional predictor, optional level). The default table mirrors the GDAL
//! GTiff creation options the benchmark compares.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::data_type::DataType;

/// Name of the uncompressed baseline option
pub const BASELINE_OPTION: &str = "none";

/// Compressor applied to raster strips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Codec {
    None,
    Packbits,
    Deflate,
    Lzma,
    Lzw,
    Zstd,
}

impl Codec {
    /// GDAL `COMPRESS` value, `None` for uncompressed output
    pub fn gdal_name(&self) -> Option<&'static str> {
        match self {
            Codec::None => None,
            Codec::Packbits => Some("PACKBITS"),
            Codec::Deflate => Some("DEFLATE"),
            Codec::Lzma => Some("LZMA"),
            Codec::Lzw => Some("LZW"),
            Codec::Zstd => Some("ZSTD"),
        }
    }

    /// Whether a predictor can be combined with this codec
    pub fn accepts_predictor(&self) -> bool {
        matches!(self, Codec::Deflate | Codec::Lzw | Codec::Zstd)
    }

    /// Valid compression level range, if the codec takes a level
    pub fn level_range(&self) -> Option<(u8, u8)> {
        match self {
            Codec::Deflate => Some((1, 9)),
            Codec::Zstd => Some((1, 22)),
            _ => None,
        }
    }

    /// Creation option key carrying the level
    pub fn level_key(&self) -> Option<&'static str> {
        match self {
            Codec::Deflate => Some("ZLEVEL"),
            Codec::Zstd => Some("ZSTD_LEVEL"),
            _ => None,
        }
    }
}

/// TIFF predictor applied before compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Predictor {
    /// Horizontal differencing (PREDICTOR=2)
    Horizontal,
    /// Floating point predictor (PREDICTOR=3), only valid for float data
    FloatingPoint,
}

impl Predictor {
    pub fn value(&self) -> u8 {
        match self {
            Predictor::Horizontal => 2,
            Predictor::FloatingPoint => 3,
        }
    }

    /// Whether the predictor can be applied to the given data type
    pub fn supports(&self, data_type: DataType) -> bool {
        match self {
            Predictor::Horizontal => true,
            Predictor::FloatingPoint => data_type.is_float(),
        }
    }
}

impl TryFrom<u8> for Predictor {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Predictor::Horizontal),
            3 => Ok(Predictor::FloatingPoint),
            other => Err(format!("Unknown predictor: {} (expected 2 or 3)", other)),
        }
    }
}

impl From<Predictor> for u8 {
    fn from(predictor: Predictor) -> Self {
        predictor.value()
    }
}

/// Named codec configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompressionOption {
    /// Option name, also the output directory name
    pub name: String,
    /// Compressor
    pub codec: Codec,
    /// Optional predictor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictor: Option<Predictor>,
    /// Optional compression level (ZLEVEL or ZSTD_LEVEL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

impl CompressionOption {
    pub fn new(name: &str, codec: Codec) -> Self {
        Self {
            name: name.to_string(),
            codec,
            predictor: None,
            level: None,
        }
    }

    pub fn with_predictor(mut self, predictor: Predictor) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    /// The uncompressed baseline every other option is compared against
    pub fn baseline() -> Self {
        Self::new(BASELINE_OPTION, Codec::None)
    }

    pub fn is_baseline(&self) -> bool {
        self.name == BASELINE_OPTION
    }

    /// Whether this option may be written for the given data type.
    ///
    /// The floating point predictor on integer data is rejected before any
    /// file is produced.
    pub fn supports(&self, data_type: DataType) -> bool {
        self.predictor
            .map(|predictor| predictor.supports(data_type))
            .unwrap_or(true)
    }

    /// GDAL-style creation options (`COMPRESS=DEFLATE`, `PREDICTOR=2`, ...)
    pub fn creation_options(&self) -> Vec<(&'static str, String)> {
        let mut options = Vec::new();
        if let Some(name) = self.codec.gdal_name() {
            options.push(("COMPRESS", name.to_string()));
        }
        if let Some(predictor) = self.predictor {
            options.push(("PREDICTOR", predictor.value().to_string()));
        }
        if let (Some(level), Some(key)) = (self.level, self.codec.level_key()) {
            options.push((key, level.to_string()));
        }
        options
    }
}

impl fmt::Display for CompressionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = self.creation_options();
        if options.is_empty() {
            return write!(f, "{} (uncompressed)", self.name);
        }
        let rendered: Vec<String> = options
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        write!(f, "{} ({})", self.name, rendered.join(", "))
    }
}

/// The default option table, baseline first
pub fn default_options() -> Vec<CompressionOption> {
    use Codec::*;
    use Predictor::*;

    vec![
        CompressionOption::baseline(),
        CompressionOption::new("packbits", Packbits),
        CompressionOption::new("deflate", Deflate),
        CompressionOption::new("deflate_pred2", Deflate).with_predictor(Horizontal),
        CompressionOption::new("deflate_pred3", Deflate).with_predictor(FloatingPoint),
        CompressionOption::new("deflate_zlev9", Deflate).with_level(9),
        CompressionOption::new("deflate_zlev1", Deflate).with_level(1),
        CompressionOption::new("deflate_zlev1_pred2", Deflate)
            .with_level(1)
            .with_predictor(Horizontal),
        CompressionOption::new("deflate_zlev1_pred3", Deflate)
            .with_level(1)
            .with_predictor(FloatingPoint),
        CompressionOption::new("lzma", Lzma),
        CompressionOption::new("lzw", Lzw),
        CompressionOption::new("lzw_pred2", Lzw).with_predictor(Horizontal),
        CompressionOption::new("lzw_pred3", Lzw).with_predictor(FloatingPoint),
        CompressionOption::new("zstd", Zstd),
        CompressionOption::new("zstd_pred2", Zstd).with_predictor(Horizontal),
        CompressionOption::new("zstd_pred3", Zstd).with_predictor(FloatingPoint),
        CompressionOption::new("zstd_zlev15", Zstd).with_level(15),
        CompressionOption::new("zstd_zlev1", Zstd).with_level(1),
        CompressionOption::new("zstd_zlev1_pred2", Zstd)
            .with_level(1)
            .with_predictor(Horizontal),
        CompressionOption::new("zstd_zlev1_pred3", Zstd)
            .with_level(1)
            .with_predictor(FloatingPoint),
    ]
}

/// Look up an option by name
pub fn find_option<'a>(options: &'a [CompressionOption], name: &str) -> Option<&'a CompressionOption> {
    options.iter().find(|option| option.name == name)
}
