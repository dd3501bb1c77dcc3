//! Pixel data types under benchmark

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pixel storage type a raster is written with
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Unsigned 8-bit integer
    Byte,
    /// Signed 16-bit integer
    Int16,
    /// IEEE 754 single precision float
    Float32,
}

impl DataType {
    /// All data types in benchmark order
    pub const ALL: [DataType; 3] = [DataType::Byte, DataType::Int16, DataType::Float32];

    /// Name used for directories and report rows
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Byte => "byte",
            DataType::Int16 => "int16",
            DataType::Float32 => "float32",
        }
    }

    /// Concrete storage type the data type maps to
    pub fn storage_type(&self) -> &'static str {
        match self {
            DataType::Byte => "uint8",
            DataType::Int16 => "int16",
            DataType::Float32 => "float32",
        }
    }

    /// Size of one sample in bytes
    pub fn sample_size(&self) -> usize {
        match self {
            DataType::Byte => 1,
            DataType::Int16 => 2,
            DataType::Float32 => 4,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "byte" | "uint8" => Ok(DataType::Byte),
            "int16" => Ok(DataType::Int16),
            "float32" => Ok(DataType::Float32),
            other => Err(format!("Unknown data type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_storage_types() {
        assert_eq!(DataType::Byte.name(), "byte");
        assert_eq!(DataType::Byte.storage_type(), "uint8");
        assert_eq!(DataType::Int16.storage_type(), "int16");
        assert_eq!(DataType::Float32.to_string(), "float32");
    }

    #[test]
    fn test_only_float32_is_float() {
        assert!(!DataType::Byte.is_float());
        assert!(!DataType::Int16.is_float());
        assert!(DataType::Float32.is_float());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("uint8".parse::<DataType>().unwrap(), DataType::Byte);
        assert_eq!(" Float32 ".parse::<DataType>().unwrap(), DataType::Float32);
        assert!("float64".parse::<DataType>().is_err());
    }

    #[test]
    fn test_ordering_follows_benchmark_order() {
        let mut types = vec![DataType::Float32, DataType::Byte, DataType::Int16];
        types.sort();
        assert_eq!(types, DataType::ALL.to_vec());
    }
}
