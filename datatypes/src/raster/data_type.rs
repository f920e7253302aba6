use gdal::raster::{GdalDataType, GdalType};
use num_traits::{AsPrimitive, NumCast};
use serde::{Deserialize, Serialize};

/// A collection of required traits for a pixel type
pub trait Pixel:
    'static
    + Copy
    + std::fmt::Debug
    + Sync
    + Send
    + PartialEq
    + PartialOrd
    + AsPrimitive<f64>
    + NumCast
    + GdalType
    + StaticRasterDataType
{
}

impl Pixel for u8 {}
impl Pixel for u16 {}
impl Pixel for i16 {}
impl Pixel for u32 {}
impl Pixel for i32 {}
impl Pixel for f32 {}
impl Pixel for f64 {}

/// The pixel types a raster band is read as.
///
/// Bands of other integer types are widened to the closest variant that can hold every value.
#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize, Serialize, Copy, Clone)]
pub enum RasterDataType {
    U8,
    U16,
    U32,
    I16,
    I32,
    F32,
    F64,
}

impl RasterDataType {
    /// Maps the band type reported by GDAL, `None` for complex or unknown types
    pub fn from_gdal_data_type(gdal_data_type: GdalDataType) -> Option<Self> {
        Some(match gdal_data_type {
            GdalDataType::UInt8 => Self::U8,
            GdalDataType::UInt16 => Self::U16,
            GdalDataType::Int16 => Self::I16,
            GdalDataType::UInt32 => Self::U32,
            GdalDataType::Int32 => Self::I32,
            GdalDataType::Float32 => Self::F32,
            GdalDataType::Float64 => Self::F64,
            GdalDataType::Unknown => return None,
            // signed bytes and 64 bit integers
            other if other.is_integer() && other.bits() <= 8 => Self::I16,
            other if other.is_integer() => Self::F64,
            _ => return None,
        })
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::F32 | Self::F64)
    }
}

impl std::fmt::Display for RasterDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

pub trait StaticRasterDataType: Copy + Default + 'static {
    const TYPE: RasterDataType;
}

impl StaticRasterDataType for u8 {
    const TYPE: RasterDataType = RasterDataType::U8;
}

impl StaticRasterDataType for u16 {
    const TYPE: RasterDataType = RasterDataType::U16;
}

impl StaticRasterDataType for u32 {
    const TYPE: RasterDataType = RasterDataType::U32;
}

impl StaticRasterDataType for i16 {
    const TYPE: RasterDataType = RasterDataType::I16;
}

impl StaticRasterDataType for i32 {
    const TYPE: RasterDataType = RasterDataType::I32;
}

impl StaticRasterDataType for f32 {
    const TYPE: RasterDataType = RasterDataType::F32;
}

impl StaticRasterDataType for f64 {
    const TYPE: RasterDataType = RasterDataType::F64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gdal_mapping() {
        assert_eq!(
            RasterDataType::from_gdal_data_type(GdalDataType::UInt8),
            Some(RasterDataType::U8)
        );
        assert_eq!(
            RasterDataType::from_gdal_data_type(GdalDataType::Float32),
            Some(RasterDataType::F32)
        );
        assert_eq!(
            RasterDataType::from_gdal_data_type(GdalDataType::Int16),
            Some(RasterDataType::I16)
        );
        assert_eq!(RasterDataType::from_gdal_data_type(GdalDataType::Unknown), None);
    }

    #[test]
    fn static_types() {
        assert_eq!(<u8 as StaticRasterDataType>::TYPE, RasterDataType::U8);
        assert_eq!(<f64 as StaticRasterDataType>::TYPE, RasterDataType::F64);
        assert!(RasterDataType::I16.is_integer());
        assert!(!RasterDataType::F32.is_integer());
    }
}
