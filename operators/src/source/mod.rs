mod gdal_source;

pub use gdal_source::{
    GdalRasterSource, MaskKind, RasterDescriptor, RasterWindowData, cast_no_data_value, valid_value,
};

use valor_datatypes::raster::PixelWindow;

use crate::util::Result;

/// Windowed read access to the first band of a raster
pub trait WindowReader {
    fn descriptor(&self) -> &RasterDescriptor;

    fn read_window(&self, window: &PixelWindow) -> Result<RasterWindowData>;
}
