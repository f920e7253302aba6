mod data_type;
mod geo_transform;
mod grid;
mod macros_raster;
mod pixel_window;
mod typed_grid;

pub use self::data_type::{Pixel, RasterDataType, StaticRasterDataType};
pub use self::geo_transform::{GdalGeoTransform, GeoTransform};
pub use self::grid::{Grid2D, GridIdx2D, GridShape2D};
pub use self::pixel_window::{PixelWindow, WindowPlan, plan_window};
pub use self::typed_grid::TypedGrid2D;
