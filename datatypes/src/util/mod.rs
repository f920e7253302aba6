pub mod gdal;
pub mod proj_projector;
mod result;

pub use result::Result;
