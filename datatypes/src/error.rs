use snafu::Snafu;
use strum::IntoStaticStr;

use crate::primitives::Coordinate2D;
use crate::spatial_reference::SpatialReferenceDefinition;

#[derive(Debug, Snafu, IntoStaticStr)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))] // disables default `Snafu` suffix
pub enum Error {
    #[snafu(display("Geometry is not valid JSON: {source}"))]
    MalformedGeometry { source: serde_json::Error },

    #[snafu(display("Invalid geometry shape: {reason}"))]
    InvalidGeometryShape { reason: String },

    #[snafu(display(
        "Geometry type `{geometry_type}` is not supported, expected `Polygon` or `MultiPolygon`"
    ))]
    UnsupportedGeometryType { geometry_type: String },

    #[snafu(display("Coordinates cannot be built into a geometry: {reason}"))]
    GeometryParse { reason: String },

    #[snafu(display(
        "Geometry is invalid and cannot be repaired (before repair: {before}; after repair: {after})"
    ))]
    UnrepairableGeometry { before: String, after: String },

    #[snafu(display("No CoordinateProjector available for: {from} --> {to}"))]
    NoCoordinateProjector {
        from: SpatialReferenceDefinition,
        to: SpatialReferenceDefinition,
    },

    #[snafu(display("Coordinate {coordinate} cannot be projected from {from} to {to}"))]
    UnprojectableCoordinate {
        coordinate: Coordinate2D,
        from: SpatialReferenceDefinition,
        to: SpatialReferenceDefinition,
    },

    #[snafu(display("Spatial reference cannot be identified: {reason}"))]
    UnidentifiedSpatialReference { reason: String },

    #[snafu(display("Proj error: {source}"))]
    ProjInternal { source: proj::ProjError },

    #[snafu(display("InvalidSpatialReferenceString: {spatial_reference_string}"))]
    InvalidSpatialReferenceString { spatial_reference_string: String },

    #[snafu(display("ParseU32: {source}"))]
    ParseU32 {
        source: <u32 as std::str::FromStr>::Err,
    },

    #[snafu(display("GdalError: {source}"))]
    Gdal { source: gdal::errors::GdalError },

    #[snafu(display(
        "The conditions ll.x <= ur.x && ll.y <= ur.y are not met by ll:{lower_left_coordinate} ur:{upper_right_coordinate}"
    ))]
    InvalidBoundingBox {
        lower_left_coordinate: Coordinate2D,
        upper_right_coordinate: Coordinate2D,
    },

    #[snafu(display("Dimension capacity ≠ data capacity ({dimension_cap} ≠ {data_cap})"))]
    DimensionCapacityDoesNotMatchDataCapacity {
        dimension_cap: usize,
        data_cap: usize,
    },

    #[snafu(display("GeoTransform {geo_transform:?} is not invertible"))]
    NonInvertibleGeoTransform { geo_transform: [f64; 6] },

    #[snafu(display(
        "Pixel window {col_offset},{row_offset} ({width}x{height}) exceeds the grid of {grid_width}x{grid_height} pixels"
    ))]
    InvalidPixelWindow {
        col_offset: usize,
        row_offset: usize,
        width: usize,
        height: usize,
        grid_width: usize,
        grid_height: usize,
    },

    UnallowedEmpty,
    UnclosedPolygonRing,
}

impl From<proj::ProjError> for Error {
    fn from(source: proj::ProjError) -> Self {
        Error::ProjInternal { source }
    }
}

impl From<gdal::errors::GdalError> for Error {
    fn from(source: gdal::errors::GdalError) -> Self {
        Error::Gdal { source }
    }
}
