use serde::Serialize;
use snafu::Snafu;
use std::path::PathBuf;
use strum::IntoStaticStr;
use valor_datatypes::primitives::Coordinate2D;

use crate::engine::QueryStage;

#[derive(Debug, Snafu, IntoStaticStr)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))] // disables default `Snafu` suffix
pub enum Error {
    #[snafu(display("{source}"))]
    DataType {
        source: valor_datatypes::error::Error,
    },

    #[snafu(display("Cannot open raster `{}`: {source}", path.display()))]
    RasterOpen {
        path: PathBuf,
        source: valor_datatypes::error::Error,
    },

    #[snafu(display("Raster `{}` has no bands", path.display()))]
    NoRasterBand { path: PathBuf },

    #[snafu(display("Raster band type {gdal_data_type} is not supported"))]
    UnsupportedRasterType { gdal_data_type: String },

    #[snafu(display("Raster metadata is unusable: {source}"))]
    InvalidRasterMetadata {
        source: valor_datatypes::error::Error,
    },

    #[snafu(display("GdalError: {source}"))]
    Gdal { source: gdal::errors::GdalError },

    #[snafu(display("Coordinate {coordinate} has no finite pixel position"))]
    UnrasterizableCoordinate { coordinate: Coordinate2D },

    #[snafu(display("Mask of {mask_width}x{mask_height} pixels does not match data of {data_width}x{data_height} pixels"))]
    MaskShapeMismatch {
        mask_width: usize,
        mask_height: usize,
        data_width: usize,
        data_height: usize,
    },
}

impl From<valor_datatypes::error::Error> for Error {
    fn from(datatype_error: valor_datatypes::error::Error) -> Self {
        Self::DataType {
            source: datatype_error,
        }
    }
}

impl From<gdal::errors::GdalError> for Error {
    fn from(gdal_error: gdal::errors::GdalError) -> Self {
        Self::Gdal { source: gdal_error }
    }
}

/// The client-facing classification of a failed query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IntoStaticStr, strum::Display)]
pub enum ErrorKind {
    MalformedGeometry,
    InvalidGeometryShape,
    UnsupportedGeometryType,
    GeometryParseError,
    UnrepairableGeometry,
    ReprojectionError,
    RasterAccessError,
}

/// An error together with the query stage it occurred in
#[derive(Debug)]
pub struct QueryError {
    pub stage: QueryStage,
    pub source: Error,
}

impl QueryError {
    pub fn new(stage: QueryStage, source: impl Into<Error>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        use valor_datatypes::error::Error as DataTypeError;

        if let Error::DataType { source } = &self.source {
            match source {
                DataTypeError::MalformedGeometry { .. } => return ErrorKind::MalformedGeometry,
                DataTypeError::InvalidGeometryShape { .. } => {
                    return ErrorKind::InvalidGeometryShape;
                }
                DataTypeError::UnsupportedGeometryType { .. } => {
                    return ErrorKind::UnsupportedGeometryType;
                }
                DataTypeError::GeometryParse { .. } => return ErrorKind::GeometryParseError,
                DataTypeError::UnrepairableGeometry { .. } => {
                    return ErrorKind::UnrepairableGeometry;
                }
                _ => {}
            }
        }

        match self.stage {
            QueryStage::Normalize => ErrorKind::InvalidGeometryShape,
            QueryStage::Validate => ErrorKind::GeometryParseError,
            QueryStage::Reproject => ErrorKind::ReprojectionError,
            QueryStage::Window | QueryStage::Rasterize | QueryStage::Compute | QueryStage::Read => {
                ErrorKind::RasterAccessError
            }
        }
    }
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.source)
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Attaches a `QueryStage` to the error of a `Result`
pub trait AtStage<T> {
    fn at_stage(self, stage: QueryStage) -> Result<T, QueryError>;
}

impl<T, E> AtStage<T> for Result<T, E>
where
    E: Into<Error>,
{
    fn at_stage(self, stage: QueryStage) -> Result<T, QueryError> {
        self.map_err(|source| QueryError::new(stage, source))
    }
}
