use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::IntoStaticStr;

/// The processing stages of a query, reported with errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QueryStage {
    Normalize,
    Validate,
    Reproject,
    Window,
    Rasterize,
    Compute,
    Read,
}

impl std::fmt::Display for QueryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &'static str = self.into();
        f.write_str(name)
    }
}

/// How zonal statistics are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZonalStrategy {
    /// Rasterize and read only the pixels of the geometry's bounding box
    #[default]
    Windowed,
    /// Rasterize and read the whole band
    WholeGrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZonalSettings {
    pub strategy: ZonalStrategy,
    /// Recompute windowed results over the whole grid and report differences
    pub verify_strategies: bool,
}

/// Everything a single query needs to know about its environment.
///
/// The raster is opened by every query that uses this context and closed when the query ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    raster_path: PathBuf,
    zonal: ZonalSettings,
}

impl QueryContext {
    pub fn new(raster_path: impl Into<PathBuf>, zonal: ZonalSettings) -> Self {
        Self {
            raster_path: raster_path.into(),
            zonal,
        }
    }

    pub fn raster_path(&self) -> &Path {
        &self.raster_path
    }

    pub fn zonal(&self) -> ZonalSettings {
        self.zonal
    }

    #[must_use]
    pub fn with_zonal(mut self, zonal: ZonalSettings) -> Self {
        self.zonal = zonal;
        self
    }
}
