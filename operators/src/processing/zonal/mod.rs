//! Zonal statistics: the mean of all raster pixels whose centre lies inside a polygon.
//!
//! The query runs in stages (normalize, validate, reproject, window, rasterize, read, compute).
//! The default strategy rasterizes and reads only the pixel window around the geometry.
//! If it fails, the query is answered with the whole-grid strategy instead.

mod aggregator;
mod rasterizer;

pub use aggregator::{Aggregate, MeanValueAggregator, aggregate};
pub use rasterizer::MaskRasterizer;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use valor_datatypes::operations::normalize::normalize_geometry;
use valor_datatypes::operations::repair::{ValidatedGeometry, validate_geometry};
use valor_datatypes::operations::reproject::RasterProjection;
use valor_datatypes::primitives::MultiPolygon;
use valor_datatypes::raster::{PixelWindow, WindowPlan, plan_window};

use crate::engine::{QueryContext, QueryStage, ZonalSettings, ZonalStrategy};
use crate::error::{AtStage, QueryError};
use crate::source::{GdalRasterSource, WindowReader};

/// Why a zonal query selected no pixel with data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoCoverageReason {
    EmptyGeometry,
    OutsideRaster,
    EmptyWindow,
    EmptyMask,
    AllNoData,
}

impl NoCoverageReason {
    pub fn description(self) -> &'static str {
        match self {
            NoCoverageReason::EmptyGeometry => "geometry is empty",
            NoCoverageReason::OutsideRaster => "geometry does not intersect the raster",
            NoCoverageReason::EmptyWindow => "geometry covers no pixel of the raster",
            NoCoverageReason::EmptyMask => "no pixel centre lies inside the geometry",
            NoCoverageReason::AllNoData => "all covered pixels are NoData",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZonalOutcome {
    Covered { mean: f64, count: usize },
    NoCoverage(NoCoverageReason),
}

impl ZonalOutcome {
    fn from_aggregate(aggregate: Aggregate) -> Self {
        match aggregate.mean {
            Some(mean) if aggregate.count > 0 => ZonalOutcome::Covered {
                mean,
                count: aggregate.count,
            },
            _ if aggregate.covered == 0 => ZonalOutcome::NoCoverage(NoCoverageReason::EmptyMask),
            _ => ZonalOutcome::NoCoverage(NoCoverageReason::AllNoData),
        }
    }

    pub fn mean(&self) -> Option<f64> {
        match self {
            ZonalOutcome::Covered { mean, .. } => Some(*mean),
            ZonalOutcome::NoCoverage(_) => None,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            ZonalOutcome::Covered { count, .. } => *count,
            ZonalOutcome::NoCoverage(_) => 0,
        }
    }

    /// Both outcomes report the same statistics
    fn agrees_with(&self, other: &Self) -> bool {
        match (self.mean(), other.mean()) {
            (Some(a), Some(b)) => {
                self.count() == other.count() && float_cmp::approx_eq!(f64, a, b, ulps = 4)
            }
            (None, None) => true,
            _ => false,
        }
    }
}

/// The answer to a zonal query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZonalStatistics {
    pub mean: Option<f64>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ZonalStatistics {
    fn new(outcome: ZonalOutcome, notes: Vec<String>) -> Self {
        let mut notes = notes;
        if let ZonalOutcome::NoCoverage(reason) = outcome {
            notes.insert(0, reason.description().to_string());
        }

        Self {
            mean: outcome.mean(),
            count: outcome.count(),
            note: (!notes.is_empty()).then(|| notes.join("; ")),
        }
    }
}

impl From<ZonalOutcome> for ZonalStatistics {
    fn from(outcome: ZonalOutcome) -> Self {
        Self::new(outcome, Vec::new())
    }
}

/// Computes the mean of the raster inside `geometry`, given as GeoJSON in WGS 84.
#[instrument(skip_all, fields(raster = %ctx.raster_path().display()))]
pub fn zonal_statistics(ctx: &QueryContext, geometry: &Value) -> Result<ZonalStatistics, QueryError> {
    let normalized = normalize_geometry(geometry).at_stage(QueryStage::Normalize)?;

    let geometry = match validate_geometry(&normalized).at_stage(QueryStage::Validate)? {
        ValidatedGeometry::Valid { geometry, report } => {
            if report.repaired {
                debug!(issues = ?report.issues_before, "geometry was repaired");
            }
            geometry
        }
        ValidatedGeometry::Empty => {
            return Ok(ZonalOutcome::NoCoverage(NoCoverageReason::EmptyGeometry).into());
        }
    };

    let source = GdalRasterSource::open(ctx.raster_path()).at_stage(QueryStage::Read)?;

    let projection = RasterProjection::from_wgs84(&source.descriptor().projection_wkt)
        .at_stage(QueryStage::Reproject)?;
    let geometry = projection
        .project_geometry(&geometry)
        .at_stage(QueryStage::Reproject)?;
    debug!(
        coordinates = geometry.number_of_coordinates(),
        "geometry is in raster coordinates"
    );

    evaluate(&source, &geometry, ctx.zonal())
}

/// Runs the configured strategy on a geometry in raster world coordinates.
///
/// A failing windowed strategy falls back to the whole grid and records the cause in the note.
fn evaluate(
    reader: &impl WindowReader,
    geometry: &MultiPolygon,
    settings: ZonalSettings,
) -> Result<ZonalStatistics, QueryError> {
    let mut notes = Vec::new();

    let outcome = match settings.strategy {
        ZonalStrategy::WholeGrid => compute(reader, geometry, ZonalStrategy::WholeGrid)?,
        ZonalStrategy::Windowed => match compute(reader, geometry, ZonalStrategy::Windowed) {
            Ok(windowed) if settings.verify_strategies => {
                verify(reader, geometry, windowed, &mut notes)
            }
            Ok(windowed) => windowed,
            Err(windowed_error) => {
                warn!(error = %windowed_error, "windowed strategy failed, falling back to the whole grid");
                let outcome = compute(reader, geometry, ZonalStrategy::WholeGrid)?;
                notes.push(format!(
                    "computed over the whole grid because the windowed strategy failed: {windowed_error}"
                ));
                outcome
            }
        },
    };

    debug!(?outcome, "zonal statistics computed");

    Ok(ZonalStatistics::new(outcome, notes))
}

/// Recomputes a windowed outcome over the whole grid. A mismatch is reported and the
/// whole-grid outcome is returned instead.
fn verify(
    reader: &impl WindowReader,
    geometry: &MultiPolygon,
    windowed: ZonalOutcome,
    notes: &mut Vec<String>,
) -> ZonalOutcome {
    match compute(reader, geometry, ZonalStrategy::WholeGrid) {
        Ok(whole_grid) if whole_grid.agrees_with(&windowed) => windowed,
        Ok(whole_grid) => {
            warn!(?windowed, ?whole_grid, "zonal strategies disagree");
            notes.push(format!(
                "windowed result (mean {:?}, count {}) differs from the whole grid result",
                windowed.mean(),
                windowed.count()
            ));
            whole_grid
        }
        Err(error) => {
            warn!(%error, "whole grid verification failed");
            notes.push(format!("whole grid verification failed: {error}"));
            windowed
        }
    }
}

fn compute(
    reader: &impl WindowReader,
    geometry: &MultiPolygon,
    strategy: ZonalStrategy,
) -> Result<ZonalOutcome, QueryError> {
    let descriptor = reader.descriptor();

    let Some(bbox) = geometry.bbox() else {
        return Ok(ZonalOutcome::NoCoverage(NoCoverageReason::EmptyGeometry));
    };

    let window = match strategy {
        ZonalStrategy::WholeGrid => {
            let raster_bounds = descriptor.geo_transform.grid_bounds(descriptor.shape);
            if !bbox.intersects_bbox(&raster_bounds) {
                return Ok(ZonalOutcome::NoCoverage(NoCoverageReason::OutsideRaster));
            }
            PixelWindow::full(descriptor.shape).at_stage(QueryStage::Window)?
        }
        ZonalStrategy::Windowed => {
            match plan_window(bbox, &descriptor.geo_transform, descriptor.shape) {
                WindowPlan::Window { window } => window,
                WindowPlan::OutsideRaster => {
                    return Ok(ZonalOutcome::NoCoverage(NoCoverageReason::OutsideRaster));
                }
                WindowPlan::Empty => {
                    return Ok(ZonalOutcome::NoCoverage(NoCoverageReason::EmptyWindow));
                }
            }
        }
    };
    debug!(?strategy, %window, "evaluating window");

    let coverage = MaskRasterizer::new(geometry, &descriptor.geo_transform)
        .at_stage(QueryStage::Rasterize)?
        .rasterize(&window);
    let data = reader.read_window(&window).at_stage(QueryStage::Read)?;
    let aggregate = aggregate(&data, &coverage).at_stage(QueryStage::Compute)?;

    Ok(ZonalOutcome::from_aggregate(aggregate))
}
