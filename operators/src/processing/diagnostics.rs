use serde::Serialize;
use serde_json::Value;
use tracing::instrument;
use valor_datatypes::operations::normalize::{Position, normalize_geometry};
use valor_datatypes::operations::repair::{RepairReport, ValidatedGeometry, validate_geometry};
use valor_datatypes::operations::reproject::RasterProjection;
use valor_datatypes::primitives::BoundingBox2D;
use valor_datatypes::raster::{PixelWindow, WindowPlan, plan_window};

use crate::engine::{QueryContext, QueryStage};
use crate::error::{AtStage, QueryError};
use crate::source::GdalRasterSource;

const SAMPLE_SIZE: usize = 5;

/// What the zonal pipeline makes of a geometry, up to the planned window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryDiagnostics {
    pub geometry_type: &'static str,
    pub number_of_polygons: usize,
    pub sample_coordinates: Vec<Position>,
    /// `None` if nothing is left of the geometry after dropping empty rings
    pub repair: Option<RepairReport>,
    pub raster_srs: String,
    pub raster_bounds: BoundingBox2D,
    /// bounds of the geometry in the raster's spatial reference
    pub projected_bounds: Option<BoundingBox2D>,
    pub intersects_raster: bool,
    pub window: Option<PixelWindow>,
}

/// Runs normalization, validation, reprojection and window planning for `geometry` without
/// reading any pixels.
#[instrument(skip_all, fields(raster = %ctx.raster_path().display()))]
pub fn diagnose(ctx: &QueryContext, geometry: &Value) -> Result<GeometryDiagnostics, QueryError> {
    let normalized = normalize_geometry(geometry).at_stage(QueryStage::Normalize)?;
    let validated = validate_geometry(&normalized).at_stage(QueryStage::Validate)?;

    let source = GdalRasterSource::open(ctx.raster_path()).at_stage(QueryStage::Read)?;
    let descriptor = source.descriptor();
    let raster_bounds = descriptor.geo_transform.grid_bounds(descriptor.shape);

    let projection = RasterProjection::from_wgs84(&descriptor.projection_wkt)
        .at_stage(QueryStage::Reproject)?;

    let (repair, projected_bounds) = match validated {
        ValidatedGeometry::Valid { geometry, report } => {
            let projected = projection
                .project_geometry(&geometry)
                .at_stage(QueryStage::Reproject)?;
            (Some(report), projected.bbox())
        }
        ValidatedGeometry::Empty => (None, None),
    };

    let plan = projected_bounds
        .map(|bbox| plan_window(bbox, &descriptor.geo_transform, descriptor.shape));

    Ok(GeometryDiagnostics {
        geometry_type: normalized.type_name(),
        number_of_polygons: normalized.polygons().len(),
        sample_coordinates: normalized.sample_positions(SAMPLE_SIZE),
        repair,
        raster_srs: projection
            .raster_srs()
            .map(ToString::to_string)
            .unwrap_or_default(),
        raster_bounds,
        projected_bounds,
        intersects_raster: plan.is_some_and(|plan| !matches!(plan, WindowPlan::OutsideRaster)),
        window: plan.and_then(|plan| plan.window()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ZonalSettings;
    use crate::util::test::create_unit_geotiff;
    use serde_json::json;

    #[test]
    fn reports_window() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = QueryContext::new(create_unit_geotiff(dir.path()), ZonalSettings::default());

        let diagnostics = diagnose(
            &ctx,
            &json!({"type": "Polygon", "coordinates": [[2.5, 3.5], [6, 3.5], [6, 5], [2.5, 5]]}),
        )
        .unwrap();

        assert_eq!(diagnostics.geometry_type, "Polygon");
        assert_eq!(diagnostics.number_of_polygons, 1);
        assert_eq!(
            diagnostics.sample_coordinates,
            vec![[2.5, 3.5], [6., 3.5], [6., 5.], [2.5, 5.], [2.5, 3.5]]
        );
        assert!(diagnostics.repair.unwrap().valid_before);
        assert_eq!(diagnostics.raster_srs, "EPSG:4326");
        assert!(diagnostics.intersects_raster);
        assert_eq!(
            diagnostics.window,
            Some(PixelWindow {
                col_offset: 2,
                row_offset: 3,
                width: 4,
                height: 2
            })
        );
    }

    #[test]
    fn reports_outside_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = QueryContext::new(create_unit_geotiff(dir.path()), ZonalSettings::default());

        let diagnostics = diagnose(
            &ctx,
            &json!({"type": "MultiPolygon", "coordinates": [[[[20, 20], [21, 20], [21, 21], [20, 20]]]]}),
        )
        .unwrap();

        assert!(!diagnostics.intersects_raster);
        assert_eq!(diagnostics.window, None);
        assert!(diagnostics.projected_bounds.is_some());
    }
}
