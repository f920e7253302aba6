use serde::Serialize;
use tracing::{debug, instrument};
use valor_datatypes::operations::reproject::RasterProjection;
use valor_datatypes::primitives::Coordinate2D;

use crate::engine::{QueryContext, QueryStage};
use crate::error::{AtStage, QueryError};
use crate::source::GdalRasterSource;

/// The answer to a point query, `None` outside the raster and for pixels without data
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointValue {
    pub value: Option<f64>,
}

/// Reads the pixel containing `coordinate`, given as WGS 84 lon/lat.
#[instrument(skip(ctx), fields(raster = %ctx.raster_path().display()))]
pub fn sample_point(ctx: &QueryContext, coordinate: Coordinate2D) -> Result<PointValue, QueryError> {
    let source = GdalRasterSource::open(ctx.raster_path()).at_stage(QueryStage::Read)?;
    let descriptor = source.descriptor();

    let projected = RasterProjection::from_wgs84(&descriptor.projection_wkt)
        .and_then(|projection| projection.project_coordinate(coordinate))
        .at_stage(QueryStage::Reproject)?;

    let grid_index = descriptor.geo_transform.coordinate_to_grid_idx_2d(projected);
    if !descriptor.shape.contains(grid_index) {
        debug!(?grid_index, "coordinate is outside of the raster");
        return Ok(PointValue { value: None });
    }

    let [row, column] = grid_index;
    let value = source
        .read_pixel(row as usize, column as usize)
        .at_stage(QueryStage::Read)?;

    Ok(PointValue { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ZonalSettings;
    use crate::error::ErrorKind;
    use crate::util::test::{create_test_geotiff, create_unit_geotiff};
    use valor_datatypes::operations::reproject::CoordinateProjection;
    use valor_datatypes::raster::{GeoTransform, Grid2D};
    use valor_datatypes::spatial_reference::{SpatialReference, SpatialReferenceAuthority};
    use valor_datatypes::util::proj_projector::ProjCoordinateProjector;

    fn context(path: &std::path::Path) -> QueryContext {
        QueryContext::new(path, ZonalSettings::default())
    }

    #[test]
    fn no_data_pixel_is_null() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&create_unit_geotiff(dir.path()));

        assert_eq!(
            sample_point(&ctx, (5.5, 5.5).into()).unwrap(),
            PointValue { value: None }
        );
        assert_eq!(
            sample_point(&ctx, (0.5, 0.5).into()).unwrap(),
            PointValue { value: Some(1.0) }
        );
    }

    #[test]
    fn outside_is_null() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&create_unit_geotiff(dir.path()));

        for coordinate in [(10.0, 5.0), (-0.1, 5.0), (5.0, 10.5), (5.0, -3.0)] {
            assert_eq!(
                sample_point(&ctx, coordinate.into()).unwrap().value,
                None,
                "{coordinate:?}"
            );
        }
    }

    #[test]
    fn matches_pixel_values() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<i32> = (0..24).map(|i| i * 3 - 20).collect();
        let geo_transform = GeoTransform::new_with_coordinate_x_y(-5.0, 0.5, 40.0, -0.25);
        let path = create_test_geotiff(
            dir.path(),
            "ints.tif",
            Grid2D::new([4, 6].into(), data.clone()).unwrap(),
            Some(geo_transform),
            Some("EPSG:4326"),
            None,
        );
        let ctx = context(&path);

        for row in 0..4 {
            for column in 0..6 {
                let centre = geo_transform.pixel_center(row, column);
                assert_eq!(
                    sample_point(&ctx, centre).unwrap().value,
                    Some(f64::from(data[row * 6 + column]))
                );
            }
        }
    }

    #[test]
    fn reprojects_coordinate() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..100).collect();
        let path = create_test_geotiff(
            dir.path(),
            "mercator.tif",
            Grid2D::new([10, 10].into(), data).unwrap(),
            Some(GeoTransform::new_with_coordinate_x_y(0.0, 1000.0, 10_000.0, -1000.0)),
            Some("EPSG:3857"),
            None,
        );

        let to_wgs84 = ProjCoordinateProjector::from_known_srs(
            SpatialReference::new(SpatialReferenceAuthority::Epsg, 3857),
            SpatialReference::epsg_4326(),
        )
        .unwrap();
        // centre of pixel (row 2, column 7)
        let lon_lat = to_wgs84.project_coordinate((7500.0, 7500.0).into()).unwrap();

        assert_eq!(
            sample_point(&context(&path), lon_lat).unwrap().value,
            Some(27.0)
        );
    }

    #[test]
    fn reprojects_into_custom_projection() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..100).collect();
        let path = create_test_geotiff(
            dir.path(),
            "laea.tif",
            Grid2D::new([10, 10].into(), data).unwrap(),
            Some(GeoTransform::new_with_coordinate_x_y(-4500.0, 1000.0, 4500.0, -1000.0)),
            Some("+proj=laea +lat_0=52 +lon_0=13.37 +x_0=0 +y_0=0 +ellps=GRS80 +units=m +no_defs"),
            None,
        );

        // the projection centre is the centre of pixel (row 4, column 4)
        assert_eq!(
            sample_point(&context(&path), (13.37, 52.0).into())
                .unwrap()
                .value,
            Some(44.0)
        );
    }

    #[test]
    fn missing_raster() {
        let dir = tempfile::tempdir().unwrap();

        let error = sample_point(&context(&dir.path().join("missing.tif")), (0., 0.).into())
            .unwrap_err();

        assert_eq!(error.stage, QueryStage::Read);
        assert_eq!(error.kind(), ErrorKind::RasterAccessError);
    }
}
