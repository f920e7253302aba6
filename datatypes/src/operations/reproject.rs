use tracing::{debug, instrument};

use crate::primitives::{Coordinate2D, MultiPolygon};
use crate::spatial_reference::{SpatialReference, SpatialReferenceDefinition, wkt_is_wgs84};
use crate::util::Result;
use crate::util::proj_projector::ProjCoordinateProjector;

pub trait CoordinateProjection {
    fn from_known_srs(from: SpatialReference, to: SpatialReference) -> Result<Self>
    where
        Self: Sized;

    /// project a single coordinate
    fn project_coordinate(&self, c: Coordinate2D) -> Result<Coordinate2D>;

    /// project a set of coordinates
    fn project_coordinates<A: AsRef<[Coordinate2D]>>(&self, coords: A)
    -> Result<Vec<Coordinate2D>>;
}

pub trait Reproject<P: CoordinateProjection> {
    type Out;
    fn reproject(&self, projector: &P) -> Result<Self::Out>;
}

impl<P> Reproject<P> for Coordinate2D
where
    P: CoordinateProjection,
{
    type Out = Coordinate2D;

    fn reproject(&self, projector: &P) -> Result<Self::Out> {
        projector.project_coordinate(*self)
    }
}

impl<P> Reproject<P> for MultiPolygon
where
    P: CoordinateProjection,
{
    type Out = MultiPolygon;

    fn reproject(&self, projector: &P) -> Result<Self::Out> {
        let polygons = self
            .polygons()
            .iter()
            .map(|polygon| {
                polygon
                    .iter()
                    .map(|ring| projector.project_coordinates(ring))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MultiPolygon::new_unchecked(polygons))
    }
}

/// How coordinates in WGS 84 lon/lat reach the raster's spatial reference
#[derive(Debug)]
pub enum RasterProjection {
    /// The raster has no spatial reference (`None`) or one equivalent to WGS 84. Coordinates are
    /// used as they are.
    Identity {
        raster_srs: Option<SpatialReferenceDefinition>,
    },
    Projected(ProjCoordinateProjector),
}

impl RasterProjection {
    /// Plans the projection from WGS 84 into the spatial reference described by `raster_wkt`.
    ///
    /// # Errors
    ///
    /// Fails if the WKT cannot be parsed or PROJ cannot build a transformation into it.
    #[instrument(skip(raster_wkt))]
    pub fn from_wgs84(raster_wkt: &str) -> Result<Self> {
        if raster_wkt.trim().is_empty() {
            debug!("raster is unreferenced, coordinates are used as lon/lat");
            return Ok(Self::Identity { raster_srs: None });
        }

        if wkt_is_wgs84(raster_wkt)? {
            return Ok(Self::Identity {
                raster_srs: Some(SpatialReference::epsg_4326().into()),
            });
        }

        let Some(raster_srs) = SpatialReferenceDefinition::from_wkt(raster_wkt)? else {
            return Ok(Self::Identity { raster_srs: None });
        };

        debug!(target_srs = %raster_srs, "projecting from WGS 84");
        let projector = ProjCoordinateProjector::from_definitions(
            SpatialReference::epsg_4326().into(),
            raster_srs,
        )?;

        Ok(Self::Projected(projector))
    }

    /// The raster's spatial reference, `None` if it has none
    pub fn raster_srs(&self) -> Option<&SpatialReferenceDefinition> {
        match self {
            RasterProjection::Identity { raster_srs } => raster_srs.as_ref(),
            RasterProjection::Projected(projector) => Some(&projector.to),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, RasterProjection::Identity { .. })
    }

    /// Projects a geometry; the identity returns an exact copy
    pub fn project_geometry(&self, geometry: &MultiPolygon) -> Result<MultiPolygon> {
        match self {
            RasterProjection::Identity { .. } => Ok(geometry.clone()),
            RasterProjection::Projected(projector) => geometry.reproject(projector),
        }
    }

    pub fn project_coordinate(&self, coordinate: Coordinate2D) -> Result<Coordinate2D> {
        match self {
            RasterProjection::Identity { .. } => Ok(coordinate),
            RasterProjection::Projected(projector) => coordinate.reproject(projector),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial_reference::SpatialReferenceAuthority;
    use float_cmp::{ApproxEq, F64Margin, FloatMargin};
    use gdal::spatial_ref::SpatialRef;

    fn square() -> MultiPolygon {
        MultiPolygon::new(vec![vec![vec![
            (10.123_456_789, 50.1).into(),
            (10.2, 50.1).into(),
            (10.2, 50.2).into(),
            (10.123_456_789, 50.2).into(),
            (10.123_456_789, 50.1).into(),
        ]]])
        .unwrap()
    }

    fn wkt(epsg: u32) -> String {
        SpatialRef::from_epsg(epsg).unwrap().to_wkt().unwrap()
    }

    #[test]
    fn unreferenced_is_identity() {
        let projection = RasterProjection::from_wgs84("").unwrap();

        assert!(projection.is_identity());
        assert_eq!(projection.raster_srs(), None);
        assert_eq!(projection.project_geometry(&square()).unwrap(), square());
    }

    #[test]
    fn wgs84_is_bit_identical() {
        let projection = RasterProjection::from_wgs84(&wkt(4326)).unwrap();

        assert!(projection.is_identity());
        assert_eq!(projection.project_geometry(&square()).unwrap(), square());
        assert_eq!(
            projection
                .project_coordinate((10.123_456_789, 50.1).into())
                .unwrap(),
            (10.123_456_789, 50.1).into()
        );
    }

    #[test]
    fn projects_into_utm() {
        let projection = RasterProjection::from_wgs84(&wkt(32632)).unwrap();

        assert_eq!(
            projection.raster_srs(),
            Some(&SpatialReference::new(SpatialReferenceAuthority::Epsg, 32632).into())
        );

        let projected = projection.project_geometry(&square()).unwrap();
        let projector = ProjCoordinateProjector::from_known_srs(
            SpatialReference::epsg_4326(),
            SpatialReference::new(SpatialReferenceAuthority::Epsg, 32632),
        )
        .unwrap();

        for (projected, original) in projected.coordinates().zip(square().coordinates()) {
            assert!(projected.approx_eq(
                projector.project_coordinate(*original).unwrap(),
                F64Margin::default()
            ));
            // eastings and northings in metres
            assert!(projected.x > 100_000.0 && projected.y > 5_000_000.0);
        }
    }

    #[test]
    fn projects_into_custom_wkt() {
        let wkt = SpatialRef::from_proj4(
            "+proj=laea +lat_0=52 +lon_0=13.37 +x_0=0 +y_0=0 +ellps=GRS80 +units=m +no_defs",
        )
        .unwrap()
        .to_wkt()
        .unwrap();

        let projection = RasterProjection::from_wgs84(&wkt).unwrap();
        assert!(!projection.is_identity());
        assert!(matches!(
            projection.raster_srs(),
            Some(SpatialReferenceDefinition::Custom { .. })
        ));

        // the projection centre maps to the false origin
        let centre = projection
            .project_coordinate((13.37, 52.0).into())
            .unwrap();
        assert!(centre.approx_eq(Coordinate2D::new(0.0, 0.0), F64Margin::default().epsilon(1e-3)));

        // east of the centre has a positive easting
        let east = projection.project_coordinate((14.0, 52.0).into()).unwrap();
        assert!(east.x > 40_000.0 && east.y.abs() < 5_000.0);
    }

    #[test]
    fn unidentifiable_projection_fails() {
        assert!(RasterProjection::from_wgs84("GARBAGE").is_err());
    }
}
