use proj::Proj;
use tracing::instrument;

use crate::{
    error,
    operations::reproject::CoordinateProjection,
    primitives::Coordinate2D,
    spatial_reference::{SpatialReference, SpatialReferenceDefinition},
    util::Result,
};

/// Projects coordinates with PROJ, always in x/y (lon/lat, easting/northing) axis order
pub struct ProjCoordinateProjector {
    pub from: SpatialReferenceDefinition,
    pub to: SpatialReferenceDefinition,
    p: Proj,
}

impl std::fmt::Debug for ProjCoordinateProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjCoordinateProjector")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

impl ProjCoordinateProjector {
    /// Builds a projector between two definitions, which may be custom WKT
    #[instrument(skip_all, fields(from = %from, to = %to))]
    pub fn from_definitions(
        from: SpatialReferenceDefinition,
        to: SpatialReferenceDefinition,
    ) -> Result<Self> {
        // `new_known_crs` normalizes the axis order for visualization
        let p = Proj::new_known_crs(&from.proj_definition(), &to.proj_definition(), None)
            .map_err(|_| error::Error::NoCoordinateProjector {
                from: from.clone(),
                to: to.clone(),
            })?;

        Ok(ProjCoordinateProjector { from, to, p })
    }

    fn ensure_finite(&self, source: Coordinate2D, projected: Coordinate2D) -> Result<Coordinate2D> {
        if projected.is_finite() {
            Ok(projected)
        } else {
            Err(error::Error::UnprojectableCoordinate {
                coordinate: source,
                from: self.from.clone(),
                to: self.to.clone(),
            })
        }
    }
}

impl CoordinateProjection for ProjCoordinateProjector {
    fn from_known_srs(from: SpatialReference, to: SpatialReference) -> Result<Self> {
        Self::from_definitions(from.into(), to.into())
    }

    #[instrument(skip(self))]
    fn project_coordinate(&self, c: Coordinate2D) -> Result<Coordinate2D> {
        let projected = self
            .p
            .convert(c)
            .map_err(|_| error::Error::UnprojectableCoordinate {
                coordinate: c,
                from: self.from.clone(),
                to: self.to.clone(),
            })?;

        self.ensure_finite(c, projected)
    }

    #[instrument(skip_all)]
    fn project_coordinates<A: AsRef<[Coordinate2D]>>(
        &self,
        coords: A,
    ) -> Result<Vec<Coordinate2D>> {
        let source = coords.as_ref();

        let mut projected = Vec::from(source);
        self.p.convert_array(&mut projected)?;

        for (&s, &p) in source.iter().zip(&projected) {
            self.ensure_finite(s, p)?;
        }

        Ok(projected)
    }
}
