use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::error;
use crate::primitives::{BoundingBox2D, Coordinate2D};
use crate::util::Result;

pub type Ring = Vec<Coordinate2D>;
pub type Polygon = Vec<Ring>;

/// A representation of a simple feature multi polygon.
///
/// The first ring of every polygon is its exterior, all following rings are holes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiPolygon {
    polygons: Vec<Polygon>,
}

impl MultiPolygon {
    pub fn new(polygons: Vec<Polygon>) -> Result<Self> {
        ensure!(
            !polygons.is_empty() && polygons.iter().all(|polygon| !polygon.is_empty()),
            error::UnallowedEmpty
        );
        ensure!(
            polygons
                .iter()
                .all(|polygon| Self::polygon_is_valid(polygon)),
            error::UnclosedPolygonRing
        );

        Ok(Self::new_unchecked(polygons))
    }

    fn polygon_is_valid(polygon: &[Ring]) -> bool {
        polygon.iter().all(|ring| Self::ring_is_valid(ring))
    }

    fn ring_is_valid(ring: &[Coordinate2D]) -> bool {
        // at least four coordinates and closed
        ring.len() >= 4 && ring.first() == ring.last()
    }

    pub(crate) fn new_unchecked(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Iterates over every coordinate of every ring
    pub fn coordinates(&self) -> impl Iterator<Item = &Coordinate2D> {
        self.polygons.iter().flatten().flatten()
    }

    pub fn number_of_coordinates(&self) -> usize {
        self.polygons.iter().flatten().map(Vec::len).sum()
    }

    pub fn bbox(&self) -> Option<BoundingBox2D> {
        BoundingBox2D::from_coord_ref_iter(self.coordinates())
    }

    /// Applies `map` to every coordinate while keeping the ring structure
    pub fn try_map_coordinates<F, E>(&self, mut map: F) -> Result<Self, E>
    where
        F: FnMut(Coordinate2D) -> Result<Coordinate2D, E>,
    {
        let polygons = self
            .polygons
            .iter()
            .map(|polygon| {
                polygon
                    .iter()
                    .map(|ring| ring.iter().map(|c| map(*c)).collect::<Result<Ring, E>>())
                    .collect::<Result<Polygon, E>>()
            })
            .collect::<Result<Vec<Polygon>, E>>()?;

        Ok(Self::new_unchecked(polygons))
    }
}

impl From<&MultiPolygon> for geo::MultiPolygon<f64> {
    fn from(geometry: &MultiPolygon) -> geo::MultiPolygon<f64> {
        let polygons: Vec<geo::Polygon<f64>> = geometry
            .polygons()
            .iter()
            .map(|polygon| {
                let mut line_strings: Vec<geo::LineString<f64>> = polygon
                    .iter()
                    .map(|ring| geo::LineString(ring.iter().map(Into::into).collect()))
                    .collect();

                let exterior = line_strings.remove(0);

                geo::Polygon::new(exterior, line_strings)
            })
            .collect();
        geo::MultiPolygon(polygons)
    }
}

impl From<geo::MultiPolygon<f64>> for MultiPolygon {
    fn from(geometry: geo::MultiPolygon<f64>) -> MultiPolygon {
        let geo::MultiPolygon(geo_polygons) = geometry;

        let mut polygons = Vec::with_capacity(geo_polygons.len());

        for geo_polygon in geo_polygons {
            let (exterior, interiors) = geo_polygon.into_inner();

            let mut rings = Vec::with_capacity(interiors.len() + 1);

            let geo::LineString(exterior_coords) = exterior;
            let ring: Ring = exterior_coords.into_iter().map(Into::into).collect();
            rings.push(ring);

            for geo::LineString(interior_coords) in interiors {
                let ring: Ring = interior_coords.into_iter().map(Into::into).collect();
                rings.push(ring);
            }

            polygons.push(rings);
        }

        MultiPolygon::new_unchecked(polygons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Ring {
        vec![
            (x, y).into(),
            (x + size, y).into(),
            (x + size, y + size).into(),
            (x, y + size).into(),
            (x, y).into(),
        ]
    }

    #[test]
    fn new_checks_rings() {
        assert!(MultiPolygon::new(vec![vec![square(0., 0., 1.)]]).is_ok());

        assert!(matches!(
            MultiPolygon::new(vec![]),
            Err(crate::error::Error::UnallowedEmpty)
        ));

        let open_ring = vec![(0.0, 0.0).into(), (1.0, 0.0).into(), (1.0, 1.0).into(), (0.0, 1.0).into()];
        assert!(matches!(
            MultiPolygon::new(vec![vec![open_ring]]),
            Err(crate::error::Error::UnclosedPolygonRing)
        ));
    }

    #[test]
    fn access() {
        let multi_polygon = MultiPolygon::new(vec![
            vec![square(0., 0., 10.), square(2., 2., 1.)],
            vec![square(20., 20., 1.)],
        ])
        .unwrap();

        assert_eq!(multi_polygon.polygons().len(), 2);
        assert_eq!(multi_polygon.number_of_coordinates(), 15);
        assert_eq!(
            multi_polygon.bbox(),
            Some(BoundingBox2D::new_unchecked((0., 0.).into(), (21., 21.).into()))
        );
    }

    #[test]
    fn test_to_geo_and_back() {
        let multi_polygon = MultiPolygon::new(vec![
            vec![square(0., 0., 10.), square(2., 2., 1.)],
            vec![square(20., 20., 1.)],
        ])
        .unwrap();

        let geo_multi_polygon: geo::MultiPolygon<f64> = (&multi_polygon).into();
        assert_eq!(geo_multi_polygon.0.len(), 2);
        assert_eq!(geo_multi_polygon.0[0].interiors().len(), 1);

        assert_eq!(MultiPolygon::from(geo_multi_polygon), multi_polygon);
    }

    #[test]
    fn map_coordinates() {
        let multi_polygon = MultiPolygon::new(vec![vec![square(0., 0., 1.)]]).unwrap();

        let shifted = multi_polygon
            .try_map_coordinates(|c| Ok::<_, ()>(Coordinate2D::new(c.x + 1., c.y * 2.)))
            .unwrap();

        assert_eq!(
            shifted,
            MultiPolygon::new(vec![vec![vec![
                (1., 0.).into(),
                (2., 0.).into(),
                (2., 2.).into(),
                (1., 2.).into(),
                (1., 0.).into(),
            ]]])
            .unwrap()
        );

        assert!(multi_polygon.try_map_coordinates(|_| Err("fail")).is_err());
    }
}
