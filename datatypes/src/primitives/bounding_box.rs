use super::Coordinate2D;
use crate::error;
use crate::util::Result;
use serde::{Deserialize, Serialize};
use snafu::ensure;

#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
#[repr(C)]
/// The bounding box of a geometry.
/// Note: may degenerate to a point!
pub struct BoundingBox2D {
    lower_left_coordinate: Coordinate2D,
    upper_right_coordinate: Coordinate2D,
}

impl BoundingBox2D {
    /// Creates a new bounding box
    ///
    /// # Examples
    ///
    /// ```
    /// use valor_datatypes::primitives::{Coordinate2D, BoundingBox2D};
    ///
    /// let ll = Coordinate2D::new(1.0, 1.0);
    /// let ur = Coordinate2D::new(2.0, 2.0);
    /// let bbox = BoundingBox2D::new(ll, ur).unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// This constructor fails if the coordinate's values are not in order
    ///
    pub fn new(
        lower_left_coordinate: Coordinate2D,
        upper_right_coordinate: Coordinate2D,
    ) -> Result<Self> {
        ensure!(
            lower_left_coordinate.x <= upper_right_coordinate.x
                && lower_left_coordinate.y <= upper_right_coordinate.y,
            error::InvalidBoundingBox {
                lower_left_coordinate,
                upper_right_coordinate
            }
        );
        Ok(Self {
            lower_left_coordinate,
            upper_right_coordinate,
        })
    }

    pub fn new_unchecked(
        lower_left_coordinate: Coordinate2D,
        upper_right_coordinate: Coordinate2D,
    ) -> Self {
        Self {
            lower_left_coordinate,
            upper_right_coordinate,
        }
    }

    pub fn lower_left(&self) -> Coordinate2D {
        self.lower_left_coordinate
    }

    pub fn upper_right(&self) -> Coordinate2D {
        self.upper_right_coordinate
    }

    pub fn upper_left(&self) -> Coordinate2D {
        (self.lower_left_coordinate.x, self.upper_right_coordinate.y).into()
    }

    pub fn lower_right(&self) -> Coordinate2D {
        (self.upper_right_coordinate.x, self.lower_left_coordinate.y).into()
    }

    /// Returns true if the two boxes share at least one point, i.e. touching boxes intersect.
    ///
    /// # Examples
    ///
    /// ```
    /// use valor_datatypes::primitives::{Coordinate2D, BoundingBox2D};
    ///
    /// let bbox = BoundingBox2D::new((1.0, 1.0).into(), (4.0, 4.0).into()).unwrap();
    /// let other = BoundingBox2D::new((2.0, 2.0).into(), (5.0, 5.0).into()).unwrap();
    /// assert!(bbox.intersects_bbox(&other));
    /// ```
    ///
    pub fn intersects_bbox(&self, other_bbox: &Self) -> bool {
        self.lower_left_coordinate.x <= other_bbox.upper_right_coordinate.x
            && self.upper_right_coordinate.x >= other_bbox.lower_left_coordinate.x
            && self.lower_left_coordinate.y <= other_bbox.upper_right_coordinate.y
            && self.upper_right_coordinate.y >= other_bbox.lower_left_coordinate.y
    }

    fn extend_with_coord(&mut self, coord: Coordinate2D) {
        self.lower_left_coordinate = self.lower_left_coordinate.min_elements(coord);
        self.upper_right_coordinate = self.upper_right_coordinate.max_elements(coord);
    }

    pub fn from_coord_iter<I: IntoIterator<Item = Coordinate2D>>(iter: I) -> Option<Self> {
        let mut iterator = iter.into_iter();

        let first = iterator.next().map(|c| BoundingBox2D::new_unchecked(c, c));

        first.map(|mut f| {
            for c in iterator {
                f.extend_with_coord(c);
            }
            f
        })
    }

    pub fn from_coord_ref_iter<'l, I: IntoIterator<Item = &'l Coordinate2D>>(
        iter: I,
    ) -> Option<Self> {
        Self::from_coord_iter(iter.into_iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_new() {
        assert!(BoundingBox2D::new((1.0, 1.0).into(), (2.0, 2.0).into()).is_ok());
        assert!(BoundingBox2D::new((2.0, 1.0).into(), (1.0, 2.0).into()).is_err());
    }

    #[test]
    fn corners() {
        let bbox = BoundingBox2D::new((1.0, 2.0).into(), (3.0, 5.0).into()).unwrap();

        assert_eq!(bbox.upper_left(), (1.0, 5.0).into());
        assert_eq!(bbox.lower_right(), (3.0, 2.0).into());
    }

    #[test]
    fn intersects_touching() {
        let bbox = BoundingBox2D::new((0.0, 0.0).into(), (10.0, 10.0).into()).unwrap();
        let touching = BoundingBox2D::new((10.0, 0.0).into(), (20.0, 10.0).into()).unwrap();
        let separate = BoundingBox2D::new((10.1, 0.0).into(), (20.0, 10.0).into()).unwrap();

        assert!(bbox.intersects_bbox(&touching));
        assert!(!bbox.intersects_bbox(&separate));
    }

    #[test]
    fn from_coord_iter() {
        let bbox = BoundingBox2D::from_coord_iter(vec![
            (1.0, 1.0).into(),
            (-3.0, 4.0).into(),
            (2.0, -0.5).into(),
        ])
        .unwrap();

        assert_eq!(bbox.lower_left(), (-3.0, -0.5).into());
        assert_eq!(bbox.upper_right(), (2.0, 4.0).into());

        assert!(BoundingBox2D::from_coord_iter(Vec::<Coordinate2D>::new()).is_none());
    }
}
