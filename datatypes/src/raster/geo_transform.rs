use crate::error;
use crate::primitives::{BoundingBox2D, Coordinate2D};
use crate::util::Result;
use serde::{Deserialize, Serialize};
use snafu::ensure;

use super::{GridIdx2D, GridShape2D};

/// This is a typedef for the `GDAL GeoTransform`. It represents an affine transformation matrix.
pub type GdalGeoTransform = [f64; 6];

/// The `GeoTransform` is a more user friendly representation of the `GDAL GeoTransform` affine transformation matrix.
///
/// A pixel position (column, row) maps to
/// `x = origin.x + column * x_pixel_size + row * x_rotation` and
/// `y = origin.y + column * y_rotation + row * y_pixel_size`.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_coordinate: Coordinate2D,
    pub x_pixel_size: f64,
    pub y_pixel_size: f64,
    #[serde(default)]
    pub x_rotation: f64,
    #[serde(default)]
    pub y_rotation: f64,
}

impl GeoTransform {
    /// Generates a new north-up `GeoTransform`
    ///
    /// # Examples
    ///
    /// ```
    /// use valor_datatypes::raster::GeoTransform;
    ///
    /// let geo_transform = GeoTransform::new((0.0, 0.0).into(), 1.0, -1.0);
    /// ```
    ///
    pub fn new(origin_coordinate: Coordinate2D, x_pixel_size: f64, y_pixel_size: f64) -> Self {
        Self {
            origin_coordinate,
            x_pixel_size,
            y_pixel_size,
            x_rotation: 0.0,
            y_rotation: 0.0,
        }
    }

    pub fn new_with_coordinate_x_y(
        origin_coordinate_x: f64,
        x_pixel_size: f64,
        origin_coordinate_y: f64,
        y_pixel_size: f64,
    ) -> Self {
        Self::new(
            (origin_coordinate_x, origin_coordinate_y).into(),
            x_pixel_size,
            y_pixel_size,
        )
    }

    /// Sets the rotation (or shear) terms, i.e. the x offset per row and the y offset per column
    ///
    /// # Examples
    ///
    /// ```
    /// use valor_datatypes::raster::GeoTransform;
    ///
    /// let geo_transform = GeoTransform::new((0.0, 0.0).into(), 1.0, -1.0).with_rotation(0.5, 0.0);
    /// assert_eq!(geo_transform.pixel_center(1, 0), (1.25, -1.5).into());
    /// ```
    #[must_use]
    pub fn with_rotation(mut self, x_rotation: f64, y_rotation: f64) -> Self {
        self.x_rotation = x_rotation;
        self.y_rotation = y_rotation;
        self
    }

    fn determinant(&self) -> f64 {
        self.x_pixel_size * self.y_pixel_size - self.x_rotation * self.y_rotation
    }

    /// A transform can only be inverted if all terms are finite and its linear part is not singular
    pub fn is_invertible(&self) -> bool {
        GdalGeoTransform::from(*self).iter().all(|v| v.is_finite())
            && self.determinant().is_normal()
    }

    /// Transforms a grid coordinate (row, column) ~ (y, x) into the SRS coordinate (x,y) of the pixel's upper left edge
    ///
    /// # Examples
    ///
    /// ```
    /// use valor_datatypes::raster::GeoTransform;
    ///
    /// let geo_transform = GeoTransform::new_with_coordinate_x_y(0.0, 1.0, 0.0, -1.0);
    /// assert_eq!(geo_transform.grid_idx_to_coordinate_2d([0, 0]), (0.0, 0.0).into())
    /// ```
    ///
    pub fn grid_idx_to_coordinate_2d(&self, grid_index: GridIdx2D) -> Coordinate2D {
        let [grid_index_y, grid_index_x] = grid_index;
        self.fractional_pixel_to_coordinate(grid_index_x as f64, grid_index_y as f64)
    }

    /// The SRS coordinate of the centre of the pixel at (row, column)
    pub fn pixel_center(&self, row: usize, column: usize) -> Coordinate2D {
        self.fractional_pixel_to_coordinate(column as f64 + 0.5, row as f64 + 0.5)
    }

    /// Transforms fractional pixel coordinates (column, row) into an SRS coordinate (x,y)
    pub fn fractional_pixel_to_coordinate(&self, column: f64, row: f64) -> Coordinate2D {
        Coordinate2D::new(
            self.origin_coordinate.x + column * self.x_pixel_size + row * self.x_rotation,
            self.origin_coordinate.y + column * self.y_rotation + row * self.y_pixel_size,
        )
    }

    /// Transforms an SRS coordinate (x,y) into fractional pixel coordinates (column, row)
    pub fn coordinate_to_fractional_pixel(&self, coord: Coordinate2D) -> (f64, f64) {
        let dx = coord.x - self.origin_coordinate.x;
        let dy = coord.y - self.origin_coordinate.y;

        #[allow(clippy::float_cmp)]
        if self.x_rotation == 0.0 && self.y_rotation == 0.0 {
            return (dx / self.x_pixel_size, dy / self.y_pixel_size);
        }

        let determinant = self.determinant();

        let column = (self.y_pixel_size * dx - self.x_rotation * dy) / determinant;
        let row = (self.x_pixel_size * dy - self.y_rotation * dx) / determinant;
        (column, row)
    }

    /// Transforms an SRS coordinate (x,y) into the grid coordinate (row, column) ~ (y, x) of the pixel containing it
    ///
    /// # Examples
    ///
    /// ```
    /// use valor_datatypes::raster::GeoTransform;
    ///
    /// let geo_transform = GeoTransform::new_with_coordinate_x_y(0.0, 1.0, 0.0, -1.0);
    /// assert_eq!(geo_transform.coordinate_to_grid_idx_2d((0.5, -0.5).into()), [0, 0]);
    /// assert_eq!(geo_transform.coordinate_to_grid_idx_2d((-0.5, 0.5).into()), [-1, -1]);
    /// ```
    ///
    pub fn coordinate_to_grid_idx_2d(&self, coord: Coordinate2D) -> GridIdx2D {
        let (column, row) = self.coordinate_to_fractional_pixel(coord);
        [row.floor() as isize, column.floor() as isize]
    }

    /// The transform of a sub-grid whose upper left pixel is (`row_offset`, `col_offset`) of this grid
    #[must_use]
    pub fn translated_by_pixels(&self, col_offset: usize, row_offset: usize) -> Self {
        Self {
            origin_coordinate: self
                .fractional_pixel_to_coordinate(col_offset as f64, row_offset as f64),
            ..*self
        }
    }

    /// The world extent of a grid with `shape` using this transform, spanning all four grid corners
    pub fn grid_bounds(&self, shape: GridShape2D) -> BoundingBox2D {
        let width = shape.axis_size_x() as f64;
        let height = shape.axis_size_y() as f64;

        let corners = [
            self.origin_coordinate,
            self.fractional_pixel_to_coordinate(width, 0.),
            self.fractional_pixel_to_coordinate(0., height),
            self.fractional_pixel_to_coordinate(width, height),
        ];
        let (min, max) = corners[1..]
            .iter()
            .fold((corners[0], corners[0]), |(min, max), &c| {
                (min.min_elements(c), max.max_elements(c))
            });
        BoundingBox2D::new_unchecked(min, max)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        GeoTransform::new_with_coordinate_x_y(0.0, 1.0, 0.0, -1.0)
    }
}

impl TryFrom<GdalGeoTransform> for GeoTransform {
    type Error = error::Error;

    fn try_from(gdal_geo_transform: GdalGeoTransform) -> Result<Self> {
        let [origin_x, x_pixel_size, x_rotation, origin_y, y_rotation, y_pixel_size] =
            gdal_geo_transform;

        let geo_transform =
            Self::new_with_coordinate_x_y(origin_x, x_pixel_size, origin_y, y_pixel_size)
                .with_rotation(x_rotation, y_rotation);
        ensure!(
            geo_transform.is_invertible(),
            error::NonInvertibleGeoTransform {
                geo_transform: gdal_geo_transform
            }
        );

        Ok(geo_transform)
    }
}

impl From<GeoTransform> for GdalGeoTransform {
    fn from(geo_transform: GeoTransform) -> GdalGeoTransform {
        [
            geo_transform.origin_coordinate.x,
            geo_transform.x_pixel_size,
            geo_transform.x_rotation,
            geo_transform.origin_coordinate.y,
            geo_transform.y_rotation,
            geo_transform.y_pixel_size,
        ]
    }
}
