use serde::{Deserialize, Serialize};
use snafu::ensure;

use super::{GeoTransform, GridShape2D};
use crate::error;
use crate::primitives::BoundingBox2D;
use crate::util::Result;

/// A rectangular block of pixels of a raster grid.
///
/// A window always lies inside the grid it was created for and is never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelWindow {
    pub col_offset: usize,
    pub row_offset: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    pub fn new(
        col_offset: usize,
        row_offset: usize,
        width: usize,
        height: usize,
        grid_shape: GridShape2D,
    ) -> Result<Self> {
        let fits = |offset: usize, size: usize, axis_size: usize| {
            size > 0 && offset.checked_add(size).is_some_and(|end| end <= axis_size)
        };
        ensure!(
            fits(col_offset, width, grid_shape.axis_size_x())
                && fits(row_offset, height, grid_shape.axis_size_y()),
            error::InvalidPixelWindow {
                col_offset,
                row_offset,
                width,
                height,
                grid_width: grid_shape.axis_size_x(),
                grid_height: grid_shape.axis_size_y(),
            }
        );

        Ok(Self {
            col_offset,
            row_offset,
            width,
            height,
        })
    }

    /// The window spanning a whole grid
    pub fn full(grid_shape: GridShape2D) -> Result<Self> {
        Self::new(
            0,
            0,
            grid_shape.axis_size_x(),
            grid_shape.axis_size_y(),
            grid_shape,
        )
    }

    pub fn shape(&self) -> GridShape2D {
        [self.height, self.width].into()
    }

    /// The transform of the window's own grid
    pub fn geo_transform(&self, grid_geo_transform: &GeoTransform) -> GeoTransform {
        grid_geo_transform.translated_by_pixels(self.col_offset, self.row_offset)
    }

    /// `(x, y)` offset as used by GDAL reads
    pub fn gdal_offset(&self) -> (isize, isize) {
        (self.col_offset as isize, self.row_offset as isize)
    }

    /// `(width, height)` as used by GDAL reads
    pub fn gdal_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

impl std::fmt::Display for PixelWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cols {}..{}, rows {}..{}",
            self.col_offset,
            self.col_offset + self.width,
            self.row_offset,
            self.row_offset + self.height
        )
    }
}

/// Result of planning the pixel block a bounding box touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum WindowPlan {
    Window { window: PixelWindow },
    /// The bounding box does not intersect the raster extent
    OutsideRaster,
    /// The clamped pixel rectangle has zero width or height
    Empty,
}

impl WindowPlan {
    pub fn window(&self) -> Option<PixelWindow> {
        match self {
            WindowPlan::Window { window } => Some(*window),
            WindowPlan::OutsideRaster | WindowPlan::Empty => None,
        }
    }
}

/// Computes the smallest pixel window covering `bbox` (in raster world coordinates),
/// clamped to the grid.
///
/// # Examples
///
/// ```
/// use valor_datatypes::primitives::BoundingBox2D;
/// use valor_datatypes::raster::{plan_window, GeoTransform, PixelWindow, WindowPlan};
///
/// let geo_transform = GeoTransform::new_with_coordinate_x_y(0.0, 1.0, 10.0, -1.0);
/// let bbox = BoundingBox2D::new((2.5, 2.5).into(), (4.0, 6.2).into()).unwrap();
///
/// let plan = plan_window(bbox, &geo_transform, [10, 10].into());
/// assert_eq!(plan.window().unwrap(), PixelWindow { col_offset: 2, row_offset: 3, width: 2, height: 5 });
/// ```
pub fn plan_window(
    bbox: BoundingBox2D,
    geo_transform: &GeoTransform,
    grid_shape: GridShape2D,
) -> WindowPlan {
    let raster_bounds = geo_transform.grid_bounds(grid_shape);
    if !bbox.intersects_bbox(&raster_bounds) {
        return WindowPlan::OutsideRaster;
    }

    // under rotation any corner of the bbox may be extreme in pixel space
    let corners = [
        bbox.upper_left(),
        bbox.upper_right(),
        bbox.lower_left(),
        bbox.lower_right(),
    ]
    .map(|corner| geo_transform.coordinate_to_fractional_pixel(corner));
    let columns = corners.map(|(column, _)| column);
    let rows = corners.map(|(_, row)| row);

    let (col_start, col_end) = clamp_axis(&columns, grid_shape.axis_size_x());
    let (row_start, row_end) = clamp_axis(&rows, grid_shape.axis_size_y());

    if col_end <= col_start || row_end <= row_start {
        return WindowPlan::Empty;
    }

    WindowPlan::Window {
        window: PixelWindow {
            col_offset: col_start,
            row_offset: row_start,
            width: col_end - col_start,
            height: row_end - row_start,
        },
    }
}

/// floor of the lowest, ceil of the highest value, both clamped to `[0, axis_size]`
fn clamp_axis(values: &[f64], axis_size: usize) -> (usize, usize) {
    let clamp = |v: f64| v.clamp(0., axis_size as f64) as usize;
    let lower = values.iter().copied().fold(f64::INFINITY, f64::min);
    let upper = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (clamp(lower.floor()), clamp(upper.ceil()))
}
