use snafu::ensure;
use tracing::instrument;
use valor_datatypes::primitives::{Coordinate2D, MultiPolygon};
use valor_datatypes::raster::{GeoTransform, Grid2D, PixelWindow};

use crate::error;
use crate::util::Result;

/// Burns a `MultiPolygon` into a boolean mask by scanlines through the pixel centres.
///
/// A cell is `true` iff its pixel centre lies inside the geometry or on its boundary.
/// Each polygon is filled with the even-odd rule over all of its rings, so holes are
/// excluded and the result does not depend on the winding of the rings.
///
/// The rings are mapped into the pixel space of the raster (x = column, y = row) through the
/// inverse geo transform, so rotated and sheared grids are scanned like north-up ones.
/// Pixel centres are derived from the global pixel index, so rasterizing a window yields
/// the same cells as the corresponding part of a whole-grid rasterization.
pub struct MaskRasterizer {
    polygons: Vec<PolygonEdges>,
}

struct PolygonEdges {
    edges: Vec<Edge>,
    y_min: f64,
    y_max: f64,
}

/// A ring segment with precalculated slope
struct Edge {
    start: Coordinate2D,
    end: Coordinate2D,
    /// change of x per unit of y, zero for horizontal edges
    dx_dy: f64,
    horizontal: bool,
}

impl Edge {
    #[allow(clippy::float_cmp)]
    fn new(start: Coordinate2D, end: Coordinate2D) -> Self {
        let horizontal = start.y == end.y;
        let dx_dy = if horizontal {
            0.
        } else {
            (end.x - start.x) / (end.y - start.y)
        };

        Self {
            start,
            end,
            dx_dy,
            horizontal,
        }
    }

    #[inline]
    fn x_at(&self, y: f64) -> f64 {
        self.start.x + (y - self.start.y) * self.dx_dy
    }

    /// half-open crossing rule, each vertex is counted by exactly one of its edges
    #[inline]
    fn crosses(&self, y: f64) -> bool {
        (self.start.y < y && self.end.y >= y) || (self.end.y < y && self.start.y >= y)
    }

    #[inline]
    fn touches(&self, y: f64) -> bool {
        self.start.y.min(self.end.y) <= y && y <= self.start.y.max(self.end.y)
    }

    /// The x range of the edge on the scanline `y`, if it touches it
    fn boundary_span(&self, y: f64) -> Option<(f64, f64)> {
        if !self.touches(y) {
            return None;
        }

        if self.horizontal {
            Some((self.start.x.min(self.end.x), self.start.x.max(self.end.x)))
        } else {
            let x = self.x_at(y);
            Some((x, x))
        }
    }
}

impl PolygonEdges {
    fn new(rings: &[Vec<Coordinate2D>]) -> Self {
        let edges: Vec<Edge> = rings
            .iter()
            .flat_map(|ring| ring.windows(2).map(|pair| Edge::new(pair[0], pair[1])))
            .collect();

        let (y_min, y_max) = edges.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(y_min, y_max), edge| {
                (
                    y_min.min(edge.start.y).min(edge.end.y),
                    y_max.max(edge.start.y).max(edge.end.y),
                )
            },
        );

        Self {
            edges,
            y_min,
            y_max,
        }
    }

    /// Collects the inclusive x spans of the polygon on the scanline `y`
    fn spans(&self, y: f64, crossings: &mut Vec<f64>, spans: &mut Vec<(f64, f64)>) {
        if y < self.y_min || y > self.y_max {
            return;
        }

        crossings.clear();
        crossings.extend(
            self.edges
                .iter()
                .filter(|edge| !edge.horizontal && edge.crosses(y))
                .map(|edge| edge.x_at(y)),
        );
        crossings.sort_unstable_by(f64::total_cmp);

        spans.extend(crossings.chunks_exact(2).map(|pair| (pair[0], pair[1])));
        spans.extend(self.edges.iter().filter_map(|edge| edge.boundary_span(y)));
    }
}

impl MaskRasterizer {
    /// Prepares `geometry`, given in raster world coordinates, for the grid of `geo_transform`.
    pub fn new(geometry: &MultiPolygon, geo_transform: &GeoTransform) -> Result<Self> {
        if !geo_transform.is_invertible() {
            return Err(valor_datatypes::error::Error::NonInvertibleGeoTransform {
                geo_transform: (*geo_transform).into(),
            }
            .into());
        }

        let pixel_geometry =
            geometry.try_map_coordinates(|coordinate| to_pixel_space(geo_transform, coordinate))?;

        let polygons = pixel_geometry
            .polygons()
            .iter()
            .map(|polygon| PolygonEdges::new(polygon))
            .collect();

        Ok(Self { polygons })
    }

    /// Rasterizes the geometry into a mask of `window`'s shape.
    ///
    /// `window` is a window of the grid the rasterizer was prepared for.
    #[instrument(skip_all, fields(window = %window))]
    pub fn rasterize(&self, window: &PixelWindow) -> Grid2D<bool> {
        let mut mask = Grid2D::new_filled(window.shape(), false);

        let mut crossings = Vec::new();
        let mut spans = Vec::new();

        for window_row in 0..window.height {
            let row_centre = (window.row_offset + window_row) as f64 + 0.5;

            spans.clear();
            for polygon in &self.polygons {
                polygon.spans(row_centre, &mut crossings, &mut spans);
            }

            let mask_row = mask.row_mut(window_row);
            for &(x_start, x_end) in &spans {
                if let Some((first, last)) = covered_columns(window, x_start, x_end) {
                    mask_row[first..=last].fill(true);
                }
            }
        }

        mask
    }
}

/// Maps a world coordinate to fractional (column, row) as (x, y)
fn to_pixel_space(geo_transform: &GeoTransform, coordinate: Coordinate2D) -> Result<Coordinate2D> {
    let (column, row) = geo_transform.coordinate_to_fractional_pixel(coordinate);
    ensure!(
        column.is_finite() && row.is_finite(),
        error::UnrasterizableCoordinate { coordinate }
    );
    Ok(Coordinate2D::new(column, row))
}

/// The window columns whose pixel centres `c + 0.5` lie in `[x_start, x_end]`
fn covered_columns(window: &PixelWindow, x_start: f64, x_end: f64) -> Option<(usize, usize)> {
    let (lower, upper) = if x_start <= x_end {
        (x_start, x_end)
    } else {
        (x_end, x_start)
    };

    let first = (lower - 0.5).ceil().max(window.col_offset as f64);
    let last = (upper - 0.5)
        .floor()
        .min((window.col_offset + window.width - 1) as f64);

    if first > last || !first.is_finite() || !last.is_finite() {
        return None;
    }

    Some((
        first as usize - window.col_offset,
        last as usize - window.col_offset,
    ))
}
