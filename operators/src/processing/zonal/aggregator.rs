use snafu::ensure;
use valor_datatypes::raster::{Grid2D, GridShape2D, Pixel};

use crate::error;
use crate::source::{RasterWindowData, cast_no_data_value, valid_value};
use crate::util::Result;

/// Incrementally computes the arithmetic mean of pixel values
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanValueAggregator {
    mean: f64,
    count: usize,
}

impl MeanValueAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add_value<P>(&mut self, pixel: P)
    where
        P: Pixel,
    {
        let value: f64 = pixel.as_();

        self.count += 1;
        self.mean += (value - self.mean) / self.count as f64;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// The mean of all added values, `None` if there are none
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }
}

/// Summary of the pixels selected by a coverage mask
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// pixels whose centre is covered by the geometry
    pub covered: usize,
    /// covered pixels that hold data
    pub count: usize,
    pub mean: Option<f64>,
}

/// Averages the pixels of `data` that are covered by `coverage` and are not NoData, masked or NaN.
pub fn aggregate(data: &RasterWindowData, coverage: &Grid2D<bool>) -> Result<Aggregate> {
    let data_shape = data.data.shape();

    ensure_same_shape(coverage.shape, data_shape)?;
    if let Some(mask) = &data.mask {
        ensure_same_shape(mask.shape, data_shape)?;
    }

    Ok(valor_datatypes::call_generic_raster_2d!(&data.data, grid => {
        aggregate_grid(grid, coverage, data.mask.as_ref(), cast_no_data_value(data.no_data_value))
    }))
}

fn aggregate_grid<T: Pixel>(
    grid: &Grid2D<T>,
    coverage: &Grid2D<bool>,
    mask: Option<&Grid2D<bool>>,
    no_data_value: Option<T>,
) -> Aggregate {
    let mut aggregator = MeanValueAggregator::new();
    let mut covered = 0;

    for (index, (&value, &is_covered)) in grid.data.iter().zip(&coverage.data).enumerate() {
        if !is_covered {
            continue;
        }
        covered += 1;

        if mask.is_some_and(|mask| !mask.data[index]) {
            continue;
        }
        if let Some(value) = valid_value(value, no_data_value) {
            aggregator.add_value(value);
        }
    }

    Aggregate {
        covered,
        count: aggregator.count(),
        mean: aggregator.mean(),
    }
}

fn ensure_same_shape(mask_shape: GridShape2D, data_shape: GridShape2D) -> Result<()> {
    ensure!(
        mask_shape == data_shape,
        error::MaskShapeMismatch {
            mask_width: mask_shape.axis_size_x(),
            mask_height: mask_shape.axis_size_y(),
            data_width: data_shape.axis_size_x(),
            data_height: data_shape.axis_size_y(),
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use valor_datatypes::raster::{PixelWindow, TypedGrid2D};

    fn window_data(data: TypedGrid2D, no_data_value: Option<f64>) -> RasterWindowData {
        RasterWindowData {
            window: PixelWindow::full(data.shape()).unwrap(),
            data,
            mask: None,
            no_data_value,
        }
    }

    #[test]
    fn incremental_mean() {
        let mut aggregator = MeanValueAggregator::new();
        assert_eq!(aggregator.mean(), None);

        for value in [1_u8, 2, 3, 4, 100] {
            aggregator.add_value(value);
        }

        assert_eq!(aggregator.count(), 5);
        assert!(approx_eq!(f64, aggregator.mean().unwrap(), 22.0));
    }

    #[test]
    fn excludes_no_data_and_uncovered() {
        let data = window_data(
            Grid2D::new([2, 3].into(), vec![1_i32, -1, 3, 5, 7, 100])
                .unwrap()
                .into(),
            Some(-1.0),
        );
        let coverage =
            Grid2D::new([2, 3].into(), vec![true, true, true, true, true, false]).unwrap();

        let result = aggregate(&data, &coverage).unwrap();

        assert_eq!(result.covered, 5);
        assert_eq!(result.count, 4);
        assert!(approx_eq!(f64, result.mean.unwrap(), 4.0));
    }

    #[test]
    fn excludes_nan_and_masked() {
        let mut data = window_data(
            Grid2D::new([1, 4].into(), vec![1.0_f32, f32::NAN, 2.0, 9.0])
                .unwrap()
                .into(),
            None,
        );
        data.mask = Some(Grid2D::new([1, 4].into(), vec![true, true, true, false]).unwrap());
        let coverage = Grid2D::new_filled([1, 4].into(), true);

        let result = aggregate(&data, &coverage).unwrap();

        assert_eq!(result.count, 2);
        assert!(approx_eq!(f64, result.mean.unwrap(), 1.5));
    }

    #[test]
    fn fractional_no_data_keeps_integer_pixels() {
        let data = window_data(
            Grid2D::new([1, 4].into(), vec![0_u8, 1, 0, 3]).unwrap().into(),
            Some(0.5),
        );
        let coverage = Grid2D::new_filled([1, 4].into(), true);

        let result = aggregate(&data, &coverage).unwrap();

        assert_eq!(result.count, 4);
        assert!(approx_eq!(f64, result.mean.unwrap(), 1.0));
    }

    #[test]
    fn all_no_data() {
        let data = window_data(Grid2D::new_filled([2, 2].into(), 0_u16).into(), Some(0.0));
        let coverage = Grid2D::new_filled([2, 2].into(), true);

        let result = aggregate(&data, &coverage).unwrap();

        assert_eq!(
            result,
            Aggregate {
                covered: 4,
                count: 0,
                mean: None
            }
        );
    }

    #[test]
    fn shape_mismatch() {
        let data = window_data(Grid2D::new_filled([2, 2].into(), 1_u8).into(), None);
        let coverage = Grid2D::new_filled([2, 3].into(), true);

        assert!(matches!(
            aggregate(&data, &coverage),
            Err(error::Error::MaskShapeMismatch { .. })
        ));
    }
}
