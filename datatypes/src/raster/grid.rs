use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::error;
use crate::util::Result;

/// Index of a grid cell as `[row, column]` ~ `[y, x]`. May lie outside of a grid.
pub type GridIdx2D = [isize; 2];

/// The shape of a two-dimensional grid as `[rows, columns]` ~ `[y, x]`
#[derive(PartialEq, Eq, Debug, Copy, Clone, Serialize, Deserialize)]
pub struct GridShape2D {
    pub shape_array: [usize; 2],
}

impl GridShape2D {
    pub fn new(shape_array: [usize; 2]) -> Self {
        Self { shape_array }
    }

    pub fn axis_size_y(&self) -> usize {
        self.shape_array[0]
    }

    pub fn axis_size_x(&self) -> usize {
        self.shape_array[1]
    }

    pub fn number_of_elements(&self) -> usize {
        self.axis_size_y() * self.axis_size_x()
    }

    /// Returns true if `[row, column]` addresses a cell of this shape
    pub fn contains(&self, grid_index: GridIdx2D) -> bool {
        let [y, x] = grid_index;
        y >= 0 && x >= 0 && (y as usize) < self.axis_size_y() && (x as usize) < self.axis_size_x()
    }

    fn linear_space_index_unchecked(&self, row: usize, column: usize) -> usize {
        row * self.axis_size_x() + column
    }
}

impl From<[usize; 2]> for GridShape2D {
    fn from(shape_array: [usize; 2]) -> Self {
        Self { shape_array }
    }
}

/// A row-major two-dimensional grid
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Grid2D<T> {
    pub shape: GridShape2D,
    pub data: Vec<T>,
}

impl<T> Grid2D<T> {
    /// Creates a new `Grid2D`
    ///
    /// # Errors
    ///
    /// This constructor fails if the data container's capacity is different from the grid's dimension number
    ///
    pub fn new(shape: GridShape2D, data: Vec<T>) -> Result<Self> {
        ensure!(
            shape.number_of_elements() == data.len(),
            error::DimensionCapacityDoesNotMatchDataCapacity {
                dimension_cap: shape.number_of_elements(),
                data_cap: data.len()
            }
        );

        Ok(Self { shape, data })
    }

    pub fn new_filled(shape: GridShape2D, fill_value: T) -> Self
    where
        T: Clone,
    {
        let data = vec![fill_value; shape.number_of_elements()];
        Self { shape, data }
    }

    pub fn axis_size_y(&self) -> usize {
        self.shape.axis_size_y()
    }

    pub fn axis_size_x(&self) -> usize {
        self.shape.axis_size_x()
    }

    pub fn get_at(&self, row: usize, column: usize) -> Option<&T> {
        if row >= self.axis_size_y() || column >= self.axis_size_x() {
            return None;
        }
        self.data
            .get(self.shape.linear_space_index_unchecked(row, column))
    }

    /// A mutable slice of one row of the grid
    ///
    /// # Panics
    ///
    /// If `row` is outside of the grid
    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        let width = self.axis_size_x();
        let start = row * width;
        &mut self.data[start..start + width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // `chunks_exact` panics on zero
        self.data.chunks_exact(self.axis_size_x().max(1))
    }
}
