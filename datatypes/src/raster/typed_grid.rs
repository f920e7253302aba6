use super::{Grid2D, GridShape2D};

/// A `Grid2D` of any supported pixel type
#[derive(Clone, Debug, PartialEq)]
pub enum TypedGrid2D {
    U8(Grid2D<u8>),
    U16(Grid2D<u16>),
    U32(Grid2D<u32>),
    I16(Grid2D<i16>),
    I32(Grid2D<i32>),
    F32(Grid2D<f32>),
    F64(Grid2D<f64>),
}

impl TypedGrid2D {
    pub fn shape(&self) -> GridShape2D {
        crate::call_generic_raster_2d!(self, grid => grid.shape)
    }
}

macro_rules! impl_from_grid {
    ($($variant:ident => $pixel:ty),+) => {
        $(
            impl From<Grid2D<$pixel>> for TypedGrid2D {
                fn from(grid: Grid2D<$pixel>) -> Self {
                    TypedGrid2D::$variant(grid)
                }
            }
        )+
    };
}

impl_from_grid!(U8 => u8, U16 => u16, U32 => u32, I16 => i16, I32 => i32, F32 => f32, F64 => f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access() {
        let grid: TypedGrid2D = Grid2D::new([1, 2].into(), vec![1_i16, 2]).unwrap().into();

        assert_eq!(grid.shape(), GridShape2D::new([1, 2]));

        let sum: f64 = crate::call_generic_raster_2d!(&grid, g => {
            g.data.iter().map(|v| num_traits::AsPrimitive::<f64>::as_(*v)).sum()
        });
        assert!(float_cmp::approx_eq!(f64, sum, 3.0));
    }
}
