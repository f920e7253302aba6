/// Calls a function on a `TypedGrid2D` by calling it on its variant.
/// Call via `call_generic_raster_2d!(input, raster => function)`.
#[macro_export]
macro_rules! call_generic_raster_2d {
    ($input_raster:expr, $raster:ident => $function_call:expr) => {
        $crate::call_generic_raster_2d!(
            @variants $input_raster, $raster => $function_call,
            U8, U16, U32, I16, I32, F32, F64
        )
    };

    (@variants $input_raster:expr, $raster:ident => $function_call:expr, $($variant:tt),+) => {
        match $input_raster {
            $(
                $crate::raster::TypedGrid2D::$variant($raster) => $function_call,
            )+
        }
    };
}

/// Calls a generic function for the pixel type named by a `RasterDataType`.
/// Call via `call_generic_raster_data_type!(data_type, T => function::<T>())`.
#[macro_export]
macro_rules! call_generic_raster_data_type {
    ($data_type:expr, $pixel:ident => $function_call:expr) => {
        $crate::call_generic_raster_data_type!(
            @variants $data_type, $pixel => $function_call,
            U8 => u8, U16 => u16, U32 => u32, I16 => i16, I32 => i32, F32 => f32, F64 => f64
        )
    };

    (@variants $data_type:expr, $pixel:ident => $function_call:expr, $($variant:tt => $ty:ty),+) => {
        match $data_type {
            $(
                $crate::raster::RasterDataType::$variant => {
                    type $pixel = $ty;
                    $function_call
                }
            )+
        }
    };
}
