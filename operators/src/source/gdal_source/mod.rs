use gdal::Dataset;
use gdal::raster::{GdalType, RasterBand};
use num_traits::AsPrimitive;
use serde::Serialize;
use snafu::{ResultExt, ensure};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use valor_datatypes::raster::{
    GdalGeoTransform, GeoTransform, Grid2D, GridShape2D, Pixel, PixelWindow, RasterDataType,
    TypedGrid2D,
};
use valor_datatypes::util::gdal::gdal_open_dataset;

use crate::error::{self, Error};
use crate::util::Result;

/// The transform GDAL reports for rasters without georeferencing
const GDAL_DEFAULT_GEO_TRANSFORM: GdalGeoTransform = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// The metadata of the first band of a raster and its dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterDescriptor {
    pub path: PathBuf,
    pub shape: GridShape2D,
    pub geo_transform: GeoTransform,
    /// WKT of the raster's spatial reference, empty if it has none
    pub projection_wkt: String,
    pub no_data_value: Option<f64>,
    pub data_type: RasterDataType,
}

/// How invalid pixels of a band are marked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskKind {
    AllValid,
    NoDataValue,
    /// A per-dataset mask or alpha band, read alongside the data
    MaskBand,
}

/// Pixels of one window of the first band
#[derive(Debug, Clone, PartialEq)]
pub struct RasterWindowData {
    pub window: PixelWindow,
    pub data: TypedGrid2D,
    /// `true` for pixels the mask band marks as valid
    pub mask: Option<Grid2D<bool>>,
    pub no_data_value: Option<f64>,
}

/// A read-only raster dataset, opened for the duration of one query.
///
/// The dataset is closed when the source is dropped.
pub struct GdalRasterSource {
    dataset: Dataset,
    descriptor: RasterDescriptor,
    mask_kind: MaskKind,
}

impl std::fmt::Debug for GdalRasterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GdalRasterSource")
            .field("descriptor", &self.descriptor)
            .field("mask_kind", &self.mask_kind)
            .finish_non_exhaustive()
    }
}

impl GdalRasterSource {
    #[instrument]
    pub fn open(path: &Path) -> Result<Self> {
        let dataset = gdal_open_dataset(path).context(error::RasterOpen { path })?;

        ensure!(dataset.raster_count() > 0, error::NoRasterBand { path });

        let rasterband = dataset.rasterband(1)?;

        let gdal_data_type = rasterband.band_type();
        let data_type = RasterDataType::from_gdal_data_type(gdal_data_type).ok_or_else(|| {
            Error::UnsupportedRasterType {
                gdal_data_type: format!("{gdal_data_type:?}"),
            }
        })?;

        let gdal_geo_transform = dataset.geo_transform().unwrap_or_else(|_| {
            debug!("raster has no geo transform --> use pixel coordinates.");
            GDAL_DEFAULT_GEO_TRANSFORM
        });
        let geo_transform =
            GeoTransform::try_from(gdal_geo_transform).context(error::InvalidRasterMetadata)?;

        let (width, height) = dataset.raster_size();

        let mask_flags = rasterband.mask_flags()?;
        let mask_kind = if mask_flags.is_all_valid() {
            MaskKind::AllValid
        } else if mask_flags.is_nodata() {
            MaskKind::NoDataValue
        } else {
            MaskKind::MaskBand
        };

        let descriptor = RasterDescriptor {
            path: path.to_path_buf(),
            shape: GridShape2D::new([height, width]),
            geo_transform,
            projection_wkt: dataset.projection(),
            no_data_value: rasterband.no_data_value(),
            data_type,
        };

        debug!(
            width,
            height,
            %data_type,
            no_data_value = ?descriptor.no_data_value,
            ?mask_kind,
            "opened raster"
        );

        Ok(Self {
            dataset,
            descriptor,
            mask_kind,
        })
    }

    pub fn descriptor(&self) -> &RasterDescriptor {
        &self.descriptor
    }

    pub fn mask_kind(&self) -> MaskKind {
        self.mask_kind
    }

    /// Reads the pixels of `window` together with the mask band, if the band has one
    #[instrument(skip(self, window), fields(window = %window))]
    pub fn read_window(&self, window: &PixelWindow) -> Result<RasterWindowData> {
        let rasterband = self.dataset.rasterband(1)?;

        let data = valor_datatypes::call_generic_raster_data_type!(
            self.descriptor.data_type,
            T => TypedGrid2D::from(read_grid::<T>(&rasterband, window)?)
        );

        let mask = match self.mask_kind {
            MaskKind::AllValid | MaskKind::NoDataValue => None,
            MaskKind::MaskBand => {
                debug!("use mask based no-data handling.");
                let mask_band = rasterband.open_mask_band()?;
                let mask_grid = read_grid::<u8>(&mask_band, window)?;
                Some(Grid2D::new(
                    mask_grid.shape,
                    mask_grid.data.into_iter().map(|p| p > 0).collect(),
                )?)
            }
        };

        Ok(RasterWindowData {
            window: *window,
            data,
            mask,
            no_data_value: self.descriptor.no_data_value,
        })
    }

    /// Reads a single pixel. Returns `None` if the pixel is masked, NoData or NaN.
    pub fn read_pixel(&self, row: usize, column: usize) -> Result<Option<f64>> {
        let window = PixelWindow::new(column, row, 1, 1, self.descriptor.shape)?;
        let data = self.read_window(&window)?;
        Ok(data.valid_value_at(0, 0))
    }
}

impl super::WindowReader for GdalRasterSource {
    fn descriptor(&self) -> &RasterDescriptor {
        GdalRasterSource::descriptor(self)
    }

    fn read_window(&self, window: &PixelWindow) -> Result<RasterWindowData> {
        GdalRasterSource::read_window(self, window)
    }
}

impl RasterWindowData {
    /// The value of the pixel at (`row`, `column`) of the window if it is valid
    pub fn valid_value_at(&self, row: usize, column: usize) -> Option<f64> {
        if let Some(mask) = &self.mask {
            if !mask.get_at(row, column).copied().unwrap_or(false) {
                return None;
            }
        }

        valor_datatypes::call_generic_raster_2d!(&self.data, grid => {
            let no_data_value = cast_no_data_value(self.no_data_value);
            grid.get_at(row, column)
                .and_then(|&value| valid_value(value, no_data_value))
        })
    }
}

/// Converts a band's NoData value into its pixel type.
///
/// A value that the pixel type cannot represent matches no pixel. Integer types must hold it
/// exactly, float types compare in their own precision.
pub fn cast_no_data_value<T: Pixel>(no_data_value: Option<f64>) -> Option<T> {
    let no_data_value = no_data_value?;
    let cast = num_traits::cast::<f64, T>(no_data_value)?;

    #[allow(clippy::float_cmp)]
    let exact = AsPrimitive::<f64>::as_(cast) == no_data_value;
    (exact || !T::TYPE.is_integer()).then_some(cast)
}

/// The value of a pixel as `f64` unless it is NoData or NaN
#[inline]
pub fn valid_value<T: Pixel>(value: T, no_data_value: Option<T>) -> Option<f64> {
    if no_data_value.is_some_and(|no_data| value == no_data) {
        return None;
    }

    let value: f64 = value.as_();
    if value.is_nan() { None } else { Some(value) }
}

fn read_grid<T>(rasterband: &RasterBand, window: &PixelWindow) -> Result<Grid2D<T>>
where
    T: Copy + GdalType,
{
    let buffer = rasterband.read_as::<T>(
        window.gdal_offset(), // pixelspace origin
        window.gdal_size(),   // pixelspace size
        window.gdal_size(),   // requested raster size
        None,                 // sampling mode
    )?;
    let (_, buffer_data) = buffer.into_shape_and_vec();

    Ok(Grid2D::new(window.shape(), buffer_data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test::{create_test_geotiff, create_unit_geotiff};
    use pretty_assertions::assert_eq;

    #[test]
    fn open_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_unit_geotiff(dir.path());

        let source = GdalRasterSource::open(&path).unwrap();
        let descriptor = source.descriptor();

        assert_eq!(descriptor.shape, GridShape2D::new([10, 10]));
        assert_eq!(
            descriptor.geo_transform,
            GeoTransform::new_with_coordinate_x_y(0.0, 1.0, 0.0, 1.0)
        );
        assert_eq!(descriptor.no_data_value, Some(-9999.0));
        assert_eq!(descriptor.data_type, RasterDataType::F32);
        assert!(!descriptor.projection_wkt.is_empty());
        assert_eq!(source.mask_kind(), MaskKind::NoDataValue);
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            GdalRasterSource::open(&dir.path().join("missing.tif")),
            Err(Error::RasterOpen { .. })
        ));
    }

    #[test]
    fn open_without_geo_transform() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_geotiff(
            dir.path(),
            "plain.tif",
            Grid2D::new([2, 3].into(), vec![1_u8, 2, 3, 4, 5, 6]).unwrap(),
            None,
            None,
            None,
        );

        let source = GdalRasterSource::open(&path).unwrap();

        assert_eq!(
            source.descriptor().geo_transform,
            GeoTransform::try_from(GDAL_DEFAULT_GEO_TRANSFORM).unwrap()
        );
        assert!(source.descriptor().projection_wkt.is_empty());
        assert_eq!(source.mask_kind(), MaskKind::AllValid);
    }

    #[test]
    fn read_window_of_band() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_geotiff(
            dir.path(),
            "ints.tif",
            Grid2D::new([3, 4].into(), (0_i16..12).collect()).unwrap(),
            Some(GeoTransform::new_with_coordinate_x_y(0.0, 1.0, 3.0, -1.0)),
            Some("EPSG:4326"),
            None,
        );
        let source = GdalRasterSource::open(&path).unwrap();

        let window = PixelWindow::new(1, 1, 2, 2, source.descriptor().shape).unwrap();
        let data = source.read_window(&window).unwrap();

        assert_eq!(
            data.data,
            TypedGrid2D::I16(Grid2D::new([2, 2].into(), vec![5, 6, 9, 10]).unwrap())
        );
        assert_eq!(data.mask, None);
        assert_eq!(data.valid_value_at(1, 1), Some(10.0));
    }

    #[test]
    fn read_pixel_respects_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_unit_geotiff(dir.path());
        let source = GdalRasterSource::open(&path).unwrap();

        assert_eq!(source.read_pixel(0, 0).unwrap(), Some(1.0));
        assert_eq!(source.read_pixel(5, 5).unwrap(), None);
        assert!(source.read_pixel(10, 0).is_err());
    }

    #[test]
    fn valid_values() {
        assert_eq!(valid_value(3_u8, Some(0)), Some(3.0));
        assert_eq!(valid_value(0_u8, Some(0)), None);
        assert_eq!(valid_value(f32::NAN, None), None);
        assert_eq!(valid_value(-9999.0_f32, cast_no_data_value(Some(-9999.0))), None);
        // not representable as u8
        assert_eq!(cast_no_data_value::<u8>(Some(-9999.0)), None);
    }

    #[test]
    fn fractional_no_data_matches_no_integer_pixel() {
        assert_eq!(cast_no_data_value::<u8>(Some(0.5)), None);
        assert_eq!(cast_no_data_value::<i32>(Some(-1.5)), None);
        assert_eq!(cast_no_data_value::<i16>(Some(-1.0)), Some(-1));
        // floats compare in the band's precision
        assert_eq!(cast_no_data_value::<f32>(Some(0.1)), Some(0.1_f32));
    }
}
