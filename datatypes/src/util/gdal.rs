use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use snafu::ResultExt;
use std::path::Path;

use crate::error;
use crate::util::Result;

/// Opens a Gdal raster Dataset with the given `path` in read-only mode.
/// Other crates should use this method for Gdal Dataset access.
pub fn gdal_open_dataset(path: &Path) -> Result<Dataset> {
    gdal_open_dataset_ex(
        path,
        DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_READONLY | GdalOpenFlags::GDAL_OF_RASTER,
            ..DatasetOptions::default()
        },
    )
}

/// Opens a Gdal Dataset with the given `path` and `dataset_options`.
pub fn gdal_open_dataset_ex(path: &Path, dataset_options: DatasetOptions) -> Result<Dataset> {
    let dataset_options = {
        let mut dataset_options = dataset_options;
        dataset_options.open_flags |= GdalOpenFlags::GDAL_OF_VERBOSE_ERROR;
        dataset_options
    };

    Dataset::open_ex(path, dataset_options).context(error::Gdal)
}
