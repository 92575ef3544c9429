//! rio-stac: create STAC Items from raster datasets
//!
//! Reads a raster through GDAL and describes it as a SpatioTemporal Asset
//! Catalog Item: footprint and bbox in geographic coordinates, projection,
//! raster and eo extension fields, and a single asset pointing back at the file.

pub mod types;
pub mod stac;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    Affine, Bounds, Crs, DataType, Diagnostics, InvalidArgument, Nodata, StacError, StacResult, StacWarning,
};

pub use stac::{Asset, ExtensionSet, Geometry, Link, MediaType, StacExtension, StacItem};

pub use io::{GdalRaster, MemoryRaster, RasterDataset};

pub use crate::core::{create_stac_item, create_stac_items, CreatedItem, DatetimeInput, ItemOptions, Source};

#[cfg(feature = "python")]
mod python {
    use crate::core::{create_stac_item, parse_datetime, AssetMediaType, DatetimeInput, ItemOptions, Source};
    use crate::types::{Crs, InvalidArgument, StacError};
    use pyo3::prelude::*;
    use std::collections::HashMap;
    use std::path::Path;

    fn to_py_err(err: StacError) -> PyErr {
        match err {
            StacError::InvalidArgument(e) => PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()),
            e => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}", e)),
        }
    }

    fn invalid(err: InvalidArgument) -> PyErr {
        to_py_err(err.into())
    }

    /// Create a STAC Item and return it as a JSON string
    #[pyfunction]
    #[pyo3(
        name = "create_stac_item",
        signature = (
            source,
            input_datetime = None,
            extensions = None,
            collection = None,
            collection_url = None,
            properties = None,
            id = None,
            asset_name = "asset".to_string(),
            asset_roles = None,
            asset_media_type = "auto".to_string(),
            asset_href = None,
            with_proj = false,
            with_raster = false,
            with_eo = false,
            raster_max_size = 1024,
            geom_densify_pts = 0,
            geom_precision = -1,
            geographic_crs = None,
            histogram_bins = None,
            histogram_range = None,
        )
    )]
    #[allow(clippy::too_many_arguments)]
    fn py_create_stac_item(
        source: String,
        input_datetime: Option<String>,
        extensions: Option<Vec<String>>,
        collection: Option<String>,
        collection_url: Option<String>,
        properties: Option<HashMap<String, String>>,
        id: Option<String>,
        asset_name: String,
        asset_roles: Option<Vec<String>>,
        asset_media_type: String,
        asset_href: Option<String>,
        with_proj: bool,
        with_raster: bool,
        with_eo: bool,
        raster_max_size: usize,
        geom_densify_pts: i32,
        geom_precision: i32,
        geographic_crs: Option<String>,
        histogram_bins: Option<usize>,
        histogram_range: Option<(f64, f64)>,
    ) -> PyResult<String> {
        let input_datetime = input_datetime
            .map(|value| value.parse::<DatetimeInput>())
            .transpose()
            .map_err(invalid)?;

        let asset_media_type = match asset_media_type.as_str() {
            "" => AssetMediaType::Omit,
            other => other.parse::<AssetMediaType>().map_err(invalid)?,
        };

        let geographic_crs = match geographic_crs {
            Some(definition) => Crs::from_user_input(&definition).map_err(to_py_err)?,
            None => Crs::wgs84(),
        };

        let options = ItemOptions {
            input_datetime,
            extensions: extensions.unwrap_or_default(),
            collection,
            collection_url,
            properties: properties
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect(),
            id,
            asset_name,
            asset_roles: asset_roles.unwrap_or_default(),
            asset_media_type,
            asset_href,
            with_proj,
            with_raster,
            with_eo,
            raster_max_size,
            geom_densify_pts,
            geom_precision,
            geographic_crs,
            histogram_bins,
            histogram_range,
            ..ItemOptions::default()
        };

        let created = create_stac_item(Source::Path(Path::new(&source)), &options).map_err(to_py_err)?;
        created.item.to_json().map_err(|e| to_py_err(e.into()))
    }

    /// Parse a timestamp the way item datetimes are parsed; returns RFC 3339
    #[pyfunction]
    fn normalize_datetime(value: String) -> PyResult<String> {
        parse_datetime(&value)
            .map(|dt| crate::stac::format_datetime(&dt))
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", e)))
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(py_create_stac_item, m)?)?;
        m.add_function(wrap_pyfunction!(normalize_datetime, m)?)?;
        m.add("STAC_VERSION", crate::stac::STAC_VERSION)?;
        Ok(())
    }
}
