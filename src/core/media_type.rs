use crate::io::RasterDataset;
use crate::stac::MediaType;
use crate::types::{Diagnostics, StacWarning};

/// Media type written by a GDAL driver
///
/// `GTiff` output is GeoTIFF only when it carries a CRS.
pub fn media_type_for_driver(driver: &str, has_crs: bool) -> Option<MediaType> {
    match driver {
        "GTiff" if has_crs => Some(MediaType::GeoTiff),
        "GTiff" => Some(MediaType::Tiff),
        "JP2ECW" | "JP2KAK" | "JP2LURA" | "JP2MrSID" | "JP2OpenJPEG" | "JPEG2000" => Some(MediaType::Jpeg2000),
        "HDF4" | "HDF4Image" => Some(MediaType::Hdf),
        "HDF5" | "HDF5Image" => Some(MediaType::Hdf5),
        "JPEG" => Some(MediaType::Jpeg),
        "PNG" => Some(MediaType::Png),
        _ => None,
    }
}

/// Media type of an open dataset; unknown drivers warn and yield `None`
pub fn get_media_type(dataset: &dyn RasterDataset, diagnostics: &mut Diagnostics) -> Option<MediaType> {
    let media_type = media_type_for_driver(dataset.driver(), dataset.crs().is_some());
    if media_type.is_none() {
        diagnostics.warn(StacWarning::UnknownDriver {
            driver: dataset.driver().to_string(),
        });
    }
    media_type
}
