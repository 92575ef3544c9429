use crate::io::dataset::{BandMetadata, Gcp, GcpSet, MaskedBand, RasterDataset};
use crate::types::{Affine, Crs, DataType, StacError, StacResult};
use gdal::raster::RasterBand;
use gdal::{Dataset, Metadata};
use ndarray::Array2;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::Path;

/// Raster dataset opened through GDAL
///
/// The underlying dataset is closed when the value is dropped.
pub struct GdalRaster {
    dataset: Dataset,
    name: String,
    driver: String,
    crs: Option<Crs>,
    transform: Affine,
    gcps: Option<GcpSet>,
}

impl GdalRaster {
    pub fn open<P: AsRef<Path>>(path: P) -> StacResult<Self> {
        log::info!("Opening raster: {}", path.as_ref().display());
        let dataset = Dataset::open(path.as_ref())?;
        Self::from_dataset(dataset, path.as_ref().to_string_lossy().to_string())
    }

    /// Wrap an already-open GDAL dataset
    pub fn from_dataset(dataset: Dataset, name: String) -> StacResult<Self> {
        let driver = dataset.driver().short_name();

        let wkt = dataset.projection();
        let crs = if wkt.is_empty() {
            None
        } else {
            Some(Crs::from_wkt(&wkt)?)
        };

        let transform = dataset
            .geo_transform()
            .map(Affine::from_gdal)
            .unwrap_or_else(|_| Affine::identity());

        let gcps = read_gcps(&dataset);

        let (width, height) = dataset.raster_size();
        log::debug!("Driver: {}, size: {}x{}", driver, width, height);
        log::debug!("Transform: {:?}", transform);

        Ok(Self {
            dataset,
            name,
            driver,
            crs,
            transform,
            gcps,
        })
    }

    fn rasterband(&self, index: usize) -> StacResult<RasterBand<'_>> {
        if index == 0 || index > self.band_count() {
            return Err(StacError::Raster(format!(
                "band index {} out of range 1..={}",
                index,
                self.band_count()
            )));
        }
        Ok(self.dataset.rasterband(index as isize)?)
    }
}

fn c_str_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let value = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().to_string();
    (!value.is_empty()).then_some(value)
}

fn read_gcps(dataset: &Dataset) -> Option<GcpSet> {
    unsafe {
        let handle = dataset.c_dataset();
        let count = gdal_sys::GDALGetGCPCount(handle);
        if count <= 0 {
            return None;
        }

        let raw = gdal_sys::GDALGetGCPs(handle);
        if raw.is_null() {
            return None;
        }
        let gcps = std::slice::from_raw_parts(raw, count as usize)
            .iter()
            .map(|g| Gcp {
                pixel: g.dfGCPPixel,
                line: g.dfGCPLine,
                x: g.dfGCPX,
                y: g.dfGCPY,
                z: g.dfGCPZ,
            })
            .collect();

        let crs = c_str_to_string(gdal_sys::GDALGetGCPProjection(handle))
            .and_then(|wkt| Crs::from_wkt(&wkt).ok());

        log::debug!("Dataset carries {} GCPs", count);
        Some(GcpSet { gcps, crs })
    }
}

impl RasterDataset for GdalRaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn driver(&self) -> &str {
        &self.driver
    }

    fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn width(&self) -> usize {
        self.dataset.raster_size().0
    }

    fn height(&self) -> usize {
        self.dataset.raster_size().1
    }

    fn band_count(&self) -> usize {
        self.dataset.raster_count() as usize
    }

    fn band(&self, index: usize) -> StacResult<BandMetadata> {
        let band = self.rasterband(index)?;

        let (data_type, scale, offset, color_interp) = unsafe {
            let handle = band.c_rasterband();
            let type_name = c_str_to_string(gdal_sys::GDALGetDataTypeName(
                gdal_sys::GDALGetRasterDataType(handle),
            ));
            let scale = gdal_sys::GDALGetRasterScale(handle, std::ptr::null_mut());
            let offset = gdal_sys::GDALGetRasterOffset(handle, std::ptr::null_mut());
            let color = c_str_to_string(gdal_sys::GDALGetColorInterpretationName(
                gdal_sys::GDALGetRasterColorInterpretation(handle),
            ));
            (
                type_name.map(|n| DataType::from_gdal_name(&n)).unwrap_or(DataType::Other),
                scale,
                offset,
                color.unwrap_or_else(|| "undefined".to_string()).to_lowercase(),
            )
        };

        let unit = band.unit();
        let description = band.description().ok().filter(|d| !d.is_empty());

        Ok(BandMetadata {
            data_type,
            scale,
            offset,
            nodata: band.no_data_value(),
            unit: (!unit.is_empty()).then_some(unit),
            color_interp,
            description,
        })
    }

    fn tag(&self, key: &str, domain: &str) -> Option<String> {
        self.dataset.metadata_item(key, domain)
    }

    fn gcps(&self) -> Option<&GcpSet> {
        self.gcps.as_ref()
    }

    fn read_masked(&self, index: usize, shape: (usize, usize)) -> StacResult<MaskedBand> {
        let band = self.rasterband(index)?;
        let (rows, cols) = shape;
        let window_size = (self.width(), self.height());
        log::debug!("Reading band {} at {}x{}", index, cols, rows);

        let values = band.read_as::<f64>((0, 0), window_size, (cols, rows), None)?;
        let data = Array2::from_shape_vec((rows, cols), values.data)
            .map_err(|e| StacError::Raster(format!("Failed to reshape band data: {}", e)))?;

        let mask_band = band.open_mask_band()?;
        let flags = mask_band.read_as::<u8>((0, 0), window_size, (cols, rows), None)?;
        let mask = Array2::from_shape_vec(
            (rows, cols),
            flags.data.into_iter().map(|v| v > 0).collect(),
        )
        .map_err(|e| StacError::Raster(format!("Failed to reshape mask data: {}", e)))?;

        Ok(MaskedBand::new(data, mask))
    }
}
