use crate::io::dataset::{BandMetadata, GcpSet, MaskedBand, RasterDataset};
use crate::types::{Affine, Crs, StacError, StacResult};

/// Georeferenced view of a GCP-only dataset
///
/// Takes its CRS from the GCP set and its transform from an affine fitted
/// to the GCPs; everything else is forwarded to the wrapped dataset. The
/// view borrows the dataset, so it never outlives it.
pub struct GcpWarpedView<'a> {
    inner: &'a dyn RasterDataset,
    crs: Option<Crs>,
    transform: Affine,
}

impl<'a> GcpWarpedView<'a> {
    pub fn new(inner: &'a dyn RasterDataset, gcps: &GcpSet) -> StacResult<Self> {
        let transform = affine_from_gcps(gcps)?;
        log::debug!("GCP-fitted transform: {:?}", transform);
        Ok(Self {
            inner,
            crs: gcps.crs.clone(),
            transform,
        })
    }

    /// Wrap `dataset` if it is referenced by GCPs, otherwise `None`
    pub fn resolve(dataset: &'a dyn RasterDataset) -> StacResult<Option<Self>> {
        match dataset.gcps() {
            Some(gcps) if !gcps.gcps.is_empty() => {
                log::info!("Using GCP-derived georeferencing for {}", dataset.name());
                Ok(Some(Self::new(dataset, gcps)?))
            }
            _ => Ok(None),
        }
    }
}

/// Least-squares affine fit of the GCPs (GDAL `GDALGCPsToGeoTransform`)
pub fn affine_from_gcps(gcps: &GcpSet) -> StacResult<Affine> {
    let raw: Vec<gdal_sys::GDAL_GCP> = gcps
        .gcps
        .iter()
        .map(|g| gdal_sys::GDAL_GCP {
            pszId: std::ptr::null_mut(),
            pszInfo: std::ptr::null_mut(),
            dfGCPPixel: g.pixel,
            dfGCPLine: g.line,
            dfGCPX: g.x,
            dfGCPY: g.y,
            dfGCPZ: g.z,
        })
        .collect();

    let mut gt = [0.0f64; 6];
    let ok = unsafe {
        gdal_sys::GDALGCPsToGeoTransform(raw.len() as i32, raw.as_ptr(), gt.as_mut_ptr(), 1)
    };
    if ok == 0 {
        return Err(StacError::Raster(format!(
            "Could not fit a transform to {} GCPs",
            raw.len()
        )));
    }
    Ok(Affine::from_gdal(gt))
}

impl RasterDataset for GcpWarpedView<'_> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn driver(&self) -> &str {
        self.inner.driver()
    }

    fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn width(&self) -> usize {
        self.inner.width()
    }

    fn height(&self) -> usize {
        self.inner.height()
    }

    fn band_count(&self) -> usize {
        self.inner.band_count()
    }

    fn band(&self, index: usize) -> StacResult<BandMetadata> {
        self.inner.band(index)
    }

    fn tag(&self, key: &str, domain: &str) -> Option<String> {
        self.inner.tag(key, domain)
    }

    fn gcps(&self) -> Option<&GcpSet> {
        None
    }

    fn read_masked(&self, index: usize, shape: (usize, usize)) -> StacResult<MaskedBand> {
        self.inner.read_masked(index, shape)
    }
}
