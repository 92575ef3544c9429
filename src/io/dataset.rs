use crate::types::{Affine, Bounds, Crs, DataType, StacResult};
use ndarray::Array2;

/// Per-band metadata
#[derive(Debug, Clone, PartialEq)]
pub struct BandMetadata {
    pub data_type: DataType,
    pub scale: f64,
    pub offset: f64,
    pub nodata: Option<f64>,
    pub unit: Option<String>,
    /// Lower-case colour interpretation name ("gray", "red", "undefined", ...)
    pub color_interp: String,
    pub description: Option<String>,
}

impl BandMetadata {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            scale: 1.0,
            offset: 0.0,
            nodata: None,
            unit: None,
            color_interp: "undefined".to_string(),
            description: None,
        }
    }
}

/// Ground control point: pixel/line position and its world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gcp {
    pub pixel: f64,
    pub line: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Ground control points together with the CRS of their world coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct GcpSet {
    pub gcps: Vec<Gcp>,
    pub crs: Option<Crs>,
}

/// Band values with a validity mask (`true` = valid cell)
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedBand {
    pub data: Array2<f64>,
    pub mask: Array2<bool>,
}

impl MaskedBand {
    pub fn new(data: Array2<f64>, mask: Array2<bool>) -> Self {
        Self { data, mask }
    }

    /// Invalidate NaN/Inf cells that were not flagged by the mask
    pub fn fix_invalid(&mut self) {
        ndarray::Zip::from(&mut self.mask)
            .and(&self.data)
            .for_each(|valid, value| {
                if !value.is_finite() {
                    *valid = false;
                }
            });
    }

    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|v| **v).count()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Values of valid cells, in row-major order
    pub fn valid_values(&self) -> Vec<f64> {
        self.data
            .iter()
            .zip(self.mask.iter())
            .filter_map(|(value, valid)| valid.then_some(*value))
            .collect()
    }
}

/// Read-only view over a georeferenced raster dataset
///
/// Bands are addressed with 1-based indexes.
pub trait RasterDataset {
    /// Source name, usually the path the dataset was opened from
    fn name(&self) -> &str;

    /// Short name of the format driver ("GTiff", "PNG", ...)
    fn driver(&self) -> &str;

    fn crs(&self) -> Option<&Crs>;

    fn transform(&self) -> Affine;

    fn width(&self) -> usize;

    fn height(&self) -> usize;

    fn band_count(&self) -> usize;

    fn band(&self, index: usize) -> StacResult<BandMetadata>;

    /// Metadata item lookup; an empty domain is the default domain
    fn tag(&self, key: &str, domain: &str) -> Option<String>;

    fn gcps(&self) -> Option<&GcpSet>;

    /// Read a band resampled (nearest) to `shape` = (rows, cols)
    fn read_masked(&self, index: usize, shape: (usize, usize)) -> StacResult<MaskedBand>;

    fn bounds(&self) -> Bounds {
        self.transform().bounds(self.width(), self.height())
    }

    fn indexes(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.band_count()
    }
}
