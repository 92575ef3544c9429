use crate::io::dataset::{BandMetadata, GcpSet, MaskedBand, RasterDataset};
use crate::types::{Affine, Crs, DataType, StacError, StacResult};
use ndarray::Array2;
use std::cell::Cell;
use std::collections::HashMap;

/// Raster dataset held in memory
///
/// Useful for arrays that never touch disk. Reads resample with nearest
/// neighbour and derive the mask from the band's nodata value.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    name: String,
    driver: String,
    width: usize,
    height: usize,
    crs: Option<Crs>,
    transform: Affine,
    bands: Vec<(BandMetadata, Array2<f64>)>,
    tags: HashMap<(String, String), String>,
    gcps: Option<GcpSet>,
    reads: Cell<usize>,
}

impl MemoryRaster {
    pub fn new(name: &str, width: usize, height: usize) -> Self {
        Self {
            name: name.to_string(),
            driver: "MEM".to_string(),
            width,
            height,
            crs: None,
            transform: Affine::identity(),
            bands: Vec::new(),
            tags: HashMap::new(),
            gcps: None,
            reads: Cell::new(0),
        }
    }

    pub fn with_driver(mut self, driver: &str) -> Self {
        self.driver = driver.to_string();
        self
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_gcps(mut self, gcps: GcpSet) -> Self {
        self.gcps = Some(gcps);
        self
    }

    /// Add a float64 band with an optional nodata value
    pub fn with_band(self, data: Array2<f64>, nodata: Option<f64>) -> Self {
        let mut metadata = BandMetadata::new(DataType::Float64);
        metadata.nodata = nodata;
        self.with_band_metadata(data, metadata)
    }

    pub fn with_band_metadata(mut self, data: Array2<f64>, metadata: BandMetadata) -> Self {
        self.bands.push((metadata, data));
        self
    }

    /// Set a metadata item; an empty domain is the default domain
    pub fn with_tag(mut self, key: &str, value: &str, domain: &str) -> Self {
        self.tags
            .insert((domain.to_string(), key.to_string()), value.to_string());
        self
    }

    /// Number of band reads served so far
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    fn band_entry(&self, index: usize) -> StacResult<&(BandMetadata, Array2<f64>)> {
        index
            .checked_sub(1)
            .and_then(|i| self.bands.get(i))
            .ok_or_else(|| {
                StacError::Raster(format!(
                    "band index {} out of range 1..={}",
                    index,
                    self.bands.len()
                ))
            })
    }
}

fn is_nodata(value: f64, nodata: Option<f64>) -> bool {
    match nodata {
        Some(nd) if nd.is_nan() => value.is_nan(),
        Some(nd) => value == nd,
        None => false,
    }
}

impl RasterDataset for MemoryRaster {
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
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn band(&self, index: usize) -> StacResult<BandMetadata> {
        Ok(self.band_entry(index)?.0.clone())
    }

    fn tag(&self, key: &str, domain: &str) -> Option<String> {
        self.tags
            .get(&(domain.to_string(), key.to_string()))
            .cloned()
    }

    fn gcps(&self) -> Option<&GcpSet> {
        self.gcps.as_ref()
    }

    fn read_masked(&self, index: usize, shape: (usize, usize)) -> StacResult<MaskedBand> {
        let (metadata, source) = self.band_entry(index)?;
        self.reads.set(self.reads.get() + 1);

        let (src_rows, src_cols) = source.dim();
        if source.is_empty() {
            return Err(StacError::Raster(format!("band {} holds no data", index)));
        }
        let (rows, cols) = shape;
        let data = Array2::from_shape_fn((rows, cols), |(r, c)| {
            let sr = (((r as f64 + 0.5) * src_rows as f64 / rows as f64) as usize).min(src_rows - 1);
            let sc = (((c as f64 + 0.5) * src_cols as f64 / cols as f64) as usize).min(src_cols - 1);
            source[[sr, sc]]
        });
        let mask = data.mapv(|v| !is_nodata(v, metadata.nodata));

        Ok(MaskedBand::new(data, mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_read_native_and_downsampled() {
        let raster = MemoryRaster::new("mem", 4, 2).with_band(
            array![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, -1.0]],
            Some(-1.0),
        );

        let native = raster.read_masked(1, (2, 4)).unwrap();
        assert_eq!(native.data[[1, 3]], -1.0);
        assert!(!native.mask[[1, 3]]);
        assert_eq!(native.valid_count(), 7);

        let small = raster.read_masked(1, (1, 2)).unwrap();
        assert_eq!(small.data.dim(), (1, 2));
        assert_eq!(raster.read_count(), 2);
    }

    #[test]
    fn test_band_index_is_one_based() {
        let raster = MemoryRaster::new("mem", 1, 1).with_band(array![[0.0]], None);
        assert!(raster.band(1).is_ok());
        assert!(raster.band(0).is_err());
        assert!(raster.band(2).is_err());
    }

    #[test]
    fn test_tags_by_domain() {
        let raster = MemoryRaster::new("mem", 1, 1).with_tag("CLOUDCOVER", "12", "IMAGERY");
        assert_eq!(raster.tag("CLOUDCOVER", "IMAGERY").as_deref(), Some("12"));
        assert_eq!(raster.tag("CLOUDCOVER", ""), None);
    }
}
