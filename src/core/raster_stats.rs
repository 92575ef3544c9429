use crate::io::{MaskedBand, RasterDataset};
use crate::types::{DataType, InvalidArgument, Nodata, StacResult};
use serde::Serialize;

/// Longest side of the array statistics are computed from
pub const DEFAULT_RASTER_MAX_SIZE: usize = 1024;

/// Histogram bin count when none is requested
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// Raster statistics parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStatsParams {
    /// Longest side of the sampled array; 0 reads at native resolution
    pub max_size: usize,
    pub histogram_bins: Option<usize>,
    /// Explicit (min, max) histogram range
    pub histogram_range: Option<(f64, f64)>,
}

impl Default for RasterStatsParams {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_RASTER_MAX_SIZE,
            histogram_bins: None,
            histogram_range: None,
        }
    }
}

impl RasterStatsParams {
    pub fn validate(&self) -> Result<(), InvalidArgument> {
        if self.histogram_bins == Some(0) {
            return Err(InvalidArgument::HistogramBins);
        }
        if let Some((min, max)) = self.histogram_range {
            if !(min < max) || !min.is_finite() || !max.is_finite() {
                return Err(InvalidArgument::HistogramRange { min, max });
            }
        }
        Ok(())
    }
}

/// Pixel sampling declared by the AREA_OR_POINT tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sampling {
    Area,
    Point,
}

impl Sampling {
    pub fn from_tag(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "area" => Some(Sampling::Area),
            "point" => Some(Sampling::Point),
            _ => None,
        }
    }
}

/// Band statistics over valid cells
///
/// A band without any valid cell reports NaN for every statistic, which
/// serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandStatistics {
    pub mean: f64,
    #[serde(rename = "minimum")]
    pub min: f64,
    #[serde(rename = "maximum")]
    pub max: f64,
    pub stddev: f64,
    pub valid_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// Number of bucket edges (buckets + 1)
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub buckets: Vec<u64>,
}

/// `raster:bands` entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterBandInfo {
    pub data_type: DataType,
    pub scale: f64,
    pub offset: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Sampling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodata: Option<Nodata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub statistics: BandStatistics,
    pub histogram: Histogram,
}

/// Output (rows, cols) for a read capped at `max_size` on the longer side
pub fn read_shape(width: usize, height: usize, max_size: usize) -> (usize, usize) {
    if max_size == 0 || width.max(height) <= max_size {
        return (height, width);
    }

    let ratio = height as f64 / width as f64;
    if ratio > 1.0 {
        (max_size, (max_size as f64 / ratio).ceil() as usize)
    } else {
        ((max_size as f64 * ratio).ceil() as usize, max_size)
    }
}

/// Mean, min, max, population standard deviation and valid percentage
pub fn compute_statistics(band: &MaskedBand) -> BandStatistics {
    let values = band.valid_values();
    let valid_percent = if band.is_empty() {
        0.0
    } else {
        values.len() as f64 / band.len() as f64 * 100.0
    };

    if values.is_empty() {
        return BandStatistics {
            mean: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            stddev: f64::NAN,
            valid_percent,
        };
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    BandStatistics {
        mean,
        min,
        max,
        stddev: variance.sqrt(),
        valid_percent,
    }
}

/// Equal-width histogram
///
/// Without an explicit range the data min/max are used (widened by 0.5 on
/// each side when they coincide, (0, 1) when there is no data). The last
/// bucket includes its upper edge; values outside the range are dropped.
pub fn compute_histogram(values: &[f64], bins: usize, range: Option<(f64, f64)>) -> StacResult<Histogram> {
    if bins == 0 {
        return Err(InvalidArgument::HistogramBins.into());
    }

    let (mut lo, mut hi) = match range {
        Some((min, max)) => {
            if !(min < max) || !min.is_finite() || !max.is_finite() {
                return Err(InvalidArgument::HistogramRange { min, max }.into());
            }
            (min, max)
        }
        None if values.is_empty() => (0.0, 1.0),
        None => (
            values.iter().copied().fold(f64::INFINITY, f64::min),
            values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        ),
    };
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    // Edges as numpy.linspace lays them out, with `hi` exact
    let step = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins)
        .map(|i| if i == bins { hi } else { lo + i as f64 * step })
        .collect();

    let mut buckets = vec![0u64; bins];
    let norm = bins as f64 / (hi - lo);
    for &v in values {
        if v < lo || v > hi {
            continue;
        }
        let mut index = (((v - lo) * norm) as usize).min(bins - 1);
        // Rounding in the scaled index can land one bucket off the edges
        if v < edges[index] {
            index -= 1;
        } else if v >= edges[index + 1] && index != bins - 1 {
            index += 1;
        }
        buckets[index] += 1;
    }

    Ok(Histogram {
        count: edges.len(),
        min: lo,
        max: hi,
        buckets,
    })
}

/// Build `raster:bands` for every band of the dataset
///
/// Histogram parameters are checked before the first band is read.
pub fn get_raster_info(dataset: &dyn RasterDataset, params: &RasterStatsParams) -> StacResult<Vec<RasterBandInfo>> {
    params.validate()?;

    let shape = read_shape(dataset.width(), dataset.height(), params.max_size);
    log::debug!("Sampling raster statistics at {:?}", shape);

    let sampling = dataset
        .tag("AREA_OR_POINT", "")
        .and_then(|tag| Sampling::from_tag(&tag));
    let bins = params.histogram_bins.unwrap_or(DEFAULT_HISTOGRAM_BINS);

    let mut info = Vec::with_capacity(dataset.band_count());
    for index in dataset.indexes() {
        let band = dataset.band(index)?;

        let mut array = dataset.read_masked(index, shape)?;
        array.fix_invalid();

        let statistics = compute_statistics(&array);
        let histogram = compute_histogram(&array.valid_values(), bins, params.histogram_range)?;

        info.push(RasterBandInfo {
            data_type: band.data_type,
            scale: band.scale,
            offset: band.offset,
            sampling,
            nodata: band.nodata.map(Nodata::from),
            unit: band.unit,
            statistics,
            histogram,
        });
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{BandMetadata, MemoryRaster};
    use crate::types::StacError;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_read_shape() {
        assert_eq!(read_shape(512, 256, 1024), (256, 512));
        assert_eq!(read_shape(2048, 1000, 1024), (500, 1024));
        assert_eq!(read_shape(1000, 3000, 1024), (1024, 342));
        assert_eq!(read_shape(3000, 3000, 1024), (1024, 1024));
        assert_eq!(read_shape(5000, 4000, 0), (4000, 5000));
    }

    #[test]
    fn test_statistics_ignore_masked_and_nan() {
        let mut band = MaskedBand::new(
            array![[1.0, 2.0, f64::NAN], [3.0, 4.0, -9999.0]],
            array![[true, true, true], [true, true, false]],
        );
        band.fix_invalid();
        let stats = compute_statistics(&band);

        assert_relative_eq!(stats.mean, 2.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_relative_eq!(stats.stddev, 1.25f64.sqrt());
        assert_relative_eq!(stats.valid_percent, 4.0 / 6.0 * 100.0);
    }

    #[test]
    fn test_all_masked_band() {
        let band = MaskedBand::new(Array2::zeros((2, 2)), Array2::from_elem((2, 2), false));
        let stats = compute_statistics(&band);
        assert_eq!(stats.valid_percent, 0.0);
        assert!(stats.mean.is_nan() && stats.min.is_nan() && stats.max.is_nan() && stats.stddev.is_nan());

        let json = serde_json::to_value(&stats).unwrap();
        assert!(json["mean"].is_null());
        assert_eq!(json["valid_percent"], 0.0);
    }

    #[test]
    fn test_default_histogram() {
        let values: Vec<f64> = (0..=10).map(|v| v as f64).collect();
        let hist = compute_histogram(&values, 10, None).unwrap();
        assert_eq!(hist.count, 11);
        assert_eq!(hist.min, 0.0);
        assert_eq!(hist.max, 10.0);
        assert_eq!(hist.buckets, vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 2]);
    }

    #[test]
    fn test_histogram_values_on_bucket_edges() {
        let hist = compute_histogram(&[0.0, 0.3, 0.6, 0.7, 1.0], 10, Some((0.0, 1.0))).unwrap();
        assert_eq!(hist.count, 11);
        assert_eq!(hist.buckets, vec![1, 0, 1, 0, 0, 1, 1, 0, 0, 1]);
    }

    #[test]
    fn test_histogram_explicit_range() {
        let values = vec![-5.0, 0.0, 1.0, 2.5, 9.9, 10.0, 42.0];
        let hist = compute_histogram(&values, 5, Some((0.0, 10.0))).unwrap();
        assert_eq!(hist.buckets.len(), 5);
        assert_eq!(hist.min, 0.0);
        assert_eq!(hist.max, 10.0);
        assert_eq!(hist.buckets, vec![2, 1, 0, 0, 2]);
    }

    #[test]
    fn test_degenerate_histograms() {
        let constant = compute_histogram(&[3.0, 3.0, 3.0], 10, None).unwrap();
        assert_eq!(constant.min, 2.5);
        assert_eq!(constant.max, 3.5);
        assert_eq!(constant.buckets.iter().sum::<u64>(), 3);
        assert_eq!(constant.buckets[5], 3);

        let empty = compute_histogram(&[], 10, None).unwrap();
        assert_eq!((empty.min, empty.max), (0.0, 1.0));
        assert!(empty.buckets.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_histogram_rejects_bad_parameters() {
        assert!(matches!(
            compute_histogram(&[1.0], 10, Some((0.0, -1.0))),
            Err(StacError::InvalidArgument(InvalidArgument::HistogramRange { .. }))
        ));
        assert!(matches!(
            compute_histogram(&[1.0], 0, None),
            Err(StacError::InvalidArgument(InvalidArgument::HistogramBins))
        ));
    }

    #[test]
    fn test_invalid_range_fails_before_read() {
        let raster = MemoryRaster::new("mem", 2, 2).with_band(array![[1.0, 2.0], [3.0, 4.0]], None);
        let params = RasterStatsParams {
            histogram_range: Some((0.0, -1.0)),
            ..RasterStatsParams::default()
        };
        assert!(get_raster_info(&raster, &params).is_err());
        assert_eq!(raster.read_count(), 0);
    }

    #[test]
    fn test_raster_info_fields() {
        let mut meta = BandMetadata::new(DataType::Float32);
        meta.nodata = Some(f64::NAN);
        meta.scale = 0.0001;
        meta.offset = 1000.0;
        meta.unit = Some("metre".to_string());

        let raster = MemoryRaster::new("mem", 3, 1)
            .with_band_metadata(array![[1.0, f64::NAN, 3.0]], meta)
            .with_band(array![[f64::NAN, f64::INFINITY, 7.0]], None)
            .with_tag("AREA_OR_POINT", "Area", "");

        let info = get_raster_info(&raster, &RasterStatsParams::default()).unwrap();
        assert_eq!(info.len(), 2);

        assert_eq!(info[0].nodata, Some(Nodata::NaN));
        assert_eq!(info[0].sampling, Some(Sampling::Area));
        assert_eq!(info[0].statistics.mean, 2.0);
        let json = serde_json::to_value(&info[0]).unwrap();
        assert_eq!(json["nodata"], "nan");
        assert_eq!(json["data_type"], "float32");
        assert_eq!(json["unit"], "metre");
        assert_eq!(json["scale"], 0.0001);
        assert_eq!(json["statistics"]["minimum"], 1.0);

        // NaN without declared nodata is still excluded
        assert!(info[1].nodata.is_none());
        assert_eq!(info[1].statistics.min, 7.0);
        assert_eq!(info[1].statistics.max, 7.0);
        let json = serde_json::to_value(&info[1]).unwrap();
        assert!(json.get("nodata").is_none());
        assert!(json.get("unit").is_none());
    }

    #[test]
    fn test_custom_bins_and_range() {
        let data = Array2::from_shape_fn((4, 4), |(r, c)| (r * 4 + c) as f64);
        let raster = MemoryRaster::new("mem", 4, 4).with_band(data, None);
        let params = RasterStatsParams {
            max_size: 128,
            histogram_bins: Some(5),
            histogram_range: Some((0.0, 10.0)),
        };
        let info = get_raster_info(&raster, &params).unwrap();
        let hist = &info[0].histogram;
        assert_eq!(hist.buckets.len(), 5);
        assert_eq!(hist.min, 0.0);
        assert_eq!(hist.max, 10.0);
        assert!(info[0].sampling.is_none());
    }
}
