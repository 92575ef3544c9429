use crate::core::datetime::parse_datetime;
use crate::io::RasterDataset;
use crate::types::{Diagnostics, StacResult, StacWarning};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata domain holding acquisition information
pub const IMAGERY_DOMAIN: &str = "IMAGERY";

/// `eo:bands` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EoBand {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Describe every band: the band description if set, otherwise its colour
/// interpretation unless that is "undefined"
pub fn get_eobands_info(dataset: &dyn RasterDataset) -> StacResult<Vec<EoBand>> {
    dataset
        .indexes()
        .map(|index| {
            let band = dataset.band(index)?;
            let color = band.color_interp.to_lowercase();
            let description = band
                .description
                .filter(|d| !d.is_empty())
                .or_else(|| (!color.is_empty() && color != "undefined").then_some(color));

            Ok(EoBand {
                name: format!("b{}", index),
                description,
            })
        })
        .collect()
}

/// Cloud cover percentage from the IMAGERY domain
pub fn get_cloud_cover(dataset: &dyn RasterDataset, diagnostics: &mut Diagnostics) -> Option<i64> {
    let value = dataset.tag("CLOUDCOVER", IMAGERY_DOMAIN)?;
    let trimmed = value.trim();

    if let Ok(percent) = trimmed.parse::<i64>() {
        return Some(percent);
    }
    match trimmed.parse::<f64>() {
        Ok(percent) if percent.is_finite() => Some(percent.round() as i64),
        _ => {
            diagnostics.warn(StacWarning::UnparseableCloudCover { value });
            None
        }
    }
}

/// Acquisition time from `ACQUISITIONDATETIME` (IMAGERY domain), falling
/// back to `TIFFTAG_DATETIME`
pub fn acquisition_datetime(dataset: &dyn RasterDataset, diagnostics: &mut Diagnostics) -> Option<DateTime<Utc>> {
    let value = dataset
        .tag("ACQUISITIONDATETIME", IMAGERY_DOMAIN)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| dataset.tag("TIFFTAG_DATETIME", ""))
        .filter(|v| !v.trim().is_empty())?;

    match parse_datetime(&value) {
        Ok(datetime) => Some(datetime),
        Err(e) => {
            diagnostics.warn(StacWarning::UnparseableDate {
                value,
                reason: e.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{BandMetadata, MemoryRaster};
    use crate::types::DataType;
    use chrono::TimeZone;
    use ndarray::array;

    fn band(color: &str, description: Option<&str>) -> BandMetadata {
        let mut meta = BandMetadata::new(DataType::Uint8);
        meta.color_interp = color.to_string();
        meta.description = description.map(str::to_string);
        meta
    }

    #[test]
    fn test_band_descriptions() {
        let raster = MemoryRaster::new("rgb.tif", 1, 1)
            .with_band_metadata(array![[1.0]], band("red", None))
            .with_band_metadata(array![[1.0]], band("Green", Some("")))
            .with_band_metadata(array![[1.0]], band("blue", Some("nir")))
            .with_band_metadata(array![[1.0]], band("undefined", None));

        let bands = get_eobands_info(&raster).unwrap();
        let names: Vec<_> = bands.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["b1", "b2", "b3", "b4"]);
        assert_eq!(bands[0].description.as_deref(), Some("red"));
        assert_eq!(bands[1].description.as_deref(), Some("green"));
        assert_eq!(bands[2].description.as_deref(), Some("nir"));
        assert_eq!(bands[3].description, None);

        let json = serde_json::to_value(&bands[3]).unwrap();
        assert_eq!(json, serde_json::json!({"name": "b4"}));
    }

    #[test]
    fn test_cloud_cover() {
        let mut diag = Diagnostics::new();

        let int = MemoryRaster::new("a", 1, 1).with_tag("CLOUDCOVER", "12", IMAGERY_DOMAIN);
        assert_eq!(get_cloud_cover(&int, &mut diag), Some(12));

        let float = MemoryRaster::new("a", 1, 1).with_tag("CLOUDCOVER", "12.6", IMAGERY_DOMAIN);
        assert_eq!(get_cloud_cover(&float, &mut diag), Some(13));

        assert_eq!(get_cloud_cover(&MemoryRaster::new("a", 1, 1), &mut diag), None);
        assert!(diag.is_empty());

        let bad = MemoryRaster::new("a", 1, 1).with_tag("CLOUDCOVER", "cloudy", IMAGERY_DOMAIN);
        assert_eq!(get_cloud_cover(&bad, &mut diag), None);
        assert_eq!(
            diag.warnings(),
            &[StacWarning::UnparseableCloudCover {
                value: "cloudy".to_string()
            }]
        );
    }

    #[test]
    fn test_acquisition_datetime_sources() {
        let mut diag = Diagnostics::new();

        let imagery = MemoryRaster::new("a", 1, 1)
            .with_tag("ACQUISITIONDATETIME", "2011-05-01T13:00:00Z", IMAGERY_DOMAIN)
            .with_tag("TIFFTAG_DATETIME", "2020:01:01 00:00:00", "");
        assert_eq!(
            acquisition_datetime(&imagery, &mut diag),
            Some(Utc.with_ymd_and_hms(2011, 5, 1, 13, 0, 0).unwrap())
        );

        let tiff = MemoryRaster::new("a", 1, 1).with_tag("TIFFTAG_DATETIME", "2020:01:01 10:30:00", "");
        assert_eq!(
            acquisition_datetime(&tiff, &mut diag),
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 10, 30, 0).unwrap())
        );
        assert!(diag.is_empty());
    }

    #[test]
    fn test_unparseable_date_warns() {
        let raster = MemoryRaster::new("a", 1, 1).with_tag("TIFFTAG_DATETIME", "yesterday", "");
        let mut diag = Diagnostics::new();
        assert_eq!(acquisition_datetime(&raster, &mut diag), None);
        assert!(matches!(
            diag.warnings(),
            [StacWarning::UnparseableDate { value, .. }] if value == "yesterday"
        ));
    }
}
