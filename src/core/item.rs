use crate::core::datetime::DatetimeInput;
use crate::core::eo::{acquisition_datetime, get_cloud_cover, get_eobands_info};
use crate::core::footprint::{get_dataset_geom, FootprintParams};
use crate::core::media_type::get_media_type;
use crate::core::projection::get_projection_info;
use crate::core::raster_stats::{get_raster_info, RasterStatsParams, DEFAULT_RASTER_MAX_SIZE};
use crate::io::{GcpWarpedView, GdalRaster, RasterDataset};
use crate::stac::{format_datetime, Asset, ExtensionSet, Link, MediaType, StacExtension, StacItem};
use crate::types::{Crs, Diagnostics, InvalidArgument, StacResult, StacWarning};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// How the default asset's media type is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetMediaType {
    /// Derive it from the GDAL driver
    #[default]
    Auto,
    Explicit(MediaType),
    /// Leave the asset without a type
    Omit,
}

impl FromStr for AssetMediaType {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(AssetMediaType::Auto)
        } else if s.eq_ignore_ascii_case("none") {
            Ok(AssetMediaType::Omit)
        } else {
            Ok(AssetMediaType::Explicit(s.parse()?))
        }
    }
}

/// Item creation options
#[derive(Debug, Clone)]
pub struct ItemOptions {
    /// Item time; a range leaves `datetime` null and sets
    /// `start_datetime`/`end_datetime`
    pub input_datetime: Option<DatetimeInput>,
    /// Extra extension schema URLs, declared before the toggled ones
    pub extensions: Vec<String>,
    pub collection: Option<String>,
    /// Target of the collection link, defaults to `collection`
    pub collection_url: Option<String>,
    /// Extra properties; they win over computed values with the same key
    pub properties: Map<String, Value>,
    /// Defaults to the source basename
    pub id: Option<String>,
    /// Replaces the default asset entirely when non-empty
    pub assets: BTreeMap<String, Asset>,
    pub asset_name: String,
    pub asset_roles: Vec<String>,
    pub asset_media_type: AssetMediaType,
    /// Defaults to the source path
    pub asset_href: Option<String>,
    pub with_proj: bool,
    pub with_raster: bool,
    pub with_eo: bool,
    pub raster_max_size: usize,
    pub geom_densify_pts: i32,
    pub geom_precision: i32,
    pub geographic_crs: Crs,
    pub histogram_bins: Option<usize>,
    pub histogram_range: Option<(f64, f64)>,
}

impl Default for ItemOptions {
    fn default() -> Self {
        Self {
            input_datetime: None,
            extensions: Vec::new(),
            collection: None,
            collection_url: None,
            properties: Map::new(),
            id: None,
            assets: BTreeMap::new(),
            asset_name: "asset".to_string(),
            asset_roles: Vec::new(),
            asset_media_type: AssetMediaType::Auto,
            asset_href: None,
            with_proj: false,
            with_raster: false,
            with_eo: false,
            raster_max_size: DEFAULT_RASTER_MAX_SIZE,
            geom_densify_pts: 0,
            geom_precision: -1,
            geographic_crs: Crs::wgs84(),
            histogram_bins: None,
            histogram_range: None,
        }
    }
}

impl ItemOptions {
    /// Check every caller-supplied value that could make extraction fail
    pub fn validate(&self) -> Result<(), InvalidArgument> {
        if self.geom_densify_pts < 0 {
            return Err(InvalidArgument::NegativeDensify(self.geom_densify_pts));
        }
        self.raster_stats_params().validate()
    }

    pub fn footprint_params(&self) -> FootprintParams {
        FootprintParams {
            densify_pts: self.geom_densify_pts,
            precision: self.geom_precision,
            geographic_crs: self.geographic_crs.clone(),
        }
    }

    pub fn raster_stats_params(&self) -> RasterStatsParams {
        RasterStatsParams {
            max_size: self.raster_max_size,
            histogram_bins: self.histogram_bins,
            histogram_range: self.histogram_range,
        }
    }
}

/// Split a `NAME=VALUE` argument
pub fn parse_key_value(arg: &str) -> Result<(String, String), InvalidArgument> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(InvalidArgument::PropertySyntax(arg.to_string())),
    }
}

/// Build a properties map from `NAME=VALUE` arguments (values kept as strings)
pub fn parse_properties<I, S>(args: I) -> Result<Map<String, Value>, InvalidArgument>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut properties = Map::new();
    for arg in args {
        let (key, value) = parse_key_value(arg.as_ref())?;
        properties.insert(key, Value::String(value));
    }
    Ok(properties)
}

/// Where the raster comes from
///
/// A path is opened and closed inside the call; a dataset is only borrowed.
#[derive(Clone, Copy)]
pub enum Source<'a> {
    Path(&'a Path),
    Dataset(&'a dyn RasterDataset),
}

/// Item together with the warnings raised while building it
#[derive(Debug, Clone)]
pub struct CreatedItem {
    pub item: StacItem,
    pub warnings: Vec<StacWarning>,
}

/// Create a STAC Item from a raster
///
/// Options are validated before the source is opened.
pub fn create_stac_item(source: Source<'_>, options: &ItemOptions) -> StacResult<CreatedItem> {
    options.validate()?;

    match source {
        Source::Path(path) => {
            let dataset = GdalRaster::open(path)?;
            build_item(&dataset, options)
        }
        Source::Dataset(dataset) => build_item(dataset, options),
    }
}

/// Create one Item per path; each path is opened independently
#[cfg(feature = "parallel")]
pub fn create_stac_items<P>(paths: &[P], options: &ItemOptions) -> Vec<StacResult<CreatedItem>>
where
    P: AsRef<Path> + Sync,
{
    use rayon::prelude::*;

    paths
        .par_iter()
        .map(|path| create_stac_item(Source::Path(path.as_ref()), options))
        .collect()
}

/// Create one Item per path; each path is opened independently
#[cfg(not(feature = "parallel"))]
pub fn create_stac_items<P>(paths: &[P], options: &ItemOptions) -> Vec<StacResult<CreatedItem>>
where
    P: AsRef<Path>,
{
    paths
        .iter()
        .map(|path| create_stac_item(Source::Path(path.as_ref()), options))
        .collect()
}

fn basename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string())
}

fn build_item(dataset: &dyn RasterDataset, options: &ItemOptions) -> StacResult<CreatedItem> {
    log::info!("Creating STAC item for {}", dataset.name());
    let mut diagnostics = Diagnostics::new();

    let warped = GcpWarpedView::resolve(dataset)?;
    let view: &dyn RasterDataset = match &warped {
        Some(view) => view,
        None => dataset,
    };

    let geom = get_dataset_geom(view, &options.footprint_params(), &mut diagnostics)?;

    let mut properties = options.properties.clone();
    let datetime = match options.input_datetime {
        Some(DatetimeInput::Instant(datetime)) => Some(datetime),
        Some(DatetimeInput::Range { start, end }) => {
            properties
                .entry("start_datetime")
                .or_insert_with(|| Value::String(format_datetime(&start)));
            properties
                .entry("end_datetime")
                .or_insert_with(|| Value::String(format_datetime(&end)));
            None
        }
        None if properties.contains_key("start_datetime") && properties.contains_key("end_datetime") => None,
        None => Some(acquisition_datetime(view, &mut diagnostics).unwrap_or_else(Utc::now)),
    };

    let mut extensions: ExtensionSet = options.extensions.iter().collect();
    let mut asset_fields = Map::new();

    if options.with_proj {
        extensions.insert(StacExtension::Projection);
        for (key, value) in get_projection_info(view, &mut diagnostics).to_properties() {
            properties.entry(key).or_insert(value);
        }
    }

    if options.with_raster {
        extensions.insert(StacExtension::Raster);
        let bands = get_raster_info(dataset, &options.raster_stats_params())?;
        asset_fields.insert("raster:bands".to_string(), serde_json::to_value(bands)?);
    }

    if options.with_eo {
        extensions.insert(StacExtension::Eo);
        let bands = get_eobands_info(view)?;
        asset_fields.insert("eo:bands".to_string(), serde_json::to_value(bands)?);
        if let Some(cloud_cover) = get_cloud_cover(view, &mut diagnostics) {
            properties.entry("eo:cloud_cover").or_insert(Value::from(cloud_cover));
        }
    }

    let mut links = Vec::new();
    if let Some(collection) = &options.collection {
        let href = options.collection_url.as_ref().unwrap_or(collection);
        links.push(Link::collection(href.clone()));
    }

    let assets = if options.assets.is_empty() {
        let media_type = match options.asset_media_type {
            AssetMediaType::Auto => get_media_type(dataset, &mut diagnostics),
            AssetMediaType::Explicit(media_type) => Some(media_type),
            AssetMediaType::Omit => None,
        };

        let mut asset = Asset::new(options.asset_href.clone().unwrap_or_else(|| dataset.name().to_string()));
        asset.media_type = media_type;
        asset.roles = options.asset_roles.clone();
        asset.extra_fields = asset_fields;

        BTreeMap::from([(options.asset_name.clone(), asset)])
    } else {
        options.assets.clone()
    };

    let item = StacItem {
        id: options.id.clone().unwrap_or_else(|| basename(dataset.name())),
        geometry: geom.footprint,
        bbox: geom.bbox,
        collection: options.collection.clone(),
        stac_extensions: extensions,
        datetime,
        properties,
        assets,
        links,
    };

    Ok(CreatedItem {
        item,
        warnings: diagnostics.into_warnings(),
    })
}
