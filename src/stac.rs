//! STAC Item data model
//!
//! Serde models for the single Item this crate produces, the ordered set of
//! extension schemas it declares and the media types assets can carry.

use crate::types::{Bounds, Coord, InvalidArgument};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const STAC_VERSION: &str = "1.0.0";
pub const PROJECTION_EXT_VERSION: &str = "v1.1.0";
pub const RASTER_EXT_VERSION: &str = "v1.1.0";
pub const EO_EXT_VERSION: &str = "v1.1.0";

/// GeoJSON geometry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<Coord>> },
}

impl Geometry {
    pub fn polygon(ring: Vec<Coord>) -> Self {
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }

    /// Outer ring
    pub fn exterior(&self) -> &[Coord] {
        match self {
            Geometry::Polygon { coordinates } => {
                coordinates.first().map(|r| r.as_slice()).unwrap_or(&[])
            }
        }
    }
}

/// STAC extension declared in `stac_extensions`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StacExtension {
    Projection,
    Raster,
    Eo,
    Custom(String),
}

impl StacExtension {
    pub fn schema_url(&self) -> String {
        match self {
            StacExtension::Projection => format!(
                "https://stac-extensions.github.io/projection/{}/schema.json",
                PROJECTION_EXT_VERSION
            ),
            StacExtension::Raster => format!(
                "https://stac-extensions.github.io/raster/{}/schema.json",
                RASTER_EXT_VERSION
            ),
            StacExtension::Eo => format!(
                "https://stac-extensions.github.io/eo/{}/schema.json",
                EO_EXT_VERSION
            ),
            StacExtension::Custom(url) => url.clone(),
        }
    }

    /// Recognize the built-in extensions from their schema URL
    pub fn from_url(url: &str) -> Self {
        [StacExtension::Projection, StacExtension::Raster, StacExtension::Eo]
            .into_iter()
            .find(|ext| ext.schema_url() == url)
            .unwrap_or_else(|| StacExtension::Custom(url.to_string()))
    }
}

/// Insertion-ordered set of extensions, each declared once
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionSet {
    extensions: Vec<StacExtension>,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extension; returns false if it was already declared
    pub fn insert(&mut self, extension: StacExtension) -> bool {
        if self.extensions.contains(&extension) {
            return false;
        }
        self.extensions.push(extension);
        true
    }

    pub fn contains(&self, extension: &StacExtension) -> bool {
        self.extensions.contains(extension)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StacExtension> {
        self.extensions.iter()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn urls(&self) -> Vec<String> {
        self.extensions.iter().map(|e| e.schema_url()).collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExtensionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ExtensionSet::new();
        for url in iter {
            set.insert(StacExtension::from_url(url.as_ref()));
        }
        set
    }
}

impl Serialize for ExtensionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.extensions.iter().map(|e| e.schema_url()))
    }
}

/// Asset media types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Cog,
    GeoJson,
    GeoPackage,
    GeoTiff,
    Hdf,
    Hdf5,
    Html,
    Jpeg,
    Jpeg2000,
    Json,
    Png,
    Text,
    Tiff,
    Xml,
}

impl MediaType {
    pub const ALL: [MediaType; 14] = [
        MediaType::Cog,
        MediaType::GeoJson,
        MediaType::GeoPackage,
        MediaType::GeoTiff,
        MediaType::Hdf,
        MediaType::Hdf5,
        MediaType::Html,
        MediaType::Jpeg,
        MediaType::Jpeg2000,
        MediaType::Json,
        MediaType::Png,
        MediaType::Text,
        MediaType::Tiff,
        MediaType::Xml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Cog => "image/tiff; application=geotiff; profile=cloud-optimized",
            MediaType::GeoJson => "application/geo+json",
            MediaType::GeoPackage => "application/geopackage+sqlite3",
            MediaType::GeoTiff => "image/tiff; application=geotiff",
            MediaType::Hdf => "application/x-hdf",
            MediaType::Hdf5 => "application/x-hdf5",
            MediaType::Html => "text/html",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Jpeg2000 => "image/jp2",
            MediaType::Json => "application/json",
            MediaType::Png => "image/png",
            MediaType::Text => "text/plain",
            MediaType::Tiff => "image/tiff",
            MediaType::Xml => "application/xml",
        }
    }

    /// Short upper-case name, e.g. "GEOTIFF"
    pub fn name(&self) -> &'static str {
        match self {
            MediaType::Cog => "COG",
            MediaType::GeoJson => "GEOJSON",
            MediaType::GeoPackage => "GEOPACKAGE",
            MediaType::GeoTiff => "GEOTIFF",
            MediaType::Hdf => "HDF",
            MediaType::Hdf5 => "HDF5",
            MediaType::Html => "HTML",
            MediaType::Jpeg => "JPEG",
            MediaType::Jpeg2000 => "JPEG2000",
            MediaType::Json => "JSON",
            MediaType::Png => "PNG",
            MediaType::Text => "TEXT",
            MediaType::Tiff => "TIFF",
            MediaType::Xml => "XML",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = InvalidArgument;

    /// Accepts either the short name ("COG") or the MIME string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s) || m.as_str() == s)
            .ok_or_else(|| InvalidArgument::MediaType(s.to_string()))
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Link object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn collection(href: impl Into<String>) -> Self {
        Self {
            rel: "collection".to_string(),
            href: href.into(),
            media_type: Some(MediaType::Json),
            title: None,
        }
    }
}

/// Asset object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    /// Extension fields such as `raster:bands` and `eo:bands`
    #[serde(flatten)]
    pub extra_fields: Map<String, Value>,
}

impl Asset {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: None,
            description: None,
            media_type: None,
            roles: Vec::new(),
            extra_fields: Map::new(),
        }
    }

    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }
}

/// STAC Item
#[derive(Debug, Clone, PartialEq)]
pub struct StacItem {
    pub id: String,
    pub geometry: Geometry,
    pub bbox: Bounds,
    pub collection: Option<String>,
    pub stac_extensions: ExtensionSet,
    /// `None` only when `start_datetime`/`end_datetime` are in `properties`
    pub datetime: Option<DateTime<Utc>>,
    pub properties: Map<String, Value>,
    pub assets: BTreeMap<String, Asset>,
    pub links: Vec<Link>,
}

impl StacItem {
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Format a timestamp the way STAC expects it (UTC, `Z` suffix)
pub fn format_datetime(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Properties object with `datetime` written first
struct Properties<'a> {
    datetime: Option<&'a DateTime<Utc>>,
    values: &'a Map<String, Value>,
}

impl Serialize for Properties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self.datetime {
            Some(dt) => map.serialize_entry("datetime", &format_datetime(dt))?,
            None => map.serialize_entry("datetime", &Value::Null)?,
        }
        for (key, value) in self.values {
            if key != "datetime" {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl Serialize for StacItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "Feature")?;
        map.serialize_entry("stac_version", STAC_VERSION)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry(
            "properties",
            &Properties {
                datetime: self.datetime.as_ref(),
                values: &self.properties,
            },
        )?;
        map.serialize_entry("geometry", &self.geometry)?;
        map.serialize_entry("links", &self.links)?;
        map.serialize_entry("assets", &self.assets)?;
        map.serialize_entry("bbox", &self.bbox)?;
        map.serialize_entry("stac_extensions", &self.stac_extensions)?;
        if let Some(collection) = &self.collection {
            map.serialize_entry("collection", collection)?;
        }
        map.end()
    }
}
