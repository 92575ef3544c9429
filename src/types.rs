use gdal::spatial_ref::{CoordTransform, SpatialRef};
use serde::{Serialize, Serializer};
use std::ffi::{CStr, CString};

/// Bounding box as (minx, miny, maxx, maxy)
pub type Bounds = [f64; 4];

/// A single (x, y) vertex
pub type Coord = [f64; 2];

/// Fallback extent used when a dataset carries no CRS
pub const WORLD_BOUNDS: Bounds = [-180.0, -90.0, 180.0, 90.0];

/// Affine pixel-to-world transform
///
/// Coefficients follow the (a, b, c, d, e, f) convention:
/// `x = a * col + b * row + c`, `y = d * col + e * row + f`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    /// Build from a GDAL geotransform `[c, a, b, f, d, e]`
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    /// Coefficients in (a, b, c, d, e, f) order
    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// World coordinates of a pixel corner
    pub fn apply(&self, col: f64, row: f64) -> Coord {
        [
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        ]
    }

    /// Extent of a `width` x `height` grid, all four corners considered
    pub fn bounds(&self, width: usize, height: usize) -> Bounds {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(w, h),
            self.apply(0.0, h),
        ];

        let mut bounds = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
        for [x, y] in corners {
            bounds[0] = bounds[0].min(x);
            bounds[1] = bounds[1].min(y);
            bounds[2] = bounds[2].max(x);
            bounds[3] = bounds[3].max(y);
        }
        bounds
    }
}

/// Coordinate reference system
///
/// Stored as a GDAL user-input definition ("EPSG:4326", WKT, PROJ string);
/// spatial references are rebuilt on demand so the value stays `Send` and
/// cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct Crs {
    definition: String,
}

impl Crs {
    /// WGS 84 geographic coordinates, the default target of footprints
    pub fn wgs84() -> Self {
        Self {
            definition: "EPSG:4326".to_string(),
        }
    }

    pub fn from_epsg(code: u32) -> StacResult<Self> {
        Self::from_user_input(&format!("EPSG:{}", code))
    }

    /// Any definition GDAL understands: "EPSG:4326", a PROJ string, WKT, PROJJSON...
    pub fn from_user_input(definition: &str) -> StacResult<Self> {
        SpatialRef::from_definition(definition)?;
        Ok(Self {
            definition: definition.to_string(),
        })
    }

    pub fn from_wkt(wkt: &str) -> StacResult<Self> {
        SpatialRef::from_wkt(wkt)?;
        Ok(Self {
            definition: wkt.to_string(),
        })
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// GDAL spatial reference with traditional (lon, lat) axis order
    pub fn spatial_ref(&self) -> StacResult<SpatialRef> {
        let srs = SpatialRef::from_definition(&self.definition)?;
        srs.set_axis_mapping_strategy(
            gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER,
        );
        Ok(srs)
    }

    /// EPSG code, if the definition maps onto one
    pub fn epsg(&self) -> Option<u32> {
        let mut srs = self.spatial_ref().ok()?;
        if !matches!(srs.auth_name(), Ok(name) if name == "EPSG") {
            srs.auto_identify_epsg().ok()?;
        }
        match srs.auth_name() {
            Ok(name) if name == "EPSG" => srs.auth_code().ok().map(|code| code as u32),
            _ => None,
        }
    }

    /// WKT2 (2019) serialization
    pub fn to_wkt2(&self) -> StacResult<String> {
        let srs = self.spatial_ref()?;
        let format = CString::new("FORMAT=WKT2_2019")
            .map_err(|e| StacError::Raster(e.to_string()))?;
        let options = [format.as_ptr(), std::ptr::null()];
        let mut out: *mut std::os::raw::c_char = std::ptr::null_mut();

        let wkt = unsafe {
            let rv = gdal_sys::OSRExportToWktEx(srs.to_c_hsrs(), &mut out, options.as_ptr());
            if rv != gdal_sys::OGRErr::OGRERR_NONE || out.is_null() {
                if !out.is_null() {
                    gdal_sys::VSIFree(out as *mut std::ffi::c_void);
                }
                return Err(StacError::Raster(format!("OSRExportToWktEx failed with code {}", rv)));
            }
            let wkt = CStr::from_ptr(out).to_string_lossy().into_owned();
            gdal_sys::VSIFree(out as *mut std::ffi::c_void);
            wkt
        };

        if wkt.is_empty() {
            return Err(StacError::Raster("empty WKT2 definition".to_string()));
        }
        Ok(wkt)
    }

    /// PROJJSON serialization
    pub fn to_projjson(&self) -> StacResult<serde_json::Value> {
        let json = self.spatial_ref()?.to_projjson()?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Semantic equality (GDAL `OSRIsSame`), falling back to textual equality
    pub fn is_same(&self, other: &Crs) -> bool {
        match (self.spatial_ref(), other.spatial_ref()) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.definition == other.definition,
        }
    }

    /// Transform coordinate arrays in place from `self` into `dst`
    pub fn transform_coords(&self, dst: &Crs, xs: &mut [f64], ys: &mut [f64]) -> StacResult<()> {
        let src = self.spatial_ref()?;
        let dst = dst.spatial_ref()?;
        let transform = CoordTransform::new(&src, &dst)?;
        let mut zs = vec![0.0; xs.len()];
        transform.transform_coords(xs, ys, &mut zs)?;
        Ok(())
    }
}

/// Pixel data type, named the way the raster extension spells it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float16,
    Float32,
    Float64,
    Cint16,
    Cint32,
    Cfloat32,
    Cfloat64,
    Other,
}

impl DataType {
    /// Map a GDAL data type name ("Byte", "Float32", ...)
    pub fn from_gdal_name(name: &str) -> Self {
        match name {
            "Byte" => DataType::Uint8,
            "Int8" => DataType::Int8,
            "UInt16" => DataType::Uint16,
            "Int16" => DataType::Int16,
            "UInt32" => DataType::Uint32,
            "Int32" => DataType::Int32,
            "UInt64" => DataType::Uint64,
            "Int64" => DataType::Int64,
            "Float16" => DataType::Float16,
            "Float32" => DataType::Float32,
            "Float64" => DataType::Float64,
            "CInt16" => DataType::Cint16,
            "CInt32" => DataType::Cint32,
            "CFloat32" => DataType::Cfloat32,
            "CFloat64" => DataType::Cfloat64,
            _ => DataType::Other,
        }
    }
}

/// Declared nodata value
///
/// JSON has no NaN or infinities, so those are written as the string
/// tokens "nan", "inf" and "-inf".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Nodata {
    Value(f64),
    NaN,
    PosInf,
    NegInf,
}

impl From<f64> for Nodata {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Nodata::NaN
        } else if value == f64::INFINITY {
            Nodata::PosInf
        } else if value == f64::NEG_INFINITY {
            Nodata::NegInf
        } else {
            Nodata::Value(value)
        }
    }
}

impl Serialize for Nodata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Nodata::Value(v) => serializer.serialize_f64(*v),
            Nodata::NaN => serializer.serialize_str("nan"),
            Nodata::PosInf => serializer.serialize_str("inf"),
            Nodata::NegInf => serializer.serialize_str("-inf"),
        }
    }
}

/// Caller-supplied configuration that is out of domain
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidArgument {
    #[error("densify point count must be positive, got {0}")]
    NegativeDensify(i32),

    #[error("histogram bin count must be greater than 0")]
    HistogramBins,

    #[error("histogram range lower bound {min} must be smaller than upper bound {max}")]
    HistogramRange { min: f64, max: f64 },

    #[error("invalid syntax for NAME=VALUE argument: {0}")]
    PropertySyntax(String),

    #[error("invalid datetime '{value}': {reason}")]
    Datetime { value: String, reason: String },

    #[error("unknown media type: {0}")]
    MediaType(String),
}

/// Error types for STAC item creation
#[derive(Debug, thiserror::Error)]
pub enum StacError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Raster error: {0}")]
    Raster(String),
}

/// Result type for STAC operations
pub type StacResult<T> = Result<T, StacError>;

/// Non-fatal irregularity found while extracting metadata
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StacWarning {
    #[error("Input file doesn't have CRS information, setting geometry and bbox to (-180,-90,180,90)")]
    MissingCrs,

    #[error("Could not get {format} from dataset: {reason}")]
    ProjectionEncoding { format: &'static str, reason: String },

    #[error("Could not parse date '{value}': {reason}")]
    UnparseableDate { value: String, reason: String },

    #[error("Could not parse cloud cover '{value}'")]
    UnparseableCloudCover { value: String },

    #[error("Could not determine the media type from GDAL driver '{driver}'")]
    UnknownDriver { driver: String },
}

/// Collects warnings emitted during one extraction
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<StacWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and record a warning
    pub fn warn(&mut self, warning: StacWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[StacWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<StacWarning> {
        self.warnings
    }
}
