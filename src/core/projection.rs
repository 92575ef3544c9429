use crate::core::geometry::bbox_to_geom;
use crate::io::RasterDataset;
use crate::stac::Geometry;
use crate::types::{Bounds, Diagnostics, StacWarning};
use serde_json::{json, Map, Value};

/// Projection extension fields for one dataset
///
/// The CRS is described by the first encoding that works, in the order
/// EPSG code, WKT2, PROJJSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInfo {
    pub epsg: Option<u32>,
    pub wkt2: Option<String>,
    pub projjson: Option<Value>,
    /// Footprint in the native CRS
    pub geometry: Geometry,
    /// Extent in the native CRS
    pub bbox: Bounds,
    /// (height, width)
    pub shape: [usize; 2],
    /// Affine coefficients (a, b, c, d, e, f)
    pub transform: [f64; 6],
}

impl ProjectionInfo {
    /// `proj:`-prefixed item properties
    pub fn to_properties(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("proj:epsg".to_string(), json!(self.epsg));
        if let Some(wkt2) = &self.wkt2 {
            props.insert("proj:wkt2".to_string(), json!(wkt2));
        }
        if let Some(projjson) = &self.projjson {
            props.insert("proj:projjson".to_string(), projjson.clone());
        }
        props.insert("proj:geometry".to_string(), json!(self.geometry));
        props.insert("proj:bbox".to_string(), json!(self.bbox));
        props.insert("proj:shape".to_string(), json!(self.shape));
        props.insert("proj:transform".to_string(), json!(self.transform));
        props
    }
}

/// Collect projection metadata; encoding failures only produce warnings
pub fn get_projection_info(dataset: &dyn RasterDataset, diagnostics: &mut Diagnostics) -> ProjectionInfo {
    let bounds = dataset.bounds();
    let mut info = ProjectionInfo {
        epsg: None,
        wkt2: None,
        projjson: None,
        geometry: bbox_to_geom(&bounds),
        bbox: bounds,
        shape: [dataset.height(), dataset.width()],
        transform: dataset.transform().to_array(),
    };

    let crs = match dataset.crs() {
        Some(crs) => crs,
        None => return info,
    };

    info.epsg = crs.epsg();
    if info.epsg.is_some() {
        return info;
    }

    match crs.to_wkt2() {
        Ok(wkt2) => info.wkt2 = Some(wkt2),
        Err(e) => {
            diagnostics.warn(StacWarning::ProjectionEncoding {
                format: "WKT2",
                reason: e.to_string(),
            });
            match crs.to_projjson() {
                Ok(projjson) => info.projjson = Some(projjson),
                Err(e) => diagnostics.warn(StacWarning::ProjectionEncoding {
                    format: "PROJJSON",
                    reason: e.to_string(),
                }),
            }
        }
    }

    info
}
