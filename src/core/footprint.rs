use crate::core::geometry::{bbox_to_geom, bbox_to_ring, densify, reproject_ring, ring_bounds, round_ring};
use crate::io::RasterDataset;
use crate::stac::Geometry;
use crate::types::{Bounds, Crs, Diagnostics, InvalidArgument, StacResult, StacWarning, WORLD_BOUNDS};

/// Footprint computation parameters
#[derive(Debug, Clone)]
pub struct FootprintParams {
    /// Points added to each edge before reprojection (GDAL uses 21)
    pub densify_pts: i32,
    /// Decimal places kept in output coordinates, -1 for no rounding
    pub precision: i32,
    /// Geographic reference of the output bbox and geometry
    pub geographic_crs: Crs,
}

impl Default for FootprintParams {
    fn default() -> Self {
        Self {
            densify_pts: 0,
            precision: -1,
            geographic_crs: Crs::wgs84(),
        }
    }
}

/// Extent of a dataset in geographic coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub bbox: Bounds,
    pub footprint: Geometry,
}

/// Compute the dataset footprint and bbox in `params.geographic_crs`
///
/// The bbox is taken from the reprojected outline rather than from the
/// reprojected corners, which under-estimate curved edges. Footprints that
/// cross the antimeridian are returned as a single, unsplit polygon.
pub fn get_dataset_geom(
    dataset: &dyn RasterDataset,
    params: &FootprintParams,
    diagnostics: &mut Diagnostics,
) -> StacResult<Footprint> {
    if params.densify_pts < 0 {
        return Err(InvalidArgument::NegativeDensify(params.densify_pts).into());
    }

    let src_crs = match dataset.crs() {
        Some(crs) => crs,
        None => {
            diagnostics.warn(StacWarning::MissingCrs);
            return Ok(Footprint {
                bbox: WORLD_BOUNDS,
                footprint: bbox_to_geom(&WORLD_BOUNDS),
            });
        }
    };

    let mut ring = bbox_to_ring(&dataset.bounds());
    let dst_crs = &params.geographic_crs;

    let ring = if src_crs.is_same(dst_crs) {
        round_ring(&mut ring, params.precision);
        ring
    } else {
        if params.densify_pts > 0 {
            ring = densify(&ring, params.densify_pts)?;
        }
        reproject_ring(&ring, src_crs, dst_crs, params.precision)?
    };

    let bbox = ring_bounds(&ring);
    log::debug!("Footprint bbox: {:?}", bbox);

    Ok(Footprint {
        bbox,
        footprint: Geometry::polygon(ring),
    })
}
