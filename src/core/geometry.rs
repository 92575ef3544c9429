use crate::stac::Geometry;
use crate::types::{Bounds, Coord, Crs, InvalidArgument, StacResult};

/// Closed counter-clockwise ring of a bbox, starting at (minx, miny)
pub fn bbox_to_ring(bbox: &Bounds) -> Vec<Coord> {
    let [minx, miny, maxx, maxy] = *bbox;
    vec![
        [minx, miny],
        [maxx, miny],
        [maxx, maxy],
        [minx, maxy],
        [minx, miny],
    ]
}

/// Polygon geometry from a bbox
pub fn bbox_to_geom(bbox: &Bounds) -> Geometry {
    Geometry::polygon(bbox_to_ring(bbox))
}

/// Insert `points_per_edge` evenly spaced vertices along every edge of `ring`
pub fn densify(ring: &[Coord], points_per_edge: i32) -> StacResult<Vec<Coord>> {
    if points_per_edge < 0 {
        return Err(InvalidArgument::NegativeDensify(points_per_edge).into());
    }
    if points_per_edge == 0 || ring.len() < 2 {
        return Ok(ring.to_vec());
    }

    let steps = points_per_edge as usize + 1;
    let mut out = Vec::with_capacity((ring.len() - 1) * steps + 1);
    for edge in ring.windows(2) {
        let ([x0, y0], [x1, y1]) = (edge[0], edge[1]);
        for i in 0..steps {
            let t = i as f64 / steps as f64;
            out.push([x0 + (x1 - x0) * t, y0 + (y1 - y0) * t]);
        }
    }
    if let Some(last) = ring.last() {
        out.push(*last);
    }
    Ok(out)
}

/// Bounding box of a ring's vertices
pub fn ring_bounds(ring: &[Coord]) -> Bounds {
    ring.iter().fold(
        [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY],
        |b, [x, y]| [b[0].min(*x), b[1].min(*y), b[2].max(*x), b[3].max(*y)],
    )
}

/// Round coordinates to `precision` decimals; negative precision leaves them as is
pub fn round_ring(ring: &mut [Coord], precision: i32) {
    if precision < 0 {
        return;
    }
    let factor = 10f64.powi(precision);
    for coord in ring.iter_mut() {
        coord[0] = (coord[0] * factor).round() / factor;
        coord[1] = (coord[1] * factor).round() / factor;
    }
}

/// Transform a ring from `src` into `dst`, then round it
pub fn reproject_ring(ring: &[Coord], src: &Crs, dst: &Crs, precision: i32) -> StacResult<Vec<Coord>> {
    let mut xs: Vec<f64> = ring.iter().map(|c| c[0]).collect();
    let mut ys: Vec<f64> = ring.iter().map(|c| c[1]).collect();
    src.transform_coords(dst, &mut xs, &mut ys)?;

    let mut out: Vec<Coord> = xs.into_iter().zip(ys).map(|(x, y)| [x, y]).collect();
    round_ring(&mut out, precision);
    Ok(out)
}

/// Reproject a polygon geometry
pub fn reproject_geometry(geometry: &Geometry, src: &Crs, dst: &Crs, precision: i32) -> StacResult<Geometry> {
    Ok(Geometry::polygon(reproject_ring(geometry.exterior(), src, dst, precision)?))
}

/// Reproject bounds through a densified outline (21 points per edge)
pub fn reproject_bounds(src: &Crs, dst: &Crs, bounds: &Bounds) -> StacResult<Bounds> {
    let ring = densify(&bbox_to_ring(bounds), 21)?;
    Ok(ring_bounds(&reproject_ring(&ring, src, dst, -1)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StacError;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_bbox_to_geom_closed_ring() {
        for bbox in [[0.0, 0.0, 1.0, 1.0], [-180.0, -90.0, 180.0, 90.0], [5.5, 45.1, 5.5, 45.1]] {
            let geom = bbox_to_geom(&bbox);
            let ring = geom.exterior();
            assert_eq!(ring.len(), 5);
            assert_eq!(ring.first(), ring.last());
            assert_eq!(ring[0], [bbox[0], bbox[1]]);
            assert_eq!(ring[2], [bbox[2], bbox[3]]);
        }
    }

    #[test]
    fn test_densify_adds_points_per_edge() {
        let ring = bbox_to_ring(&[0.0, 0.0, 4.0, 4.0]);
        let dense = densify(&ring, 3).unwrap();
        assert_eq!(dense.len(), 4 * 4 + 1);
        assert_eq!(dense[1], [1.0, 0.0]);
        assert_eq!(dense[2], [2.0, 0.0]);
        assert_eq!(dense[4], [4.0, 0.0]);
        assert_eq!(dense.first(), dense.last());
        assert_eq!(ring_bounds(&dense), [0.0, 0.0, 4.0, 4.0]);
    }

    #[test]
    fn test_densify_zero_is_noop() {
        let ring = bbox_to_ring(&[0.0, 0.0, 1.0, 1.0]);
        assert_eq!(densify(&ring, 0).unwrap(), ring);
    }

    #[test]
    fn test_densify_rejects_negative() {
        let ring = bbox_to_ring(&[0.0, 0.0, 1.0, 1.0]);
        assert!(matches!(
            densify(&ring, -1),
            Err(StacError::InvalidArgument(InvalidArgument::NegativeDensify(-1)))
        ));
    }

    #[test]
    fn test_round_ring() {
        let mut ring = vec![[1.23456, -7.65432]];
        round_ring(&mut ring, 2);
        assert_eq!(ring[0], [1.23, -7.65]);

        let mut untouched = vec![[1.23456, -7.65432]];
        round_ring(&mut untouched, -1);
        assert_eq!(untouched[0], [1.23456, -7.65432]);
    }

    #[test]
    fn test_reproject_web_mercator_origin() {
        let src = Crs::from_epsg(3857).unwrap();
        let ring = vec![[0.0, 0.0], [111319.49079327357, 0.0]];
        let out = reproject_ring(&ring, &src, &Crs::wgs84(), 6).unwrap();
        assert_abs_diff_eq!(out[0][0], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out[1][0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1][1], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_reproject_geometry_keeps_polygon() {
        let src = Crs::from_epsg(3857).unwrap();
        let geom = bbox_to_geom(&[0.0, 0.0, 111319.49079327357, 111325.14286638486]);
        let out = reproject_geometry(&geom, &src, &Crs::wgs84(), 6).unwrap();
        let ring = out.exterior();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring, reproject_ring(geom.exterior(), &src, &Crs::wgs84(), 6).unwrap().as_slice());
        assert_abs_diff_eq!(ring[2][0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ring[2][1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_reproject_bounds_contains_corners() {
        let utm = Crs::from_epsg(32615).unwrap();
        let bounds = [373185.0, 8019284.949381611, 639014.9492102272, 8286015.0];
        let out = reproject_bounds(&utm, &Crs::wgs84(), &bounds).unwrap();
        let corners = reproject_ring(&bbox_to_ring(&bounds), &utm, &Crs::wgs84(), -1).unwrap();
        let corner_bounds = ring_bounds(&corners);
        assert!(out[0] <= corner_bounds[0] && out[1] <= corner_bounds[1]);
        assert!(out[2] >= corner_bounds[2] && out[3] >= corner_bounds[3]);
    }
}
