//! Cell-bucketed spatial index over edge bounding boxes.
//!
//! Cells are `SPATIAL_CELL_SIZE_DEG` squares; an edge is registered in
//! every cell its bounding box touches. A sidecar "all edges" list
//! backstops sparse coverage when a generous-radius query lands in an
//! otherwise empty neighborhood.

use navkit_common::{EdgeId, SPATIAL_CELL_SIZE_DEG};
use navkit_geo::LatLon;
use std::collections::{HashMap, HashSet};

type CellKey = (i64, i64);

fn cell_of(pos: LatLon) -> CellKey {
    (
        (pos.lat / SPATIAL_CELL_SIZE_DEG).floor() as i64,
        (pos.lon / SPATIAL_CELL_SIZE_DEG).floor() as i64,
    )
}

#[derive(Debug, Default)]
pub struct SpatialGrid {
    cells: HashMap<CellKey, Vec<EdgeId>>,
    all_edges: Vec<EdgeId>,
}

impl SpatialGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.all_edges.clear();
    }

    /// Register `edge` in every cell its (a, b) bounding box intersects.
    pub fn insert(&mut self, edge: EdgeId, a: LatLon, b: LatLon) {
        let (lat_min, lat_max) = (a.lat.min(b.lat), a.lat.max(b.lat));
        let (lon_min, lon_max) = (a.lon.min(b.lon), a.lon.max(b.lon));

        let (r0, c0) = cell_of(LatLon::new(lat_min, lon_min));
        let (r1, c1) = cell_of(LatLon::new(lat_max, lon_max));

        for r in r0..=r1 {
            for c in c0..=c1 {
                self.cells.entry((r, c)).or_default().push(edge);
            }
        }
        self.all_edges.push(edge);
    }

    /// Edges within `radius_m` of `loc`, best-effort: a superset of the
    /// true set, deduplicated, order unspecified. Falls back to the
    /// sidecar list when the cell window matches nothing and the radius is
    /// generous enough (> 1000 m) to make that a reasonable degradation.
    pub fn nearby(&self, loc: LatLon, radius_m: f64) -> Vec<EdgeId> {
        let radius_deg = radius_m / navkit_common::DEG_TO_METERS;
        let span = (radius_deg / SPATIAL_CELL_SIZE_DEG).ceil() as i64;
        let span = span.max(0);

        let (row, col) = cell_of(loc);
        let mut seen: HashSet<EdgeId> = HashSet::new();
        let mut out = Vec::new();

        for r in (row - span)..=(row + span) {
            for c in (col - span)..=(col + span) {
                if let Some(edges) = self.cells.get(&(r, c)) {
                    for &e in edges {
                        if seen.insert(e) {
                            out.push(e);
                        }
                    }
                }
            }
        }

        if out.is_empty() && radius_m > 1000.0 {
            return self.all_edges.clone();
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_edge_registered_at_its_endpoints() {
        let mut grid = SpatialGrid::new();
        let a = LatLon::new(60.0, 24.0);
        let b = LatLon::new(60.001, 24.001);
        grid.insert(EdgeId(0), a, b);

        let hits = grid.nearby(a, 50.0);
        assert!(hits.contains(&EdgeId(0)));
    }

    #[test]
    fn falls_back_to_all_edges_when_sparse_and_radius_generous() {
        let mut grid = SpatialGrid::new();
        grid.insert(EdgeId(7), LatLon::new(10.0, 10.0), LatLon::new(10.001, 10.001));

        // Query far away from any registered cell, with a generous radius.
        let hits = grid.nearby(LatLon::new(-10.0, -10.0), 5000.0);
        assert_eq!(hits, vec![EdgeId(7)]);
    }

    #[test]
    fn empty_with_small_radius_and_no_nearby_cells() {
        let grid = SpatialGrid::new();
        let hits = grid.nearby(LatLon::new(0.0, 0.0), 10.0);
        assert!(hits.is_empty());
    }
}
