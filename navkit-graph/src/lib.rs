//! Routable road graph and spatial index.
//!
//! A dense node/edge pool plus a cell-bucketed spatial index, rebuilt
//! wholesale whenever a new source is loaded. Node/edge identity is a
//! stable pool index (`NodeId`/`EdgeId`) rather than a pointer or raw OSM
//! id, so the graph has no internal cycles to manage.

mod grid;

pub use grid::SpatialGrid;

use navkit_common::{EdgeId, NodeId, RoadKind};
use navkit_geo::{haversine, LatLon};
use std::collections::HashMap;
use tracing::debug;

/// Degenerate-edge tolerance: edges shorter than this are discarded at
/// construction time rather than stored as zero-length routable hops.
const DEGENERATE_LENGTH_EPS_M: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct Node {
    /// Opaque, stable-within-one-dataset key from the OSM source.
    pub osm_id: u64,
    pub pos: LatLon,
    pub out_edges: Vec<EdgeId>,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub name: String,
    pub kind: RoadKind,
    pub speed_limit_kph: f32,
    pub length_m: f64,
    pub oneway: bool,
}

/// The routable graph: a node pool, an edge pool, and a spatial index over
/// edge bounding boxes. Node/edge identity (`NodeId`/`EdgeId`) is stable
/// only within one loaded dataset — `clear()` invalidates every id a
/// caller may be holding, so the matcher must be re-initialized after.
#[derive(Debug, Default)]
pub struct RoadGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    osm_id_to_node: HashMap<u64, NodeId>,
    grid: SpatialGrid,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        debug!(nodes = self.nodes.len(), edges = self.edges.len(), "clearing road graph");
        self.nodes.clear();
        self.edges.clear();
        self.osm_id_to_node.clear();
        self.grid.clear();
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Inserts a node keyed by its OSM id, or returns the existing `NodeId`
    /// if that id has already been added (ingestion calls this once per
    /// `<node>`, but the routing engine's node-snap stage also mints fresh
    /// "projected" nodes with synthetic ids — see `add_projected_node`).
    pub fn add_node(&mut self, osm_id: u64, pos: LatLon) -> NodeId {
        if let Some(&id) = self.osm_id_to_node.get(&osm_id) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            osm_id,
            pos,
            out_edges: Vec::new(),
        });
        self.osm_id_to_node.insert(osm_id, id);
        id
    }

    /// Inserts a node that has no OSM identity (a routing-time projection
    /// onto an edge interior). Synthesizes a fresh negative-space key so it
    /// never collides with a real OSM node id.
    pub fn add_projected_node(&mut self, pos: LatLon) -> NodeId {
        let synthetic_id = u64::MAX - self.nodes.len() as u64;
        self.add_node(synthetic_id, pos)
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    pub fn node_id_for_osm(&self, osm_id: u64) -> Option<NodeId> {
        self.osm_id_to_node.get(&osm_id).copied()
    }

    /// Adds a directed edge `from -> to`. `length_m` is derived from the
    /// endpoints' haversine distance; degenerate edges (shorter than
    /// `DEGENERATE_LENGTH_EPS_M`) are silently discarded.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        name: impl Into<String>,
        kind: RoadKind,
        speed_limit_kph: f32,
        oneway: bool,
    ) -> Option<EdgeId> {
        let (a, b) = (self.get_node(from)?.pos, self.get_node(to)?.pos);
        let length_m = haversine(a, b);
        if length_m < DEGENERATE_LENGTH_EPS_M {
            return None;
        }

        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            from,
            to,
            name: name.into(),
            kind,
            speed_limit_kph,
            length_m,
            oneway,
        });

        self.nodes[from.index()].out_edges.push(id);
        self.grid.insert(id, a, b);
        Some(id)
    }

    /// Splits `edge_id` at `at` (which must lie on the edge's interior),
    /// producing two edges that share the original's metadata. Used by the
    /// routing engine's node-snap stage when a projection lands at least
    /// 10 m from both endpoints. Returns the new mid-route node id.
    pub fn split_edge(&mut self, edge_id: EdgeId, at: LatLon) -> Option<NodeId> {
        let edge = self.get_edge(edge_id)?.clone();
        let mid = self.add_projected_node(at);

        self.add_edge(
            edge.from,
            mid,
            edge.name.clone(),
            edge.kind,
            edge.speed_limit_kph,
            edge.oneway,
        )?;
        self.add_edge(
            mid,
            edge.to,
            edge.name,
            edge.kind,
            edge.speed_limit_kph,
            edge.oneway,
        )?;

        Some(mid)
    }

    /// Best-effort set of edges within `radius_m` of `loc`.
    pub fn nearby_edges(&self, loc: LatLon, radius_m: f64) -> Vec<EdgeId> {
        self.grid.nearby(loc, radius_m)
    }
}
