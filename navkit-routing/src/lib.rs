//! A* routing engine: direct-distance gating, node snapping, shortest
//! path, densification/smoothing, and alternative generation.
//!
//! Search runs behind a pluggable `CostFn`, so the same A* implementation
//! produces the shortest, fastest, and highway-avoiding candidates just by
//! swapping the cost function.

mod astar;
mod cost;
mod densify;
mod direct;

pub use cost::{CostFn, FastestCost, LengthCost, NoHighwaysCost};

use navkit_common::{Route, ALTERNATIVE_SAMPLE_COUNT, MAX_ROUTE_DISTANCE_M, NODE_SEARCH_RADIUS_M};
use navkit_geo::{haversine, LatLon};
use navkit_graph::RoadGraph;
use rand::Rng;
use tracing::debug;

const ALTERNATIVE_ENDPOINT_TOLERANCE_M: f64 = 100.0;
const ALTERNATIVE_SAMPLE_TOLERANCE_M: f64 = 200.0;
const ALTERNATIVE_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Generates a route id of the form `route-xxxxxxxx` (8 lowercase hex
/// digits).
pub fn generate_route_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..8)
        .map(|_| {
            let n: u8 = rng.random_range(0..16);
            std::char::from_digit(n as u32, 16).unwrap()
        })
        .collect();
    format!("route-{suffix}")
}

/// Computes 1–3 routes from `start` to `end`, primary first.
///
/// `graph` is taken mutably because node snapping may split edges to mint
/// new routable nodes.
pub fn routes(graph: &mut RoadGraph, start: LatLon, end: LatLon) -> Vec<Route> {
    if !start.is_finite() || !end.is_finite() {
        return Vec::new();
    }

    if haversine(start, end) > MAX_ROUTE_DISTANCE_M {
        debug!("start/end beyond MAX_ROUTE_DISTANCE, using direct route");
        return vec![direct::direct_route(start, end, generate_route_id())];
    }

    let Some(start_node) = astar::find_nearest_node(graph, start, NODE_SEARCH_RADIUS_M) else {
        return vec![direct::direct_route(start, end, generate_route_id())];
    };
    let Some(end_node) = astar::find_nearest_node(graph, end, NODE_SEARCH_RADIUS_M) else {
        return vec![direct::direct_route(start, end, generate_route_id())];
    };

    let Some(primary_path) = astar::astar(graph, start_node, end_node, &LengthCost) else {
        return vec![direct::direct_route(start, end, generate_route_id())];
    };

    let primary = build_route(graph, &primary_path, start, end, "Primary route".to_string(), 1.0);
    let mut out = vec![primary.clone()];

    let alternative_cost_fns: [(&dyn CostFn, &str, f64); 2] = [
        (&FastestCost, "Fastest route (time-optimized)", FastestCost.duration_multiplier()),
        (&NoHighwaysCost, "Route avoiding highways", NoHighwaysCost.duration_multiplier()),
    ];
    for (cost_fn, name, multiplier) in alternative_cost_fns {
        if let Some(path) = astar::astar(graph, start_node, end_node, cost_fn) {
            let candidate = build_route(graph, &path, start, end, name.to_string(), multiplier);
            if is_acceptable_alternative(&primary, &candidate) {
                out.push(candidate);
            }
        }
    }

    out.truncate(3);
    out
}

fn build_route(graph: &RoadGraph, path: &[navkit_common::NodeId], start: LatLon, end: LatLon, name: String, duration_multiplier: f64) -> Route {
    let positions = densify::densify_positions(graph, path, start, end);
    let smoothed = densify::smooth(&positions);
    let points = densify::to_fixes(&smoothed);
    let duration_s = (densify::duration_s(&points) as f64 * duration_multiplier).round().max(0.0) as u32;

    Route {
        id: generate_route_id(),
        name,
        points,
        duration_s,
    }
}

/// An alternative is accepted iff both endpoints are within 100 m of the
/// primary's and fewer than 70% of 10 equally-spaced samples lie within
/// 200 m of the primary's corresponding samples.
fn is_acceptable_alternative(primary: &Route, candidate: &Route) -> bool {
    let Some(primary_start) = primary.points.first() else { return false };
    let Some(primary_end) = primary.points.last() else { return false };
    let Some(candidate_start) = candidate.points.first() else { return false };
    let Some(candidate_end) = candidate.points.last() else { return false };

    let endpoints_match = haversine(primary_start.pos, candidate_start.pos) <= ALTERNATIVE_ENDPOINT_TOLERANCE_M
        && haversine(primary_end.pos, candidate_end.pos) <= ALTERNATIVE_ENDPOINT_TOLERANCE_M;
    if !endpoints_match {
        return false;
    }

    let primary_samples = sample_points(primary, ALTERNATIVE_SAMPLE_COUNT);
    let candidate_samples = sample_points(candidate, ALTERNATIVE_SAMPLE_COUNT);

    let close_count = primary_samples
        .iter()
        .zip(candidate_samples.iter())
        .filter(|(a, b)| haversine(**a, **b) <= ALTERNATIVE_SAMPLE_TOLERANCE_M)
        .count();

    let similarity = close_count as f64 / ALTERNATIVE_SAMPLE_COUNT as f64;
    similarity < ALTERNATIVE_SIMILARITY_THRESHOLD
}

fn sample_points(route: &Route, count: usize) -> Vec<LatLon> {
    let n = route.points.len();
    if n == 0 {
        return Vec::new();
    }
    (0..count)
        .map(|i| {
            let frac = i as f64 / (count - 1).max(1) as f64;
            let idx = ((n - 1) as f64 * frac).round() as usize;
            route.points[idx.min(n - 1)].pos
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use navkit_common::RoadKind;

    fn grid_graph(n: usize, spacing_deg: f64) -> (RoadGraph, LatLon, LatLon) {
        let mut graph = RoadGraph::new();
        let mut ids = vec![vec![navkit_common::NodeId(0); n]; n];
        for row in 0..n {
            for col in 0..n {
                let osm_id = (row * n + col) as u64;
                ids[row][col] = graph.add_node(osm_id, LatLon::new(row as f64 * spacing_deg, col as f64 * spacing_deg));
            }
        }
        for row in 0..n {
            for col in 0..n {
                if col + 1 < n {
                    graph.add_edge(ids[row][col], ids[row][col + 1], "grid", RoadKind::Residential, 30.0, false);
                }
                if row + 1 < n {
                    graph.add_edge(ids[row][col], ids[row + 1][col], "grid", RoadKind::Residential, 30.0, false);
                }
            }
        }
        let start = graph.get_node(ids[0][0]).unwrap().pos;
        let end = graph.get_node(ids[n - 1][n - 1]).unwrap().pos;
        (graph, start, end)
    }

    /// Direct route when the request is too far apart for an empty graph.
    #[test]
    fn far_apart_points_on_empty_graph_yield_one_direct_route() {
        let mut graph = RoadGraph::new();
        let start = LatLon::new(60.5, 25.5);
        let end = LatLon::new(60.1, 24.9);
        let result = routes(&mut graph, start, end);

        assert_eq!(result.len(), 1);
        assert!(result[0].name.contains("Direct"));
    }

    /// A* on a 3x3 grid produces a densified route with >= 5 points.
    #[test]
    fn grid_route_has_at_least_five_points() {
        let (mut graph, start, end) = grid_graph(3, 0.001);
        let result = routes(&mut graph, start, end);

        assert!(!result.is_empty());
        assert!(result[0].points.len() >= 5);
        assert!(result[0].duration_s > 0);
    }

    /// A straight corridor collapses alternatives to just the primary.
    #[test]
    fn straight_corridor_yields_a_single_route() {
        let mut graph = RoadGraph::new();
        let n = 10;
        let mut ids = Vec::with_capacity(n);
        for i in 0..n {
            ids.push(graph.add_node(i as u64, LatLon::new(60.0, 24.0 + i as f64 * 0.001)));
        }
        for pair in ids.windows(2) {
            graph.add_edge(pair[0], pair[1], "corridor", RoadKind::Residential, 30.0, false);
            graph.add_edge(pair[1], pair[0], "corridor", RoadKind::Residential, 30.0, false);
        }

        let start = graph.get_node(ids[0]).unwrap().pos;
        let end = graph.get_node(*ids.last().unwrap()).unwrap().pos;
        let result = routes(&mut graph, start, end);

        assert_eq!(result.len(), 1);
    }

    #[test]
    fn invalid_coordinates_yield_no_routes() {
        let mut graph = RoadGraph::new();
        let start = LatLon::new(f64::NAN, 24.0);
        let end = LatLon::new(60.0, 24.0);
        assert!(routes(&mut graph, start, end).is_empty());
    }

    #[test]
    fn generated_route_ids_have_expected_shape() {
        let id = generate_route_id();
        assert!(id.starts_with("route-"));
        assert_eq!(id.len(), "route-".len() + 8);
    }
}
