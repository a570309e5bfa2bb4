//! Active-route map matching and maneuver guidance.
//!
//! Rather than decoding an entire GPS trace offline, the matcher works one
//! `Fix` at a time against a route fixed by `set_route`, the way a live
//! turn-by-turn guidance loop must.

use navkit_common::{EdgeId, Fix, Maneuver, MatchResult, Route};
use navkit_geo::{bearing, closest_point_on_segment, haversine, signed_bearing_diff, LatLon};
use navkit_graph::RoadGraph;
use std::collections::HashSet;
use tracing::warn;

const NEARBY_RADIUS_M: f64 = 100.0;
const NEARBY_RETRY_RADIUS_M: f64 = 300.0;
const SEGMENT_QUERY_RADIUS_M: f64 = 50.0;
const SEGMENT_QUERY_RETRY_RADIUS_M: f64 = 100.0;
const PERP_DISTANCE_REJECT_M: f64 = 50.0;
const FORWARD_PROGRESS_THRESHOLD: f64 = 0.7;
const HEADING_ALIGNMENT_DEG: f64 = 45.0;
const MANEUVER_ANGLE_THRESHOLD_DEG: f64 = 30.0;
const DISTANCE_WEIGHT: f64 = 1.0;
const BEARING_WEIGHT: f64 = 0.5;
const ON_ROUTE_BONUS: f64 = 0.5;
const OFF_ROUTE_BONUS: f64 = 1.0;

struct Candidate {
    name: String,
    projected: LatLon,
    bearing_deg: f64,
    score: f64,
}

/// Matches live `Fix` observations against a single active `Route`.
/// Re-initialized every time `set_route` is called; holds `EdgeId`s into
/// whatever `RoadGraph` was active at that time — clearing the graph
/// invalidates them.
#[derive(Debug, Default)]
pub struct RouteMatcher {
    route: Option<Route>,
    cumulative: Vec<f64>,
    route_edges: Vec<Option<EdgeId>>,
    closest_i: usize,
}

impl RouteMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Precomputes cumulative distance and a best-effort edge per segment.
    pub fn set_route(&mut self, route: Route, graph: &RoadGraph) {
        for w in route.points.windows(2) {
            let gap = haversine(w[0].pos, w[1].pos);
            if gap > 50.0 {
                warn!(gap, "route point gap exceeds 50m");
            }
        }

        let mut cumulative = Vec::with_capacity(route.points.len());
        let mut acc = 0.0;
        cumulative.push(0.0);
        for w in route.points.windows(2) {
            acc += haversine(w[0].pos, w[1].pos);
            cumulative.push(acc);
        }

        let route_edges = route
            .points
            .windows(2)
            .map(|w| best_edge_for_segment(graph, w[0].pos, w[1].pos))
            .collect();

        self.route = Some(route);
        self.cumulative = cumulative;
        self.route_edges = route_edges;
        self.closest_i = 0;
    }

    pub fn has_route(&self) -> bool {
        self.route.is_some()
    }

    /// Projects `fix` onto the active route and reports guidance. With no
    /// active route, returns the `NoRoute` passthrough result.
    pub fn match_fix(&mut self, fix: Fix, graph: &RoadGraph) -> MatchResult {
        if self.route.is_none() {
            return MatchResult::no_route(fix.pos, fix.bearing_deg);
        }

        self.advance_closest_index(fix);
        let closest_i = self.closest_i;

        let distance_to_next_m = self.distance_to_next_maneuver_m(closest_i);
        let next_index = self.next_maneuver_index(closest_i);
        let next_maneuver = self.maneuver_at(next_index);

        let mut candidates = graph.nearby_edges(fix.pos, NEARBY_RADIUS_M);
        if candidates.is_empty() {
            candidates = graph.nearby_edges(fix.pos, NEARBY_RETRY_RADIUS_M);
        }

        let on_route_set: HashSet<EdgeId> = self.route_edges.iter().flatten().copied().collect();
        let (on_route, off_route): (Vec<EdgeId>, Vec<EdgeId>) =
            candidates.into_iter().partition(|id| on_route_set.contains(id));
        let pool = if !on_route.is_empty() { on_route } else { off_route };

        let best = pool
            .into_iter()
            .filter_map(|id| score_candidate(graph, id, fix, on_route_set.contains(&id)))
            .min_by(|a, b| a.score.partial_cmp(&b.score).unwrap());

        let route = self.route.as_ref().expect("checked above");
        match best {
            Some(c) => MatchResult {
                street_name: c.name,
                next_maneuver,
                distance_to_next_m,
                eta_rfc3339: String::new(),
                matched: c.projected,
                matched_bearing_deg: c.bearing_deg as f32,
            },
            None => MatchResult {
                street_name: route.name.clone(),
                next_maneuver: Maneuver::RecalcNeeded,
                distance_to_next_m,
                eta_rfc3339: String::new(),
                matched: route.points[closest_i].pos,
                matched_bearing_deg: route.points[closest_i].bearing_deg,
            },
        }
    }

    fn advance_closest_index(&mut self, fix: Fix) {
        let route = self.route.as_ref().expect("checked by caller");
        let points = &route.points;

        let mut best_i = 0;
        let mut best_d = f64::MAX;
        for (i, p) in points.iter().enumerate() {
            let d = haversine(fix.pos, p.pos);
            if d < best_d {
                best_d = d;
                best_i = i;
            }
        }

        if best_i + 1 < points.len() {
            let a = points[best_i].pos;
            let b = points[best_i + 1].pos;
            let t = segment_progress(a, b, fix.pos);
            let seg_bearing = bearing(a, b);
            let heading_aligned = signed_bearing_diff(seg_bearing, fix.bearing_deg as f64).abs() <= HEADING_ALIGNMENT_DEG;
            if t > FORWARD_PROGRESS_THRESHOLD && heading_aligned {
                best_i = (best_i + 1).min(points.len() - 1);
            }
        }

        self.closest_i = best_i;
    }

    fn next_maneuver_index(&self, closest_i: usize) -> usize {
        let route = self.route.as_ref().expect("checked by caller");
        let points = &route.points;
        for j in (closest_i + 1)..points.len() {
            if let Some(angle) = turn_angle_at(points, j) {
                if angle.abs() > MANEUVER_ANGLE_THRESHOLD_DEG {
                    return j;
                }
            }
        }
        points.len() - 1
    }

    fn maneuver_at(&self, next_index: usize) -> Maneuver {
        let route = self.route.as_ref().expect("checked by caller");
        if next_index >= route.points.len() - 1 {
            return Maneuver::Arrive;
        }
        let angle = turn_angle_at(&route.points, next_index).unwrap_or(0.0);
        classify_maneuver(angle)
    }

    fn distance_to_next_maneuver_m(&self, closest_i: usize) -> u32 {
        let next_index = self.next_maneuver_index(closest_i);
        let d = self.cumulative[next_index] - self.cumulative[closest_i];
        d.max(0.0).round() as u32
    }
}

fn segment_progress(a: LatLon, b: LatLon, p: LatLon) -> f64 {
    let abx = b.lon - a.lon;
    let aby = b.lat - a.lat;
    let len_sq = abx * abx + aby * aby;
    if len_sq <= 0.0 {
        return 0.0;
    }
    (((p.lon - a.lon) * abx + (p.lat - a.lat) * aby) / len_sq).clamp(0.0, 1.0)
}

fn turn_angle_at(points: &[Fix], j: usize) -> Option<f64> {
    if j == 0 || j + 1 >= points.len() {
        return None;
    }
    let bearing_in = bearing(points[j - 1].pos, points[j].pos);
    let bearing_out = bearing(points[j].pos, points[j + 1].pos);
    Some(signed_bearing_diff(bearing_in, bearing_out))
}

fn classify_maneuver(angle: f64) -> Maneuver {
    let magnitude = angle.abs();
    let right = angle > 0.0;
    if magnitude < 20.0 {
        Maneuver::Continue
    } else if magnitude < 60.0 {
        if right {
            Maneuver::SlightRight
        } else {
            Maneuver::SlightLeft
        }
    } else if magnitude < 120.0 {
        if right {
            Maneuver::Right
        } else {
            Maneuver::Left
        }
    } else if right {
        Maneuver::SharpRight
    } else {
        Maneuver::SharpLeft
    }
}

/// Picks the edge near segment midpoint `(a, b)` minimizing
/// `projected_distance + (bearing_diff / 45°) * 20`.
fn best_edge_for_segment(graph: &RoadGraph, a: LatLon, b: LatLon) -> Option<EdgeId> {
    let mid = LatLon::new((a.lat + b.lat) / 2.0, (a.lon + b.lon) / 2.0);
    let seg_bearing = bearing(a, b);

    let mut candidates = graph.nearby_edges(mid, SEGMENT_QUERY_RADIUS_M);
    if candidates.is_empty() {
        candidates = graph.nearby_edges(mid, SEGMENT_QUERY_RETRY_RADIUS_M);
    }

    candidates
        .into_iter()
        .filter_map(|id| {
            let edge = graph.get_edge(id)?;
            let ea = graph.get_node(edge.from)?.pos;
            let eb = graph.get_node(edge.to)?.pos;
            let proj = closest_point_on_segment(ea, eb, mid);
            let dist = haversine(mid, proj);
            let edge_bearing = bearing(ea, eb);
            let bearing_diff = signed_bearing_diff(seg_bearing, edge_bearing).abs();
            let score = dist + (bearing_diff / 45.0) * 20.0;
            Some((id, score))
        })
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(id, _)| id)
}

/// Scoring multiplier applied when the observed speed is inconsistent with
/// an edge's speed limit (e.g. highway speed on a residential street).
fn speed_factor(speed_mps: f32, speed_limit_kph: f32) -> f64 {
    if speed_mps > 1.0 && speed_limit_kph > 60.0 {
        0.8
    } else if speed_mps > 10.0 && speed_limit_kph < 30.0 {
        1.2
    } else if speed_mps < 5.0 && speed_limit_kph > 70.0 {
        1.2
    } else {
        1.0
    }
}

fn score_candidate(graph: &RoadGraph, edge_id: EdgeId, fix: Fix, is_on_route: bool) -> Option<Candidate> {
    let edge = graph.get_edge(edge_id)?;
    let a = graph.get_node(edge.from)?.pos;
    let b = graph.get_node(edge.to)?.pos;

    let proj = closest_point_on_segment(a, b, fix.pos);
    let perp_dist = haversine(fix.pos, proj);
    if perp_dist > PERP_DISTANCE_REJECT_M {
        return None;
    }

    let mut edge_bearing = bearing(a, b);
    if signed_bearing_diff(edge_bearing, fix.bearing_deg as f64).abs() > 90.0 {
        edge_bearing = (edge_bearing + 180.0) % 360.0;
    }
    let bearing_diff = signed_bearing_diff(edge_bearing, fix.bearing_deg as f64).abs();

    let route_bonus = if is_on_route { ON_ROUTE_BONUS } else { OFF_ROUTE_BONUS };
    let factor = speed_factor(fix.speed_mps, edge.speed_limit_kph);
    let score = (DISTANCE_WEIGHT * perp_dist + BEARING_WEIGHT * (bearing_diff / 180.0) * 50.0) * route_bonus * factor;

    Some(Candidate {
        name: edge.name.clone(),
        projected: proj,
        bearing_deg: edge_bearing,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use navkit_common::RoadKind;

    fn three_point_route_with_graph() -> (Route, RoadGraph) {
        let mut graph = RoadGraph::new();
        let a = graph.add_node(1, LatLon::new(60.000, 24.000));
        let b = graph.add_node(2, LatLon::new(60.001, 24.000));
        let c = graph.add_node(3, LatLon::new(60.002, 24.000));
        graph.add_edge(a, b, "Mannerheimintie", RoadKind::Primary, 50.0, true);
        graph.add_edge(b, c, "Mannerheimintie", RoadKind::Primary, 50.0, true);

        let points = vec![
            Fix::new(LatLon::new(60.000, 24.000), 0.0, 10.0, 0.0),
            Fix::new(LatLon::new(60.001, 24.000), 0.0, 10.0, 0.0),
            Fix::new(LatLon::new(60.002, 24.000), 0.0, 0.0, 0.0),
        ];
        let route = Route {
            id: "route-deadbeef".to_string(),
            name: "Mannerheimintie".to_string(),
            points,
            duration_s: 60,
        };
        (route, graph)
    }

    #[test]
    fn no_route_set_yields_no_route_result() {
        let mut matcher = RouteMatcher::new();
        let graph = RoadGraph::new();
        let result = matcher.match_fix(Fix::new(LatLon::new(0.0, 0.0), 0.0, 0.0, 0.0), &graph);
        assert_eq!(result.next_maneuver, Maneuver::NoRoute);
    }

    /// Feeding a fix at the 3rd route point should match near it and
    /// report the ingested edge's name.
    #[test]
    fn matches_at_third_route_point_with_correct_street_name() {
        let (route, graph) = three_point_route_with_graph();
        let mut matcher = RouteMatcher::new();
        matcher.set_route(route, &graph);

        let fix = Fix::new(LatLon::new(60.002, 24.000), 0.0, 0.0, 0.0);
        let result = matcher.match_fix(fix, &graph);

        assert!(haversine(result.matched, LatLon::new(60.002, 24.000)) < 1.0);
        assert_eq!(result.street_name, "Mannerheimintie");
        assert_eq!(result.next_maneuver, Maneuver::Arrive);
    }

    #[test]
    fn distance_to_next_is_zero_at_arrival() {
        let (route, graph) = three_point_route_with_graph();
        let mut matcher = RouteMatcher::new();
        matcher.set_route(route, &graph);

        let fix = Fix::new(LatLon::new(60.002, 24.000), 0.0, 0.0, 0.0);
        let result = matcher.match_fix(fix, &graph);
        assert_eq!(result.distance_to_next_m, 0);
    }

    #[test]
    fn classify_maneuver_table() {
        assert_eq!(classify_maneuver(5.0), Maneuver::Continue);
        assert_eq!(classify_maneuver(45.0), Maneuver::SlightRight);
        assert_eq!(classify_maneuver(-45.0), Maneuver::SlightLeft);
        assert_eq!(classify_maneuver(90.0), Maneuver::Right);
        assert_eq!(classify_maneuver(-90.0), Maneuver::Left);
        assert_eq!(classify_maneuver(150.0), Maneuver::SharpRight);
        assert_eq!(classify_maneuver(-150.0), Maneuver::SharpLeft);
    }

    #[test]
    fn speed_factor_table_matches_spec() {
        assert!((speed_factor(2.0, 70.0) - 0.8).abs() < 1e-9);
        assert!((speed_factor(12.0, 20.0) - 1.2).abs() < 1e-9);
        assert!((speed_factor(2.0, 80.0) - 1.2).abs() < 1e-9);
        assert!((speed_factor(20.0, 40.0) - 1.0).abs() < 1e-9);
    }
}
