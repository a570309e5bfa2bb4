//! Route densification and smoothing.

use navkit_common::{Fix, ROUTE_POINT_SPACING_MAX_M};
use navkit_common::NodeId;
use navkit_geo::{bearing, haversine, signed_bearing_diff, LatLon};
use navkit_graph::RoadGraph;

const SNAP_GAP_M: f64 = 10.0;
const SMOOTH_BEARING_THRESHOLD_DEG: f64 = 20.0;
const SMOOTH_GAP_THRESHOLD_M: f64 = 50.0;
const COLLINEARITY_RATIO: f64 = 0.8;

fn lerp(a: LatLon, b: LatLon, n: usize) -> Vec<LatLon> {
    (1..=n)
        .map(|i| {
            let t = i as f64 / (n + 1) as f64;
            LatLon::new(a.lat + t * (b.lat - a.lat), a.lon + t * (b.lon - a.lon))
        })
        .collect()
}

/// Expands a node path into a position sequence anchored on the
/// user-supplied `start`/`end`, inserting intermediate samples so no
/// consecutive gap exceeds `ROUTE_POINT_SPACING_MAX_M`. Every path hop
/// already has a direct edge in this graph, so the spacing invariant is
/// what drives subdivision of long edges rather than edge presence.
pub fn densify_positions(graph: &RoadGraph, path: &[NodeId], start: LatLon, end: LatLon) -> Vec<LatLon> {
    let pos = |id: NodeId| graph.get_node(id).map(|n| n.pos);

    let mut points = vec![start];

    if let Some(first) = path.first().and_then(|&id| pos(id)) {
        if haversine(start, first) > SNAP_GAP_M {
            points.extend(lerp(start, first, 3));
        }
    }

    for window in path.windows(2) {
        let (Some(a), Some(b)) = (pos(window[0]), pos(window[1])) else {
            continue;
        };
        points.push(a);
        let gap = haversine(a, b);
        if gap > ROUTE_POINT_SPACING_MAX_M {
            let n = ((gap / 20.0).ceil() as usize).max(2);
            points.extend(lerp(a, b, n));
        }
    }

    if let Some(last) = path.last().and_then(|&id| pos(id)) {
        points.push(last);
        if haversine(last, end) > SNAP_GAP_M {
            points.extend(lerp(last, end, 3));
        }
    }

    points.push(end);
    points
}

/// Drops near-collinear intermediate points, preserving the first and last
/// exactly.
pub fn smooth(positions: &[LatLon]) -> Vec<LatLon> {
    if positions.len() <= 2 {
        return positions.to_vec();
    }

    let mut kept = vec![positions[0]];
    for i in 1..positions.len() - 1 {
        let prev = *kept.last().unwrap();
        let curr = positions[i];
        let next = positions[i + 1];

        let bearing_in = bearing(prev, curr);
        let bearing_out = bearing(curr, next);
        let bearing_change = signed_bearing_diff(bearing_in, bearing_out).abs();
        let gap_prev_curr = haversine(prev, curr);

        let eligible_for_drop = bearing_change < SMOOTH_BEARING_THRESHOLD_DEG && gap_prev_curr <= SMOOTH_GAP_THRESHOLD_M;

        if eligible_for_drop {
            let gap_curr_next = haversine(curr, next);
            let gap_prev_next = haversine(prev, next);
            let collinearity_guard = gap_prev_next >= COLLINEARITY_RATIO * (gap_prev_curr + gap_curr_next);
            if collinearity_guard {
                kept.push(curr);
            }
            continue;
        }

        kept.push(curr);
    }
    kept.push(*positions.last().unwrap());
    kept
}

/// Converts a position sequence into `Fix` values with per-point bearing
/// (toward the next point) and speed `gap/10` clamped to `[5, 30]` m/s; the
/// last point repeats the previous bearing and has speed 0.
pub fn to_fixes(positions: &[LatLon]) -> Vec<Fix> {
    let n = positions.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![Fix::new(positions[0], 0.0, 0.0, 0.0)];
    }

    let bearings: Vec<f32> = (0..n - 1)
        .map(|i| bearing(positions[i], positions[i + 1]) as f32)
        .collect();

    let mut fixes = Vec::with_capacity(n);
    for i in 0..n {
        if i + 1 < n {
            let gap = haversine(positions[i], positions[i + 1]);
            let speed = (gap / 10.0).clamp(5.0, 30.0) as f32;
            fixes.push(Fix::new(positions[i], bearings[i], speed, 0.0));
        } else {
            fixes.push(Fix::new(positions[i], bearings[n - 2], 0.0, 0.0));
        }
    }
    fixes
}

/// Sums `gap / speed` along the route where speed exceeds 0.1 m/s; falls
/// back to `total_length / 9.72 m/s` otherwise.
pub fn duration_s(fixes: &[Fix]) -> u32 {
    let mut total = 0.0;
    let mut any_valid = false;
    for w in fixes.windows(2) {
        let gap = haversine(w[0].pos, w[1].pos);
        let speed = w[0].speed_mps as f64;
        if speed > 0.1 {
            total += gap / speed;
            any_valid = true;
        }
    }
    if !any_valid {
        let length: f64 = fixes.windows(2).map(|w| haversine(w[0].pos, w[1].pos)).sum();
        total = length / 9.72;
    }
    total.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use navkit_common::RoadKind;

    #[test]
    fn densify_prepends_and_appends_user_endpoints() {
        let mut graph = RoadGraph::new();
        let a = graph.add_node(1, LatLon::new(60.0, 24.0));
        let b = graph.add_node(2, LatLon::new(60.001, 24.001));
        graph.add_edge(a, b, "x", RoadKind::Residential, 30.0, false);

        let start = LatLon::new(59.999, 23.999);
        let end = LatLon::new(60.002, 24.002);
        let positions = densify_positions(&graph, &[a, b], start, end);

        assert_eq!(*positions.first().unwrap(), start);
        assert_eq!(*positions.last().unwrap(), end);
    }

    #[test]
    fn smooth_preserves_endpoints() {
        let positions = vec![
            LatLon::new(0.0, 0.0),
            LatLon::new(0.0, 0.0001),
            LatLon::new(0.0, 0.0002),
            LatLon::new(0.0, 0.0010),
        ];
        let smoothed = smooth(&positions);
        assert_eq!(*smoothed.first().unwrap(), positions[0]);
        assert_eq!(*smoothed.last().unwrap(), *positions.last().unwrap());
    }

    #[test]
    fn to_fixes_last_point_has_zero_speed_and_repeats_bearing() {
        let positions = vec![LatLon::new(0.0, 0.0), LatLon::new(0.0, 0.001), LatLon::new(0.0, 0.002)];
        let fixes = to_fixes(&positions);
        let last = fixes.last().unwrap();
        assert_eq!(last.speed_mps, 0.0);
        assert_eq!(last.bearing_deg, fixes[fixes.len() - 2].bearing_deg);
    }

    #[test]
    fn duration_is_positive_for_a_nontrivial_route() {
        let positions = vec![LatLon::new(0.0, 0.0), LatLon::new(0.0, 0.001), LatLon::new(0.0, 0.002)];
        let fixes = to_fixes(&positions);
        assert!(duration_s(&fixes) > 0);
    }
}
