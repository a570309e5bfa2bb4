//! Straight-line fallback route.

use crate::densify::to_fixes;
use navkit_common::{Route, ROUTE_POINT_SPACING_MAX_M};
use navkit_geo::{haversine, LatLon};

/// Jitter applied to intermediate direct-route samples so downstream
/// bearing/collinearity logic never sees an exactly straight run of
/// points.
const JITTER_DEG: f64 = 0.000005;

pub fn direct_route(start: LatLon, end: LatLon, id: String) -> Route {
    let total = haversine(start, end);
    let n = ((total / ROUTE_POINT_SPACING_MAX_M).ceil() as usize).max(1);

    let mut positions = Vec::with_capacity(n + 1);
    positions.push(start);
    for i in 1..n {
        let t = i as f64 / n as f64;
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        let lat = start.lat + t * (end.lat - start.lat) + sign * JITTER_DEG;
        let lon = start.lon + t * (end.lon - start.lon) - sign * JITTER_DEG;
        positions.push(LatLon::new(lat, lon));
    }
    positions.push(end);

    let points = to_fixes(&positions);
    let duration_s = (total / 9.72).round().max(0.0) as u32;

    Route {
        id,
        name: "Direct route".to_string(),
        points,
        duration_s,
    }
}
