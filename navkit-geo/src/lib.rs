//! Geodesy primitives: haversine distance and initial bearing on a
//! spherical-Earth approximation.

use serde::{Deserialize, Serialize};

/// Mean Earth radius, meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 decimal-degree coordinate pair.
///
/// `lat` is expected in `[-90, 90]`, `lon` in `[-180, 180]`; callers at the
/// system boundary are responsible for rejecting out-of-range input before
/// it reaches the core (see `navkit-engine`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

fn to_radians(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

fn to_degrees(rad: f64) -> f64 {
    rad * 180.0 / std::f64::consts::PI
}

/// Great-circle distance between two points, in meters.
pub fn haversine(a: LatLon, b: LatLon) -> f64 {
    let lat1 = to_radians(a.lat);
    let lat2 = to_radians(b.lat);
    let dlat = lat2 - lat1;
    let dlon = to_radians(b.lon - a.lon);

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing from `a` to `b`, degrees in `[0, 360)`.
///
/// Undefined (but not NaN — returns 0.0) when `a == b`.
pub fn bearing(a: LatLon, b: LatLon) -> f64 {
    let lat1 = to_radians(a.lat);
    let lat2 = to_radians(b.lat);
    let dlon = to_radians(b.lon - a.lon);

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let theta = y.atan2(x);
    (to_degrees(theta) + 360.0) % 360.0
}

/// Closest point to `p` on segment `a..b`, using planar (degree-space)
/// linear interpolation — adequate at the sub-kilometer scales the graph
/// and route geometry operate at.
pub fn closest_point_on_segment(a: LatLon, b: LatLon, p: LatLon) -> LatLon {
    let abx = b.lon - a.lon;
    let aby = b.lat - a.lat;
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq > 0.0 {
        (((p.lon - a.lon) * abx + (p.lat - a.lat) * aby) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    LatLon::new(a.lat + t * aby, a.lon + t * abx)
}

/// Signed difference `to - from`, wrapped into `(-180, 180]` degrees.
/// Positive means a clockwise (rightward) turn.
pub fn signed_bearing_diff(from: f64, to: f64) -> f64 {
    let mut diff = (to - from) % 360.0;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff <= -180.0 {
        diff += 360.0;
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_zero_for_identical_points() {
        let p = LatLon::new(51.5, -0.12);
        assert_eq!(haversine(p, p), 0.0);
    }

    #[test]
    fn haversine_is_symmetric() {
        let a = LatLon::new(60.17, 24.94);
        let b = LatLon::new(59.33, 18.06);
        assert!((haversine(a, b) - haversine(b, a)).abs() < 1e-6);
    }

    #[test]
    fn haversine_known_distance_helsinki_stockholm() {
        // Helsinki to Stockholm is roughly 390-400 km great-circle.
        let helsinki = LatLon::new(60.1699, 24.9384);
        let stockholm = LatLon::new(59.3293, 18.0686);
        let d = haversine(helsinki, stockholm);
        assert!(d > 380_000.0 && d < 410_000.0, "got {d}");
    }

    #[test]
    fn haversine_triangle_inequality() {
        let a = LatLon::new(60.0, 24.0);
        let b = LatLon::new(60.01, 24.02);
        let c = LatLon::new(60.02, 24.05);
        let ab = haversine(a, b);
        let bc = haversine(b, c);
        let ac = haversine(a, c);
        assert!(ac <= ab + bc + 1.0, "triangle inequality violated within 1m tolerance");
    }

    #[test]
    fn bearing_due_east() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 1.0);
        let b_deg = bearing(a, b);
        assert!((b_deg - 90.0).abs() < 0.5, "got {b_deg}");
    }

    #[test]
    fn bearing_due_north() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(1.0, 0.0);
        let b_deg = bearing(a, b);
        assert!(b_deg.abs() < 0.5, "got {b_deg}");
    }

    #[test]
    fn bearing_is_in_range() {
        let a = LatLon::new(51.5, -0.1);
        let b = LatLon::new(48.85, 2.35);
        let b_deg = bearing(a, b);
        assert!((0.0..360.0).contains(&b_deg));
    }

    #[test]
    fn signed_bearing_diff_wraps_around_north() {
        assert!((signed_bearing_diff(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((signed_bearing_diff(10.0, 350.0) - (-20.0)).abs() < 1e-9);
    }

    #[test]
    fn signed_bearing_diff_handles_exact_180() {
        assert!((signed_bearing_diff(0.0, 180.0) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn closest_point_on_segment_clamps_to_endpoints() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 1.0);
        let before = LatLon::new(0.0, -1.0);
        let after = LatLon::new(0.0, 2.0);
        assert_eq!(closest_point_on_segment(a, b, before), a);
        assert_eq!(closest_point_on_segment(a, b, after), b);
    }

    #[test]
    fn closest_point_on_segment_projects_onto_interior() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 1.0);
        let p = LatLon::new(1.0, 0.5);
        let proj = closest_point_on_segment(a, b, p);
        assert!((proj.lon - 0.5).abs() < 1e-9);
        assert!((proj.lat - 0.0).abs() < 1e-9);
    }
}
