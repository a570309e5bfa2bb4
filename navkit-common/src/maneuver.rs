use navkit_geo::LatLon;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Maneuver {
    Continue,
    SlightLeft,
    Left,
    SharpLeft,
    SlightRight,
    Right,
    SharpRight,
    Arrive,
    FollowRoute,
    NoRoute,
    RecalcNeeded,
}

/// Outcome of projecting a `Fix` onto the active route, returned by
/// `navkit-match`'s `RouteMatcher::match_fix`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub street_name: String,
    pub next_maneuver: Maneuver,
    pub distance_to_next_m: u32,
    /// RFC 3339 timestamp, or empty — ETA is produced externally.
    pub eta_rfc3339: String,
    pub matched: LatLon,
    pub matched_bearing_deg: f32,
}

impl MatchResult {
    /// The "no active route" / "programmer error" passthrough result.
    pub fn no_route(pos: LatLon, bearing_deg: f32) -> Self {
        Self {
            street_name: String::new(),
            next_maneuver: Maneuver::NoRoute,
            distance_to_next_m: 0,
            eta_rfc3339: String::new(),
            matched: pos,
            matched_bearing_deg: bearing_deg,
        }
    }
}
