use navkit_geo::LatLon;
use serde::{Deserialize, Serialize};

/// A position sample as it arrives from the OS location provider.
///
/// `bearing_deg`/`speed_mps` may legitimately be `NaN` — the device doesn't
/// always know them — the location filter (`navkit-filter`) is responsible
/// for synthesizing replacements before a `Fix` is produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    pub pos: LatLon,
    pub bearing_deg: f32,
    pub speed_mps: f32,
    pub accuracy_m: f32,
}

impl RawFix {
    pub fn new(pos: LatLon, bearing_deg: f32, speed_mps: f32, accuracy_m: f32) -> Self {
        Self {
            pos,
            bearing_deg,
            speed_mps,
            accuracy_m,
        }
    }
}

/// A smoothed position sample, post-filter: `bearing_deg`/`speed_mps` are
/// always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub pos: LatLon,
    pub bearing_deg: f32,
    pub speed_mps: f32,
    pub accuracy_m: f32,
}

impl Fix {
    pub fn new(pos: LatLon, bearing_deg: f32, speed_mps: f32, accuracy_m: f32) -> Self {
        debug_assert!(bearing_deg.is_finite());
        debug_assert!(speed_mps.is_finite());
        Self {
            pos,
            bearing_deg,
            speed_mps,
            accuracy_m,
        }
    }
}
