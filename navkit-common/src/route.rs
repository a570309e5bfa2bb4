use crate::Fix;
use serde::{Deserialize, Serialize};

/// A computed route: a densified polyline of `Fix` samples plus metadata.
///
/// `points` always has at least two entries; `points[0]`/`points.last()`
/// are the user-supplied origin/destination unless they snapped onto an
/// existing graph node within 10 m.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub points: Vec<Fix>,
    pub duration_s: u32,
}

impl Route {
    pub fn total_length_m(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| navkit_geo::haversine(w[0].pos, w[1].pos))
            .sum()
    }
}
