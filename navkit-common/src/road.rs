use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadKind {
    Highway,
    Primary,
    Secondary,
    Residential,
    Service,
}

impl RoadKind {
    /// Default speed limit (kph) used when OSM `maxspeed` is absent or
    /// unparseable, keyed off the ingester's highway-classification table.
    pub fn default_speed_kph(self) -> f32 {
        match self {
            RoadKind::Highway => 100.0,
            RoadKind::Primary => 70.0,
            RoadKind::Secondary => 50.0,
            RoadKind::Residential => 30.0,
            RoadKind::Service => 20.0,
        }
    }
}
