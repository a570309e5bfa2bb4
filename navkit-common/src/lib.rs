//! Shared types and error kinds for the navkit navigation core.

pub mod error;
pub mod fix;
pub mod ids;
pub mod maneuver;
pub mod road;
pub mod route;

pub use error::{validate_latlon, CoordinateError};
pub use fix::{Fix, RawFix};
pub use ids::{EdgeId, NodeId};
pub use maneuver::{Maneuver, MatchResult};
pub use road::RoadKind;
pub use route::Route;

/// Resource limits shared across components.
pub const MAX_ROUTE_POINTS: usize = 1000;
pub const NODE_SEARCH_RADIUS_M: f64 = 10_000.0;
pub const MAX_ROUTE_DISTANCE_M: f64 = 10_000.0;
pub const SPATIAL_CELL_SIZE_DEG: f64 = 0.001;
pub const ALTERNATIVE_SAMPLE_COUNT: usize = 10;
pub const ROUTE_POINT_SPACING_MAX_M: f64 = 25.0;

/// Flat 1°≈111km approximation used throughout the core. Applies to both
/// the filter and any other component converting a degree offset to a
/// metric one without a local cosine correction.
pub const DEG_TO_METERS: f64 = 111_000.0;
