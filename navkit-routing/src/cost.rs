//! Pluggable edge-cost functions for A*.

use navkit_graph::Edge;
use navkit_common::RoadKind;

pub trait CostFn {
    fn cost(&self, edge: &Edge) -> f64;
    /// Multiplier applied to the route's reported duration once a path is
    /// found under this cost function.
    fn duration_multiplier(&self) -> f64 {
        1.0
    }
}

/// Default cost: raw edge length. Used for the primary route.
pub struct LengthCost;

impl CostFn for LengthCost {
    fn cost(&self, edge: &Edge) -> f64 {
        edge.length_m
    }
}

/// Favors high-speed roads by discounting their effective length.
pub struct FastestCost;

impl CostFn for FastestCost {
    fn cost(&self, edge: &Edge) -> f64 {
        edge.length_m * (50.0 / edge.speed_limit_kph as f64)
    }

    fn duration_multiplier(&self) -> f64 {
        1.2
    }
}

/// Penalizes `Highway` edges tenfold to steer around them.
pub struct NoHighwaysCost;

impl CostFn for NoHighwaysCost {
    fn cost(&self, edge: &Edge) -> f64 {
        let factor = if edge.kind == RoadKind::Highway { 10.0 } else { 1.0 };
        edge.length_m * factor
    }

    fn duration_multiplier(&self) -> f64 {
        0.8
    }
}
