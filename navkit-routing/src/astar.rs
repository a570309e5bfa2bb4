//! Node snapping and A* search.
//!
//! The open set is a `PriorityQueue<NodeId, Reverse<_>>` used as a
//! min-heap; a closed set skips stale re-expansion of already-settled
//! nodes instead of decreasing priorities in place.

use crate::cost::CostFn;
use navkit_common::{EdgeId, NodeId};
use navkit_geo::{closest_point_on_segment, haversine, LatLon};
use navkit_graph::RoadGraph;
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// Below this distance from both segment endpoints, a projection snaps to
/// the nearer endpoint instead of minting a new node.
const MIN_SPLIT_DISTANCE_M: f64 = 10.0;

/// Priority scale: millimeter resolution is plenty for routing-scale costs
/// and keeps the priority queue key an exact, totally-ordered integer
/// rather than a float.
fn scaled_priority(f_score: f64, insertion: u64) -> Reverse<(u64, u64)> {
    Reverse(((f_score * 1000.0).round().max(0.0) as u64, insertion))
}

fn consider(best: &mut Option<(NodeId, f64)>, loc: LatLon, candidate: NodeId, pos: LatLon) {
    let d = haversine(loc, pos);
    if best.map_or(true, |(_, best_d)| d < best_d) {
        *best = Some((candidate, d));
    }
}

/// Finds the nearest routable node to `loc` within `radius_m`, splitting an
/// edge in two (via `RoadGraph::split_edge`) when `loc` projects onto its
/// interior at least `MIN_SPLIT_DISTANCE_M` from both endpoints. Returns
/// `None` when no edge lies within range — the caller falls back to a
/// direct route.
pub fn find_nearest_node(graph: &mut RoadGraph, loc: LatLon, radius_m: f64) -> Option<NodeId> {
    let edge_ids: Vec<EdgeId> = graph.nearby_edges(loc, radius_m);
    if edge_ids.is_empty() {
        return None;
    }

    let mut best: Option<(NodeId, f64)> = None;
    let mut to_split: Vec<(EdgeId, LatLon)> = Vec::new();

    for edge_id in &edge_ids {
        let Some(edge) = graph.get_edge(*edge_id) else { continue };
        let (from, to) = (edge.from, edge.to);
        let Some(a) = graph.get_node(from).map(|n| n.pos) else { continue };
        let Some(b) = graph.get_node(to).map(|n| n.pos) else { continue };

        consider(&mut best, loc, from, a);
        consider(&mut best, loc, to, b);

        let proj = closest_point_on_segment(a, b, loc);
        if haversine(a, proj) >= MIN_SPLIT_DISTANCE_M && haversine(b, proj) >= MIN_SPLIT_DISTANCE_M {
            to_split.push((*edge_id, proj));
        }
    }

    for (edge_id, proj) in to_split {
        if let Some(mid) = graph.split_edge(edge_id, proj) {
            consider(&mut best, loc, mid, proj);
        }
    }

    best.map(|(id, _)| id)
}

/// A* search from `start` to `goal` using `cost_fn` for edge weights and
/// haversine distance as the (admissible) heuristic. Returns the node path
/// including both endpoints, or `None` on an exhausted open set.
pub fn astar(graph: &RoadGraph, start: NodeId, goal: NodeId, cost_fn: &dyn CostFn) -> Option<Vec<NodeId>> {
    if start == goal {
        return Some(vec![start]);
    }

    let goal_pos = graph.get_node(goal)?.pos;
    let mut open: PriorityQueue<NodeId, Reverse<(u64, u64)>> = PriorityQueue::new();
    let mut g_score: HashMap<NodeId, f64> = HashMap::new();
    let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();
    let mut closed: HashSet<NodeId> = HashSet::new();
    let mut insertion: u64 = 0;

    g_score.insert(start, 0.0);
    let h0 = haversine(graph.get_node(start)?.pos, goal_pos);
    open.push(start, scaled_priority(h0, insertion));
    insertion += 1;

    while let Some((current, _)) = open.pop() {
        if closed.contains(&current) {
            continue;
        }
        closed.insert(current);

        if current == goal {
            break;
        }

        let Some(node) = graph.get_node(current) else { continue };
        let current_g = g_score[&current];

        for &edge_id in &node.out_edges {
            let Some(edge) = graph.get_edge(edge_id) else { continue };
            if closed.contains(&edge.to) {
                continue;
            }

            let tentative_g = current_g + cost_fn.cost(edge);
            let improves = g_score.get(&edge.to).map_or(true, |&g| tentative_g < g);
            if improves {
                g_score.insert(edge.to, tentative_g);
                came_from.insert(edge.to, current);
                let Some(to_pos) = graph.get_node(edge.to).map(|n| n.pos) else { continue };
                let h = haversine(to_pos, goal_pos);
                open.push(edge.to, scaled_priority(tentative_g + h, insertion));
                insertion += 1;
            }
        }
    }

    if !closed.contains(&goal) {
        return None;
    }

    let mut path = vec![goal];
    let mut cur = goal;
    while cur != start {
        cur = *came_from.get(&cur)?;
        path.push(cur);
    }
    path.reverse();
    Some(path)
}
