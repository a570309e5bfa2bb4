//! The navigation engine façade: orchestrates the location filter, road
//! graph, router, and route matcher behind one handle, and owns the
//! current fix, destination, candidate routes, and the active route.
//!
//! One value holds the loaded state and exposes it through plain methods:
//! no process-global state, no JNI bridge. The embedder constructs one
//! `NavEngine` and owns it; concurrency across threads is the embedder's
//! responsibility.

use navkit_common::{validate_latlon, Fix, MatchResult, RawFix, Route};
use navkit_filter::LocationFilter;
use navkit_geo::{bearing, LatLon};
use navkit_graph::RoadGraph;
use navkit_match::RouteMatcher;
use navkit_osm::ingest_osm_xml;
use std::io::BufRead;
use std::time::Instant;
use tracing::{info, warn};

/// Owns every piece of mutable state the core needs: the location filter,
/// the routable graph, the route matcher, and the façade's own bookkeeping
/// (current fix, destination, candidate routes). Single-threaded and
/// re-entrancy-free — callers from other threads must serialize access
/// externally.
pub struct NavEngine {
    clock: Instant,
    filter: LocationFilter,
    graph: RoadGraph,
    matcher: RouteMatcher,
    last_fix: Option<Fix>,
    destination: Option<LatLon>,
    routes: Vec<Route>,
}

impl Default for NavEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NavEngine {
    pub fn new() -> Self {
        Self {
            clock: Instant::now(),
            filter: LocationFilter::new(),
            graph: RoadGraph::new(),
            matcher: RouteMatcher::new(),
            last_fix: None,
            destination: None,
            routes: Vec::new(),
        }
    }

    /// Replaces the graph wholesale with the contents of an OSM XML 0.6
    /// byte stream. Leaves the previous graph untouched on failure
    /// (malformed XML or zero highway ways) and returns `false`. Success
    /// invalidates any previously active route's `EdgeId`s, so the matcher
    /// is reset along with the candidate route list.
    pub fn load_osm<R: BufRead>(&mut self, reader: R) -> bool {
        let mut fresh = RoadGraph::new();
        match ingest_osm_xml(reader, &mut fresh) {
            Ok(stats) => {
                info!(
                    nodes = stats.nodes_seen,
                    ways = stats.ways_seen,
                    edges = stats.edges_emitted,
                    "loaded osm source"
                );
                self.graph = fresh;
                self.matcher = RouteMatcher::new();
                self.routes.clear();
                true
            }
            Err(err) => {
                warn!(error = %err, "osm ingestion failed, graph left unchanged");
                false
            }
        }
    }

    /// Smooths `raw` through the location filter, stores the result as the
    /// current fix, lazily computes routes on the first fix after a
    /// destination has been set, and reports match guidance against the
    /// active route, if any.
    pub fn update_location(&mut self, raw: RawFix) -> MatchResult {
        let timestamp_s = self.clock.elapsed().as_secs_f64();
        let fix = self.filter.process(raw, timestamp_s);
        self.last_fix = Some(fix);

        if self.destination.is_some() && self.routes.is_empty() {
            self.compute_routes(fix.pos);
        }

        if self.matcher.has_route() {
            self.matcher.match_fix(fix, &self.graph)
        } else {
            MatchResult::no_route(fix.pos, fix.bearing_deg)
        }
    }

    /// Caches `loc` as the destination. If a fix already exists, computes
    /// routes immediately and reports whether at least one was produced;
    /// otherwise the destination is cached and routing is deferred to the
    /// first `update_location` call.
    pub fn set_destination(&mut self, loc: LatLon) -> bool {
        if validate_latlon(loc).is_err() {
            return false;
        }
        self.destination = Some(loc);
        match self.last_fix {
            Some(fix) => self.compute_routes(fix.pos),
            None => true,
        }
    }

    /// Snapshot of the most recently computed candidate routes, primary
    /// first.
    pub fn routes(&self) -> Vec<Route> {
        self.routes.clone()
    }

    /// Activates the alternative route whose id matches `id`, if one
    /// exists among the current candidates.
    pub fn switch_to_route(&mut self, id: &str) -> bool {
        let Some(route) = self.routes.iter().find(|r| r.id == id).cloned() else {
            return false;
        };
        self.matcher.set_route(route, &self.graph);
        true
    }

    /// Routes `start` → `end` independent of any façade state, for
    /// preview/rendering purposes. On routing failure, synthesizes a
    /// straight-line sample of `max(10, max_segments)` points with the
    /// last point's speed zeroed, the same contract the direct-route
    /// fallback uses elsewhere in the core.
    pub fn detailed_path(&mut self, start: LatLon, end: LatLon, max_segments: u32) -> Vec<Fix> {
        let computed = navkit_routing::routes(&mut self.graph, start, end);
        match computed.into_iter().next() {
            Some(route) => resample(&route.points, max_segments.max(2) as usize),
            None => straight_line_fixes(start, end, (max_segments as usize).max(10)),
        }
    }

    /// Graph size diagnostics (ambient "graph statistics" addition,
    /// delegating to `navkit-graph`'s own counters).
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn compute_routes(&mut self, start: LatLon) -> bool {
        let Some(destination) = self.destination else {
            return false;
        };
        let computed = navkit_routing::routes(&mut self.graph, start, destination);
        let produced = !computed.is_empty();
        if let Some(primary) = computed.first() {
            self.matcher.set_route(primary.clone(), &self.graph);
        }
        self.routes = computed;
        produced
    }
}

/// Evenly samples `points` down to at most `max_segments` entries,
/// preserving first and last.
fn resample(points: &[Fix], max_segments: usize) -> Vec<Fix> {
    let n = points.len();
    if n <= max_segments || n == 0 {
        return points.to_vec();
    }
    (0..max_segments)
        .map(|i| {
            let frac = i as f64 / (max_segments - 1).max(1) as f64;
            let idx = ((n - 1) as f64 * frac).round() as usize;
            points[idx.min(n - 1)]
        })
        .collect()
}

/// Straight-line `Fix` sample between two points, used when routing
/// produces no candidate at all (invalid coordinates). Mirrors
/// `navkit-routing`'s direct-route densification: per-point bearing
/// toward the next sample, last point's speed zeroed.
fn straight_line_fixes(start: LatLon, end: LatLon, n: usize) -> Vec<Fix> {
    let n = n.max(2);
    let positions: Vec<LatLon> = (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            LatLon::new(
                start.lat + t * (end.lat - start.lat),
                start.lon + t * (end.lon - start.lon),
            )
        })
        .collect();

    let mut fixes = Vec::with_capacity(n);
    for i in 0..n {
        if i + 1 < n {
            let b = bearing(positions[i], positions[i + 1]) as f32;
            let b = if b.is_finite() { b } else { 0.0 };
            fixes.push(Fix::new(positions[i], b, 5.0, 0.0));
        } else {
            let b = fixes.last().map(|f: &Fix| f.bearing_deg).unwrap_or(0.0);
            fixes.push(Fix::new(positions[i], b, 0.0, 0.0));
        }
    }
    fixes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_location_without_destination_returns_no_route() {
        let mut engine = NavEngine::new();
        let result = engine.update_location(RawFix::new(LatLon::new(60.0, 24.0), 0.0, 0.0, 5.0));
        assert_eq!(result.next_maneuver, navkit_common::Maneuver::NoRoute);
    }

    #[test]
    fn set_destination_before_any_fix_is_cached_without_routing() {
        let mut engine = NavEngine::new();
        let ok = engine.set_destination(LatLon::new(60.1, 24.9));
        assert!(ok);
        assert!(engine.routes().is_empty());
    }

    #[test]
    fn set_destination_rejects_nan_without_mutating_state() {
        let mut engine = NavEngine::new();
        let ok = engine.set_destination(LatLon::new(f64::NAN, 24.9));
        assert!(!ok);
    }

    /// A destination far beyond the direct-route distance cap, requested
    /// on an empty graph, yields exactly one direct route.
    #[test]
    fn far_destination_on_empty_graph_yields_one_direct_route() {
        let mut engine = NavEngine::new();
        engine.set_destination(LatLon::new(60.1, 24.9));
        let result = engine.update_location(RawFix::new(LatLon::new(60.5, 25.5), f32::NAN, f32::NAN, 5.0));

        assert_ne!(result.next_maneuver, navkit_common::Maneuver::NoRoute);
        let routes = engine.routes();
        assert_eq!(routes.len(), 1);
        assert!(routes[0].name.contains("Direct"));
    }

    /// Happy-path sequence: set_destination -> routes() -> switch_to_route
    /// -> update_location leaves the matcher reporting the primary edge's
    /// name at the start of the route.
    #[test]
    fn happy_path_sequence_matches_primary_route_at_start() {
        let mut engine = NavEngine::new();

        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="60.000" lon="24.000"/>
  <node id="2" lat="60.001" lon="24.000"/>
  <node id="3" lat="60.002" lon="24.000"/>
  <way id="10">
    <nd ref="1"/><nd ref="2"/><nd ref="3"/>
    <tag k="highway" v="residential"/>
    <tag k="name" v="Test Street"/>
  </way>
</osm>"#;
        assert!(engine.load_osm(std::io::Cursor::new(xml)));

        let start = LatLon::new(60.000, 24.000);
        let end = LatLon::new(60.002, 24.000);

        let first = engine.update_location(RawFix::new(start, 0.0, 1.0, 5.0));
        assert_eq!(first.next_maneuver, navkit_common::Maneuver::NoRoute);

        assert!(engine.set_destination(end));
        let routes = engine.routes();
        assert!(!routes.is_empty());

        assert!(engine.switch_to_route(&routes[0].id));

        let result = engine.update_location(RawFix::new(start, 0.0, 1.0, 5.0));
        assert_eq!(result.street_name, "Test Street");
    }

    #[test]
    fn switch_to_route_with_unknown_id_fails() {
        let mut engine = NavEngine::new();
        assert!(!engine.switch_to_route("route-doesnotexist"));
    }

    #[test]
    fn detailed_path_has_at_least_ten_points_on_failure() {
        let mut engine = NavEngine::new();
        let path = engine.detailed_path(LatLon::new(f64::NAN, 0.0), LatLon::new(1.0, 1.0), 5);
        assert!(path.len() >= 10);
        assert_eq!(path.last().unwrap().speed_mps, 0.0);
    }

    #[test]
    fn detailed_path_resamples_down_to_max_segments() {
        let mut engine = NavEngine::new();
        let start = LatLon::new(60.0, 24.0);
        let end = LatLon::new(60.3, 24.3);
        let path = engine.detailed_path(start, end, 4);
        assert!(path.len() <= 4);
        assert_eq!(path.first().unwrap().pos, start);
    }

    #[test]
    fn loading_same_osm_twice_yields_identical_counts() {
        let xml = r#"<osm version="0.6">
  <node id="1" lat="60.0" lon="24.0"/>
  <node id="2" lat="60.001" lon="24.001"/>
  <way id="10"><nd ref="1"/><nd ref="2"/><tag k="highway" v="residential"/></way>
</osm>"#;
        let mut engine = NavEngine::new();
        assert!(engine.load_osm(std::io::Cursor::new(xml)));
        let first_nodes = engine.graph.node_count();
        let first_edges = engine.graph.edge_count();

        assert!(engine.load_osm(std::io::Cursor::new(xml)));
        assert_eq!(engine.graph.node_count(), first_nodes);
        assert_eq!(engine.graph.edge_count(), first_edges);
    }
}
