//! OSM XML 0.6 ingestion.
//!
//! OSM documents list every `<node>` before the `<way>` elements that
//! reference them, so one streaming pass suffices — positions are
//! collected into a map first, then each way's `<nd>` refs are resolved
//! against it as the way closes.

mod classify;
mod error;

pub use error::IngestError;

use navkit_geo::LatLon;
use navkit_graph::RoadGraph;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::info;

/// Ingestion counters, surfaced for diagnostics and tests (ambient
/// "graph statistics" addition).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub nodes_seen: usize,
    pub ways_seen: usize,
    pub edges_emitted: usize,
}

#[derive(Debug, Default)]
struct WayBuilder {
    refs: Vec<u64>,
    name: String,
    highway: Option<String>,
    oneway_tag: Option<String>,
    access: Option<String>,
    maxspeed: Option<String>,
}

fn attr(e: &BytesStart, key: &str) -> Result<Option<String>, IngestError> {
    for a in e.attributes() {
        let a = a?;
        if a.key.as_ref() == key.as_bytes() {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Streams `reader` as OSM XML 0.6, populating `graph` with the nodes and
/// edges of every accepted way. Ways with no `highway` tag, a rejected
/// class, or `access ∈ {private, no}` contribute nothing. Returns
/// `IngestError::NoHighways` if not a single edge was emitted.
pub fn ingest_osm_xml<R: BufRead>(reader: R, graph: &mut RoadGraph) -> Result<IngestStats, IngestError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text = true;

    let mut buf = Vec::new();
    let mut node_positions: HashMap<u64, LatLon> = HashMap::new();
    let mut stats = IngestStats::default();
    let mut current_way: Option<WayBuilder> = None;

    loop {
        let event = xml.read_event_into(&mut buf)?;
        match event {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"node" => {
                    if let Some((id, pos)) = parse_node(&e)? {
                        node_positions.insert(id, pos);
                        stats.nodes_seen += 1;
                        if stats.nodes_seen % 10_000 == 0 {
                            info!(count = stats.nodes_seen, "ingested nodes");
                        }
                    }
                }
                b"way" => current_way = Some(WayBuilder::default()),
                b"nd" => {
                    if let Some(way) = current_way.as_mut() {
                        if let Some(r) = attr(&e, "ref")? {
                            if let Ok(r) = r.parse::<u64>() {
                                way.refs.push(r);
                            }
                        }
                    }
                }
                b"tag" => {
                    if let Some(way) = current_way.as_mut() {
                        apply_tag(way, &e)?;
                    }
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"way" => {
                if let Some(way) = current_way.take() {
                    stats.ways_seen += 1;
                    let emitted = emit_way(graph, &node_positions, &way);
                    stats.edges_emitted += emitted;
                    if stats.ways_seen % 10_000 == 0 {
                        info!(count = stats.ways_seen, "ingested ways");
                    }
                }
            }
            _ => {}
        }
        buf.clear();
    }

    if stats.edges_emitted == 0 {
        return Err(IngestError::NoHighways);
    }

    Ok(stats)
}

fn parse_node(e: &BytesStart) -> Result<Option<(u64, LatLon)>, IngestError> {
    let (id, lat, lon) = (attr(e, "id")?, attr(e, "lat")?, attr(e, "lon")?);
    let (Some(id), Some(lat), Some(lon)) = (id, lat, lon) else {
        return Ok(None);
    };
    let (Ok(id), Ok(lat), Ok(lon)) = (id.parse::<u64>(), lat.parse::<f64>(), lon.parse::<f64>()) else {
        return Ok(None);
    };
    Ok(Some((id, LatLon::new(lat, lon))))
}

fn apply_tag(way: &mut WayBuilder, e: &BytesStart) -> Result<(), IngestError> {
    let (k, v) = (attr(e, "k")?, attr(e, "v")?);
    let (Some(k), Some(v)) = (k, v) else { return Ok(()) };
    match k.as_str() {
        "highway" => way.highway = Some(v),
        "name" => way.name = v,
        "oneway" => way.oneway_tag = Some(v),
        "access" => way.access = Some(v),
        "maxspeed" => way.maxspeed = Some(v),
        _ => {}
    }
    Ok(())
}

fn emit_way(graph: &mut RoadGraph, positions: &HashMap<u64, LatLon>, way: &WayBuilder) -> usize {
    let Some(highway) = way.highway.as_deref() else {
        return 0;
    };
    if classify::is_access_denied(way.access.as_deref()) {
        return 0;
    }
    let Some((kind, default_speed_kph)) = classify::classify_highway(highway) else {
        return 0;
    };
    let speed_limit_kph = way
        .maxspeed
        .as_deref()
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(default_speed_kph);
    let oneway = classify::is_oneway(way.oneway_tag.as_deref(), highway);
    let name = if way.name.is_empty() {
        "Unnamed Road".to_string()
    } else {
        way.name.clone()
    };

    let mut emitted = 0;
    for pair in way.refs.windows(2) {
        let (ref_a, ref_b) = (pair[0], pair[1]);
        let (Some(&pos_a), Some(&pos_b)) = (positions.get(&ref_a), positions.get(&ref_b)) else {
            continue;
        };
        let node_a = graph.add_node(ref_a, pos_a);
        let node_b = graph.add_node(ref_b, pos_b);

        if graph
            .add_edge(node_a, node_b, name.clone(), kind, speed_limit_kph, oneway)
            .is_some()
        {
            emitted += 1;
        }
        if !oneway
            && graph
                .add_edge(node_b, node_a, name.clone(), kind, speed_limit_kph, oneway)
                .is_some()
        {
            emitted += 1;
        }
    }
    emitted
}
