//! Highway tag classification: maps an OSM `highway=` value to a coarse
//! `RoadKind` and default speed, and flags ways that are not routable at
//! all (pedestrian infrastructure, access-denied).

use navkit_common::RoadKind;

const REJECTED: &[&str] = &[
    "footway",
    "cycleway",
    "path",
    "steps",
    "pedestrian",
    "bus_guideway",
    "escape",
    "raceway",
    "bridleway",
];

/// Classify an OSM `highway=` value into a `(RoadKind, default_speed_kph)`
/// pair, or `None` if the class is rejected outright (walking/cycling
/// infrastructure).
pub fn classify_highway(value: &str) -> Option<(RoadKind, f32)> {
    if REJECTED.contains(&value) {
        return None;
    }

    Some(match value {
        "motorway" | "trunk" | "motorway_link" | "trunk_link" => (RoadKind::Highway, 100.0),
        "primary" | "secondary" | "primary_link" | "secondary_link" => (RoadKind::Primary, 70.0),
        "tertiary" | "unclassified" | "tertiary_link" => (RoadKind::Secondary, 50.0),
        "residential" | "living_street" => (RoadKind::Residential, 30.0),
        "service" | "track" => (RoadKind::Service, 20.0),
        _ => (RoadKind::Residential, 30.0),
    })
}

/// `access ∈ {private, no}` rejects the way outright, regardless of
/// highway class.
pub fn is_access_denied(access: Option<&str>) -> bool {
    matches!(access, Some("private") | Some("no"))
}

/// Whether a way should be emitted as a single directed edge (no reverse).
pub fn is_oneway(oneway_tag: Option<&str>, highway: &str) -> bool {
    if matches!(oneway_tag, Some("yes") | Some("true") | Some("1")) {
        return true;
    }
    matches!(highway, "motorway" | "motorway_link")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motorway_is_highway_class_100() {
        assert_eq!(classify_highway("motorway"), Some((RoadKind::Highway, 100.0)));
    }

    #[test]
    fn residential_is_30() {
        assert_eq!(
            classify_highway("residential"),
            Some((RoadKind::Residential, 30.0))
        );
    }

    #[test]
    fn footway_is_rejected() {
        assert_eq!(classify_highway("footway"), None);
    }

    #[test]
    fn unknown_value_falls_back_to_residential() {
        assert_eq!(
            classify_highway("totally_unknown_value"),
            Some((RoadKind::Residential, 30.0))
        );
    }

    #[test]
    fn private_access_denied() {
        assert!(is_access_denied(Some("private")));
        assert!(is_access_denied(Some("no")));
        assert!(!is_access_denied(Some("destination")));
        assert!(!is_access_denied(None));
    }

    #[test]
    fn explicit_oneway_yes() {
        assert!(is_oneway(Some("yes"), "residential"));
    }

    #[test]
    fn motorway_is_forced_oneway() {
        assert!(is_oneway(None, "motorway"));
        assert!(is_oneway(None, "motorway_link"));
    }

    #[test]
    fn residential_without_oneway_tag_is_bidirectional() {
        assert!(!is_oneway(None, "residential"));
    }
}
