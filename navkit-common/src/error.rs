//! Shared typed-error kinds. Crate-local errors (`navkit-osm::IngestError`,
//! ...) wrap or sit alongside these; nothing in this workspace lets a
//! `Result` cross the public façade — the façade converts every internal
//! error into the bool/empty-list/`NoRoute` contract callers see.

use thiserror::Error;

/// Coordinate validation failure at the system boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("latitude/longitude must be finite, got ({0}, {1})")]
    NotFinite(String, String),
    #[error("latitude {0} out of range [-90, 90]")]
    LatOutOfRange(String),
    #[error("longitude {0} out of range [-180, 180]")]
    LonOutOfRange(String),
}

/// Validate a `LatLon`: lat in [-90, 90], lon in [-180, 180], both finite.
pub fn validate_latlon(pos: navkit_geo::LatLon) -> Result<(), CoordinateError> {
    if !pos.lat.is_finite() || !pos.lon.is_finite() {
        return Err(CoordinateError::NotFinite(
            pos.lat.to_string(),
            pos.lon.to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&pos.lat) {
        return Err(CoordinateError::LatOutOfRange(pos.lat.to_string()));
    }
    if !(-180.0..=180.0).contains(&pos.lon) {
        return Err(CoordinateError::LonOutOfRange(pos.lon.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use navkit_geo::LatLon;

    #[test]
    fn rejects_nan() {
        let p = LatLon::new(f64::NAN, 10.0);
        assert!(validate_latlon(p).is_err());
    }

    #[test]
    fn rejects_out_of_range_lat() {
        let p = LatLon::new(95.0, 10.0);
        assert!(validate_latlon(p).is_err());
    }

    #[test]
    fn accepts_valid_point() {
        let p = LatLon::new(60.17, 24.94);
        assert!(validate_latlon(p).is_ok());
    }
}
