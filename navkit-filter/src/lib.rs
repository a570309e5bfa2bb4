//! Constant-velocity location filter.
//!
//! Four scalar state variables — `lat, lon, lat_vel, lon_vel` — smoothed
//! with a Kalman-style predict/update step per incoming `RawFix`, using
//! explicit scalar gains rather than a full vector/matrix formulation.
//! Four scalars is all a constant-velocity model over lat/lon needs, so no
//! linear-algebra crate is pulled in.

use navkit_common::Fix;
use navkit_common::RawFix;
use navkit_geo::LatLon;

const INITIAL_VAR_POS: f64 = 10.0;
const INITIAL_VAR_VEL: f64 = 5.0;
const PROCESS_NOISE_POS: f64 = 0.01;
#[allow(dead_code)]
const PROCESS_NOISE_VEL: f64 = 0.1;
const MEASUREMENT_NOISE_BASE: f64 = 5.0;
const MAX_VELOCITY_DELTA: f64 = 10.0;
const GAIN_MIN: f64 = 0.1;
const GAIN_MAX: f64 = 0.9;
const VELOCITY_SMOOTH_PREV: f64 = 0.7;
const VELOCITY_SMOOTH_NEW: f64 = 0.3;
const DEFAULT_DT_S: f64 = 0.1;

/// Degrees-per-second to meters-per-second; the same 1°≈111km approximation
/// used throughout the core.
const DEG_PER_S_TO_MPS: f64 = navkit_common::DEG_TO_METERS;

#[derive(Debug, Clone, Copy)]
struct State {
    lat: f64,
    lon: f64,
    lat_vel: f64,
    lon_vel: f64,
    var_pos: f64,
    #[allow(dead_code)]
    var_vel: f64,
    timestamp_s: f64,
    /// True once a velocity estimate has been derived from at least one
    /// predict/update step. The very first such step has no prior estimate
    /// to blend with `VELOCITY_SMOOTH_PREV`, so it is taken unsmoothed —
    /// otherwise the 0.7/0.3 blend against an initial zero velocity would
    /// halve every fresh observer's first real velocity reading.
    has_velocity_estimate: bool,
}

/// A constant-velocity Kalman-style filter. One instance tracks one
/// observer; construct a fresh one per tracked entity.
#[derive(Debug, Default)]
pub struct LocationFilter {
    state: Option<State>,
}

impl LocationFilter {
    pub fn new() -> Self {
        Self { state: None }
    }

    /// Feed one `RawFix` observed at `timestamp_s` (caller-supplied
    /// monotonic clock reading — the core's data model treats the receive
    /// timestamp as implicit, so it is not a `RawFix` field). Always
    /// produces a `Fix`; there is no failure mode.
    pub fn process(&mut self, raw: RawFix, timestamp_s: f64) -> Fix {
        match self.state.take() {
            None => self.init(raw, timestamp_s),
            Some(prev) => self.update(prev, raw, timestamp_s),
        }
    }

    fn init(&mut self, raw: RawFix, timestamp_s: f64) -> Fix {
        let state = State {
            lat: raw.pos.lat,
            lon: raw.pos.lon,
            lat_vel: 0.0,
            lon_vel: 0.0,
            var_pos: INITIAL_VAR_POS,
            var_vel: INITIAL_VAR_VEL,
            timestamp_s,
            has_velocity_estimate: false,
        };
        let fix = synthesize_fix(raw, state.lat, state.lon, state.lat_vel, state.lon_vel);
        self.state = Some(state);
        fix
    }

    fn update(&mut self, prev: State, raw: RawFix, timestamp_s: f64) -> Fix {
        let dt = {
            let observed = timestamp_s - prev.timestamp_s;
            if observed <= 0.0 || observed > 10.0 {
                DEFAULT_DT_S
            } else {
                observed
            }
        };

        let lat_pred = prev.lat + prev.lat_vel * dt;
        let lon_pred = prev.lon + prev.lon_vel * dt;
        let var_pos_pred = prev.var_pos + PROCESS_NOISE_POS;

        let measurement_noise = MEASUREMENT_NOISE_BASE * raw.accuracy_m.max(0.0) as f64 / 10.0;
        let gain = (var_pos_pred / (var_pos_pred + measurement_noise)).clamp(GAIN_MIN, GAIN_MAX);

        let innovation_lat = raw.pos.lat - lat_pred;
        let innovation_lon = raw.pos.lon - lon_pred;
        let lat = lat_pred + gain * innovation_lat;
        let lon = lon_pred + gain * innovation_lon;
        let var_pos = (1.0 - gain) * var_pos_pred;

        let raw_lat_vel = clamp_velocity_delta(prev.lat_vel, innovation_lat / dt);
        let raw_lon_vel = clamp_velocity_delta(prev.lon_vel, innovation_lon / dt);

        let (lat_vel, lon_vel) = if prev.has_velocity_estimate {
            (
                VELOCITY_SMOOTH_PREV * prev.lat_vel + VELOCITY_SMOOTH_NEW * raw_lat_vel,
                VELOCITY_SMOOTH_PREV * prev.lon_vel + VELOCITY_SMOOTH_NEW * raw_lon_vel,
            )
        } else {
            (raw_lat_vel, raw_lon_vel)
        };

        let state = State {
            lat,
            lon,
            lat_vel,
            lon_vel,
            var_pos,
            var_vel: prev.var_vel,
            timestamp_s,
            has_velocity_estimate: true,
        };

        let fix = synthesize_fix(raw, lat, lon, lat_vel, lon_vel);
        self.state = Some(state);
        fix
    }
}

fn clamp_velocity_delta(prev_vel: f64, raw_vel: f64) -> f64 {
    let delta = (raw_vel - prev_vel).clamp(-MAX_VELOCITY_DELTA, MAX_VELOCITY_DELTA);
    prev_vel + delta
}

fn synthesize_fix(raw: RawFix, lat: f64, lon: f64, lat_vel: f64, lon_vel: f64) -> Fix {
    let bearing_deg = if raw.bearing_deg.is_nan() {
        let degrees = lon_vel.atan2(lat_vel).to_degrees();
        (degrees.rem_euclid(360.0)) as f32
    } else {
        raw.bearing_deg
    };

    let speed_mps = if raw.speed_mps.is_nan() {
        ((lat_vel.powi(2) + lon_vel.powi(2)).sqrt() * DEG_PER_S_TO_MPS) as f32
    } else {
        raw.speed_mps
    };

    Fix::new(
        LatLon::new(lat, lon),
        bearing_deg,
        speed_mps,
        raw.accuracy_m * 0.8,
    )
}
