use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use sgp4::{Constants, Elements};

use super::error::OrbitError;
use super::sun;
use crate::frames;

/// Known sensor swaths in kilometers, keyed on a substring of the catalog
/// name. Anything else gets the default.
const SENSOR_SWATHS_KM: &[(&str, f64)] = &[
    ("NOAA-20", 3000.0),
    ("NOAA-21", 3000.0),
    ("SUOMI", 3000.0),
    ("JPSS", 3000.0),
    ("TERRA", 2330.0),
    ("AQUA", 2330.0),
    ("LANDSAT", 185.0),
    ("SENTINEL-2", 290.0),
];

const DEFAULT_SWATH_KM: f64 = 2000.0;

const SAMPLES_PER_REV: i32 = 120;

/// Inertial (TEME) state at an instant: position in km, velocity in km/s.
#[derive(Debug, Clone, Copy)]
pub struct TemeState {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
}

/// One tracked object's orbital element set plus everything derived from it.
///
/// The element set is immutable; a refreshed TLE means a new model. The only
/// interior state is a sticky error flag raised on the first propagation
/// failure and a call counter used by coverage tests.
pub struct OrbitModel {
    elements: Elements,
    constants: Constants,
    name: String,
    norad_id: u32,
    epoch: DateTime<Utc>,
    period: Duration,
    swath_width_km: f64,
    error: AtomicBool,
    propagations: AtomicU64,
}

impl OrbitModel {
    pub fn from_tle(name: Option<String>, line1: &str, line2: &str) -> Result<Self, OrbitError> {
        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())?;
        let constants = Constants::from_elements(&elements)?;

        let name = elements
            .object_name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", elements.norad_id));
        let norad_id = elements.norad_id as u32;
        let epoch = DateTime::from_naive_utc_and_offset(elements.datetime, Utc);
        let period = Duration::milliseconds((86_400_000.0 / elements.mean_motion) as i64);
        let swath_width_km = swath_for_name(&name);

        Ok(Self {
            elements,
            constants,
            name,
            norad_id,
            epoch,
            period,
            swath_width_km,
            error: AtomicBool::new(false),
            propagations: AtomicU64::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn norad_id(&self) -> u32 {
        self.norad_id
    }

    /// Reference epoch of the element set.
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Orbital period derived from the mean-motion term.
    pub fn orbital_period(&self) -> Duration {
        self.period
    }

    /// Sample spacing used by the position cache: 1/120 of a revolution.
    pub fn sample_spacing(&self) -> Duration {
        self.period / SAMPLES_PER_REV
    }

    pub fn swath_width_km(&self) -> f64 {
        self.swath_width_km
    }

    /// True once any propagation has failed. Stays set for the lifetime of
    /// this model; a fresh element set clears it by replacing the model.
    pub fn has_error(&self) -> bool {
        self.error.load(Ordering::Relaxed)
    }

    /// Number of SGP4 evaluations performed through this model.
    pub fn propagation_count(&self) -> u64 {
        self.propagations.load(Ordering::Relaxed)
    }

    /// SGP4 state at `time` in the inertial (TEME) frame. Deterministic:
    /// identical inputs give bit-identical output.
    pub fn propagate(&self, time: DateTime<Utc>) -> Result<TemeState, OrbitError> {
        self.propagations.fetch_add(1, Ordering::Relaxed);

        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&time.naive_utc())
            .map_err(|e| self.fail(e.to_string()))?;
        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| self.fail(e.to_string()))?;

        Ok(TemeState {
            position: prediction.position,
            velocity: prediction.velocity,
        })
    }

    /// Earth-fixed position at `time` in kilometers.
    pub fn position_ecef(&self, time: DateTime<Utc>) -> Result<[f64; 3], OrbitError> {
        let state = self.propagate(time)?;
        Ok(frames::inertial_to_fixed(state.position, time)?)
    }

    /// Geodetic latitude/longitude (radians) of the sub-satellite point.
    pub fn subpoint(&self, time: DateTime<Utc>) -> Result<(f64, f64), OrbitError> {
        let ecef = self.position_ecef(time)?;
        Ok(frames::ecef_to_geodetic(ecef))
    }

    /// True when the object sits inside Earth's geometric shadow.
    pub fn is_eclipsed(&self, time: DateTime<Utc>) -> Result<bool, OrbitError> {
        let state = self.propagate(time)?;
        Ok(sun::is_in_earth_shadow(state.position, time))
    }

    fn fail(&self, message: String) -> OrbitError {
        self.error.store(true, Ordering::Relaxed);
        OrbitError::Propagation(message)
    }

    #[cfg(test)]
    pub(crate) fn mark_failed(&self) {
        self.error.store(true, Ordering::Relaxed);
    }
}

fn swath_for_name(name: &str) -> f64 {
    let upper = name.to_uppercase();
    for (key, width) in SENSOR_SWATHS_KM {
        if upper.contains(key) {
            return *width;
        }
    }
    DEFAULT_SWATH_KM
}
