use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which visibility criterion opens and closes a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    /// Observer elevation angle above a minimum threshold.
    Elevation,
    /// Sub-satellite ground track within half a swath width of the point.
    Swath,
}

/// Mode-specific pass geometry. The two variants are mutually exclusive by
/// construction.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassGeometry {
    Elevation {
        max_elevation_deg: f64,
        apex_azimuth_deg: f64,
    },
    Swath {
        min_distance_km: f64,
        swath_width_km: f64,
    },
}

/// An eclipse-state change of the orbiting object strictly inside a pass.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IlluminationEvent {
    pub time: DateTime<Utc>,
    pub enters_shadow: bool,
}

/// Illumination state at both ends of a pass. Ground and object states are
/// always recorded as start/end pairs.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Illumination {
    pub ground_dark_at_start: bool,
    pub ground_dark_at_end: bool,
    pub object_eclipsed_at_start: bool,
    pub object_eclipsed_at_end: bool,
}

/// A contiguous window during which an object is observable from a ground
/// point. Immutable once produced by the predictor.
#[derive(Debug, Clone, Serialize)]
pub struct Pass {
    pub satellite: String,
    pub norad_id: u32,
    pub ground_point: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: i64,
    pub geometry: PassGeometry,
    pub illumination: Illumination,
    /// Eclipse transitions strictly between `start` and `end`, ascending.
    pub transitions: Vec<IlluminationEvent>,
    /// Set when the element-set epoch postdates the sweep start by enough
    /// that this pass is predicted from not-yet-valid elements.
    pub epoch_in_future: bool,
    pub epoch_time: Option<DateTime<Utc>>,
}
