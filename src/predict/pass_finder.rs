use chrono::{DateTime, Duration, Utc};

use crate::config::PredictConfig;
use crate::frames;
use crate::ground::GroundPoint;
use crate::orbit::{self, OrbitModel};

use super::error::PredictError;
use super::types::{Illumination, IlluminationEvent, Pass, PassGeometry, PredictionMode};

const FINE_STEP_SECONDS: i64 = 1; // bisection resolution
const ECLIPSE_SCAN_SECONDS: i64 = 10;

/// A pass predicted from elements whose epoch is further than this ahead of
/// the pass start is tagged as not-yet-valid. Suppression is the filter's
/// call, not the predictor's.
pub const EPOCH_GRACE_MINUTES: i64 = 90;

/// Find all visibility windows for one object over one ground point within
/// `[start, end]`.
///
/// Coarse sweep at the configured step, with every threshold crossing
/// refined by bisection, so reported times are accurate to about a second
/// even with a 30 s sweep. A pass still open at `end` is closed there.
pub fn compute_passes(
    model: &OrbitModel,
    ground: &GroundPoint,
    mode: PredictionMode,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    cfg: &PredictConfig,
) -> Result<Vec<Pass>, PredictError> {
    if model.has_error() {
        return Err(PredictError::Propagation(
            "element set flagged invalid by an earlier failure".into(),
        ));
    }

    let mut passes = Vec::new();
    if end <= start {
        return Ok(passes);
    }

    let step = Duration::seconds(cfg.step_seconds.max(1));
    let mut cursor = start;
    let mut prev_visible = false;
    let mut pass_start: Option<DateTime<Utc>> = None;
    let mut max_elevation = f64::MIN;
    let mut apex_azimuth = 0.0;
    let mut min_distance = f64::MAX;

    while cursor <= end {
        let sample = sweep_sample(model, ground, mode, cfg.min_elevation_deg, cursor)?;
        let visible = sample.metric >= 0.0;

        if visible {
            if !prev_visible {
                let t0 = if cursor <= start {
                    // already visible when the window opens
                    start
                } else {
                    refine_crossing(model, ground, mode, cfg, cursor - step, cursor, true)?
                };
                pass_start = Some(t0);
                max_elevation = f64::MIN;
                apex_azimuth = 0.0;
                min_distance = f64::MAX;
            }
            if sample.elevation_deg > max_elevation {
                max_elevation = sample.elevation_deg;
                apex_azimuth = sample.azimuth_deg;
            }
            if sample.ground_distance_km < min_distance {
                min_distance = sample.ground_distance_km;
            }
        } else if prev_visible {
            if let Some(t0) = pass_start.take() {
                let t1 = refine_crossing(model, ground, mode, cfg, cursor - step, cursor, false)?;
                passes.push(build_pass(
                    model,
                    ground,
                    mode,
                    t0,
                    t1,
                    max_elevation,
                    apex_azimuth,
                    min_distance,
                    start,
                )?);
            }
        }

        prev_visible = visible;
        cursor += step;
    }

    // pass still in progress when the window closes
    if let Some(t0) = pass_start.take() {
        passes.push(build_pass(
            model,
            ground,
            mode,
            t0,
            end,
            max_elevation,
            apex_azimuth,
            min_distance,
            start,
        )?);
    }

    Ok(passes)
}

struct SweepSample {
    /// Signed visibility metric, non-negative while the object is observable.
    metric: f64,
    elevation_deg: f64,
    azimuth_deg: f64,
    ground_distance_km: f64,
}

fn sweep_sample(
    model: &OrbitModel,
    ground: &GroundPoint,
    mode: PredictionMode,
    min_elevation_deg: f64,
    time: DateTime<Utc>,
) -> Result<SweepSample, PredictError> {
    let ecef = model.position_ecef(time)?;
    let look = ground.look_at(ecef);
    let (sub_lat, sub_lon) = frames::ecef_to_geodetic(ecef);
    let ground_distance_km =
        frames::haversine_km(sub_lat, sub_lon, ground.lat_rad(), ground.lon_rad());

    let metric = match mode {
        PredictionMode::Elevation => look.elevation_deg - min_elevation_deg,
        PredictionMode::Swath => model.swath_width_km() / 2.0 - ground_distance_km,
    };

    Ok(SweepSample {
        metric,
        elevation_deg: look.elevation_deg,
        azimuth_deg: look.azimuth_deg,
        ground_distance_km,
    })
}

/// Bisect the visibility boundary inside `(before, after)` down to one
/// second.
fn refine_crossing(
    model: &OrbitModel,
    ground: &GroundPoint,
    mode: PredictionMode,
    cfg: &PredictConfig,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    rising: bool,
) -> Result<DateTime<Utc>, PredictError> {
    let mut low = before;
    let mut high = after;

    while (high - low) > Duration::seconds(FINE_STEP_SECONDS) {
        let mid = low + (high - low) / 2;
        let visible =
            sweep_sample(model, ground, mode, cfg.min_elevation_deg, mid)?.metric >= 0.0;
        if visible == rising {
            high = mid;
        } else {
            low = mid;
        }
    }

    Ok(high)
}

#[allow(clippy::too_many_arguments)]
fn build_pass(
    model: &OrbitModel,
    ground: &GroundPoint,
    mode: PredictionMode,
    t0: DateTime<Utc>,
    t1: DateTime<Utc>,
    max_elevation: f64,
    apex_azimuth: f64,
    min_distance: f64,
    sweep_start: DateTime<Utc>,
) -> Result<Pass, PredictError> {
    let illumination = Illumination {
        ground_dark_at_start: orbit::is_ground_dark(ground, t0)?,
        ground_dark_at_end: orbit::is_ground_dark(ground, t1)?,
        object_eclipsed_at_start: model.is_eclipsed(t0)?,
        object_eclipsed_at_end: model.is_eclipsed(t1)?,
    };
    let transitions = scan_transitions(model, t0, t1)?;

    let geometry = match mode {
        PredictionMode::Elevation => PassGeometry::Elevation {
            max_elevation_deg: round2(max_elevation),
            apex_azimuth_deg: round2(apex_azimuth),
        },
        PredictionMode::Swath => PassGeometry::Swath {
            min_distance_km: round2(min_distance),
            swath_width_km: model.swath_width_km(),
        },
    };

    let epoch = model.epoch();
    let epoch_in_future =
        epoch > sweep_start && t0 < epoch - Duration::minutes(EPOCH_GRACE_MINUTES);

    Ok(Pass {
        satellite: model.name().to_string(),
        norad_id: model.norad_id(),
        ground_point: ground.name().to_string(),
        start: t0,
        end: t1,
        duration_seconds: (t1 - t0).num_seconds(),
        geometry,
        illumination,
        transitions,
        epoch_in_future,
        epoch_time: epoch_in_future.then_some(epoch),
    })
}

/// Eclipse-state changes strictly inside `(t0, t1)`, each refined to one
/// second, in ascending order.
fn scan_transitions(
    model: &OrbitModel,
    t0: DateTime<Utc>,
    t1: DateTime<Utc>,
) -> Result<Vec<IlluminationEvent>, PredictError> {
    let mut events = Vec::new();
    let step = Duration::seconds(ECLIPSE_SCAN_SECONDS);

    let mut prev = model.is_eclipsed(t0)?;
    let mut prev_time = t0;
    let mut cursor = t0 + step;

    loop {
        let probe = cursor.min(t1);
        let state = model.is_eclipsed(probe)?;
        if state != prev {
            let t = refine_transition(model, prev_time, probe, state)?;
            if t > t0 && t < t1 {
                events.push(IlluminationEvent {
                    time: t,
                    enters_shadow: state,
                });
            }
            prev = state;
        }
        prev_time = probe;
        if probe >= t1 {
            break;
        }
        cursor += step;
    }

    Ok(events)
}

fn refine_transition(
    model: &OrbitModel,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    target_state: bool,
) -> Result<DateTime<Utc>, PredictError> {
    let mut low = before;
    let mut high = after;

    while (high - low) > Duration::seconds(FINE_STEP_SECONDS) {
        let mid = low + (high - low) / 2;
        if model.is_eclipsed(mid)? == target_state {
            high = mid;
        } else {
            low = mid;
        }
    }

    Ok(high)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
