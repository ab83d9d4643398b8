use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;
pub const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.137;
pub const EARTH_FLATTENING: f64 = 1.0 / 298.257_223_563;

/// Epoch range with usable Earth-orientation data. TLEs and the GMST
/// polynomial are both meaningless outside this range.
const MIN_SUPPORTED_YEAR: i32 = 1957;
const MAX_SUPPORTED_YEAR: i32 = 2200;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("no earth orientation data for {0}")]
    UnsupportedEpoch(DateTime<Utc>),
}

/// Greenwich mean sidereal time in radians.
///
/// Time-only rotation model (no precession/nutation corrections), which is
/// the accuracy class SGP4 output calls for.
pub fn gmst(time: DateTime<Utc>) -> Result<f64, FrameError> {
    if time.year() < MIN_SUPPORTED_YEAR || time.year() >= MAX_SUPPORTED_YEAR {
        return Err(FrameError::UnsupportedEpoch(time));
    }

    let jd = time.timestamp_millis() as f64 / 86_400_000.0 + 2_440_587.5;
    let d = jd - 2_451_545.0;
    let t = d / 36_525.0;
    let gmst_deg = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;

    Ok(gmst_deg.rem_euclid(360.0).to_radians())
}

/// Rotate an inertial (TEME) position vector into the Earth-fixed frame.
pub fn inertial_to_fixed(pos: [f64; 3], time: DateTime<Utc>) -> Result<[f64; 3], FrameError> {
    let theta = gmst(time)?;
    let (sin_t, cos_t) = theta.sin_cos();
    Ok([
        pos[0] * cos_t + pos[1] * sin_t,
        -pos[0] * sin_t + pos[1] * cos_t,
        pos[2],
    ])
}

/// Rotate an Earth-fixed position vector back into the inertial (TEME) frame.
pub fn fixed_to_inertial(pos: [f64; 3], time: DateTime<Utc>) -> Result<[f64; 3], FrameError> {
    let theta = gmst(time)?;
    let (sin_t, cos_t) = theta.sin_cos();
    Ok([
        pos[0] * cos_t - pos[1] * sin_t,
        pos[0] * sin_t + pos[1] * cos_t,
        pos[2],
    ])
}

/// East/north/up components of `dr` as seen from a site at the given
/// geodetic latitude/longitude (radians).
pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

/// Geodetic latitude/longitude (radians) under an ECEF position, Bowring's
/// single-iteration method. Good to well under the sweep resolution for
/// orbital altitudes.
pub fn ecef_to_geodetic(pos: [f64; 3]) -> (f64, f64) {
    let a = EARTH_EQUATORIAL_RADIUS_KM;
    let f = EARTH_FLATTENING;
    let b = a * (1.0 - f);
    let e2 = f * (2.0 - f);
    let ep2 = e2 / (1.0 - e2);

    let lon = pos[1].atan2(pos[0]);
    let p = (pos[0] * pos[0] + pos[1] * pos[1]).sqrt();
    let theta = (pos[2] * a).atan2(p * b);
    let (sin_th, cos_th) = theta.sin_cos();
    let lat = (pos[2] + ep2 * b * sin_th.powi(3)).atan2(p - e2 * a * cos_th.powi(3));

    (lat, lon)
}

/// Great-circle distance in kilometers between two geodetic points (radians).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const MEAN_RADIUS_KM: f64 = 6371.0;

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * MEAN_RADIUS_KM * h.sqrt().asin()
}
