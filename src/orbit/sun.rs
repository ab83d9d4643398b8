use chrono::{DateTime, Datelike, Timelike, Utc};
use practical_astronomy_rust::sun as pa_sun;

use crate::frames::{self, FrameError, EARTH_EQUATORIAL_RADIUS_KM};
use crate::ground::GroundPoint;

/// Geocentric Sun position in the equatorial inertial frame, kilometers.
pub fn sun_position_inertial(time: DateTime<Utc>) -> [f64; 3] {
    let year = time.year() as u32;
    let month = time.month();
    let day = time.day();
    let hh = time.hour() as f64;
    let mm = time.minute() as f64;
    let ss = time.second() as f64 + time.timestamp_subsec_micros() as f64 / 1.0e6;

    let (ra_h, ra_m, ra_s, dec_d, dec_m, dec_s) =
        pa_sun::precise_position_of_sun(hh, mm, ss, day as f64, month, year, false, 0);
    let ra = hms_to_deg(ra_h, ra_m, ra_s).to_radians();
    let dec = dms_to_deg(dec_d, dec_m, dec_s).to_radians();

    let (dist_km, _ang_deg, _ang_min, _ang_sec) =
        pa_sun::sun_distance_and_angular_size(hh, mm, ss, day as f64, month, year, false, 0);

    [
        dist_km * dec.cos() * ra.cos(),
        dist_km * dec.cos() * ra.sin(),
        dist_km * dec.sin(),
    ]
}

/// Cylindrical Earth-shadow test for an inertial satellite position in
/// kilometers: in shadow iff the position is on the anti-Sun side and within
/// one Earth radius of the Earth-Sun axis.
pub fn is_in_earth_shadow(sat_inertial_km: [f64; 3], time: DateTime<Utc>) -> bool {
    let sun = sun_position_inertial(time);
    let sun_len = (sun[0] * sun[0] + sun[1] * sun[1] + sun[2] * sun[2]).sqrt();
    let sun_dir = [sun[0] / sun_len, sun[1] / sun_len, sun[2] / sun_len];

    let proj = sat_inertial_km[0] * sun_dir[0]
        + sat_inertial_km[1] * sun_dir[1]
        + sat_inertial_km[2] * sun_dir[2];
    if proj > 0.0 {
        return false; // sunward side
    }

    let perp = [
        sat_inertial_km[0] - proj * sun_dir[0],
        sat_inertial_km[1] - proj * sun_dir[1],
        sat_inertial_km[2] - proj * sun_dir[2],
    ];
    let perp_dist = (perp[0] * perp[0] + perp[1] * perp[1] + perp[2] * perp[2]).sqrt();

    perp_dist < EARTH_EQUATORIAL_RADIUS_KM
}

/// True when the geometric Sun elevation at the ground point is below the
/// horizon.
pub fn is_ground_dark(ground: &GroundPoint, time: DateTime<Utc>) -> Result<bool, FrameError> {
    let sun_ecef = frames::inertial_to_fixed(sun_position_inertial(time), time)?;
    Ok(ground.look_at(sun_ecef).elevation_deg < 0.0)
}

fn hms_to_deg(h: f64, m: f64, s: f64) -> f64 {
    (h + m / 60.0 + s / 3600.0) * 15.0
}

fn dms_to_deg(d: f64, m: f64, s: f64) -> f64 {
    let sign = if d < 0.0 { -1.0 } else { 1.0 };
    sign * (d.abs() + m / 60.0 + s / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sun_distance_is_about_one_au() {
        let t = Utc.with_ymd_and_hms(2008, 9, 21, 12, 0, 0).unwrap();
        let sun = sun_position_inertial(t);
        let dist = (sun[0] * sun[0] + sun[1] * sun[1] + sun[2] * sun[2]).sqrt();
        assert!(dist > 1.4e8 && dist < 1.6e8, "dist = {dist}");
    }

    #[test]
    fn sunward_point_is_lit_antisunward_point_is_dark() {
        let t = Utc.with_ymd_and_hms(2008, 9, 21, 12, 0, 0).unwrap();
        let sun = sun_position_inertial(t);
        let sun_len = (sun[0] * sun[0] + sun[1] * sun[1] + sun[2] * sun[2]).sqrt();

        let r = EARTH_EQUATORIAL_RADIUS_KM + 400.0;
        let toward = [sun[0] / sun_len * r, sun[1] / sun_len * r, sun[2] / sun_len * r];
        let away = [-toward[0], -toward[1], -toward[2]];

        assert!(!is_in_earth_shadow(toward, t));
        assert!(is_in_earth_shadow(away, t));
    }

    #[test]
    fn noon_site_is_lit_midnight_site_is_dark() {
        // Equinox: the subsolar point tracks the equator, so local noon on
        // the equator is unambiguously lit and local midnight dark.
        let t = Utc.with_ymd_and_hms(2008, 9, 22, 12, 0, 0).unwrap();
        let noon = GroundPoint::new(0.0, 0.0, 2.0, None).unwrap();
        let midnight = GroundPoint::new(0.0, 180.0, 2.0, None).unwrap();

        assert!(!is_ground_dark(&noon, t).unwrap());
        assert!(is_ground_dark(&midnight, t).unwrap());
    }
}
