use thiserror::Error;

use crate::frames::{ecef_to_enu, EARTH_EQUATORIAL_RADIUS_KM, EARTH_FLATTENING};

/// Minimum height above the ellipsoid. Consumers render points at their
/// reported height; anything lower degenerates into the terrain mesh.
pub const MIN_HEIGHT_M: f64 = 2.0;

#[derive(Debug, Error)]
pub enum GroundPointError {
    #[error("latitude out of range: {0}")]
    InvalidLatitude(f64),
    #[error("longitude out of range: {0}")]
    InvalidLongitude(f64),
    #[error("height is not a finite number: {0}")]
    InvalidHeight(f64),
}

/// An observer site on the WGS-84 ellipsoid. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundPoint {
    latitude_deg: f64,
    longitude_deg: f64,
    height_m: f64,
    name: Option<String>,
}

/// Azimuth/elevation/range from a ground point to a target ECEF position.
#[derive(Debug, Clone, Copy)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
}

impl GroundPoint {
    pub fn new(
        latitude_deg: f64,
        longitude_deg: f64,
        height_m: f64,
        name: Option<String>,
    ) -> Result<Self, GroundPointError> {
        if !latitude_deg.is_finite() || latitude_deg.abs() > 90.0 {
            return Err(GroundPointError::InvalidLatitude(latitude_deg));
        }
        if !longitude_deg.is_finite() || longitude_deg.abs() > 180.0 {
            return Err(GroundPointError::InvalidLongitude(longitude_deg));
        }
        if !height_m.is_finite() {
            return Err(GroundPointError::InvalidHeight(height_m));
        }

        Ok(Self {
            latitude_deg,
            longitude_deg,
            height_m: height_m.max(MIN_HEIGHT_M),
            name,
        })
    }

    pub fn latitude_deg(&self) -> f64 {
        self.latitude_deg
    }

    pub fn longitude_deg(&self) -> f64 {
        self.longitude_deg
    }

    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        let a = EARTH_EQUATORIAL_RADIUS_KM;
        let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let height_km = self.height_m / 1000.0;
        [
            (n + height_km) * cos_lat * lon.cos(),
            (n + height_km) * cos_lat * lon.sin(),
            (n * (1.0 - e2) + height_km) * sin_lat,
        ]
    }

    /// Topocentric look angles to a target ECEF position in kilometers.
    pub fn look_at(&self, target_ecef_km: [f64; 3]) -> LookAngles {
        let site = self.position_ecef_km();
        let dr = [
            target_ecef_km[0] - site[0],
            target_ecef_km[1] - site[1],
            target_ecef_km[2] - site[2],
        ];
        let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

        let (east, north, up) = ecef_to_enu(dr, self.lat_rad(), self.lon_rad());
        let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
        let elevation_deg = if range_km > 0.0 {
            (up / range_km).asin().to_degrees()
        } else {
            0.0
        };

        LookAngles {
            azimuth_deg,
            elevation_deg,
            range_km,
        }
    }
}
