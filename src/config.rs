use serde::{Deserialize, Serialize};

/// Tuning knobs for the pass sweep and the cache window. Defaults match the
/// interactive use case: a coarse 30 s sweep over a five-day window anchored
/// one day in the past.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictConfig {
    /// Coarse sweep step in seconds. Fine enough to bound missed short
    /// passes; crossings are refined by bisection afterwards.
    pub step_seconds: i64,
    /// Elevation threshold (degrees) that opens and closes a pass in
    /// elevation mode.
    pub min_elevation_deg: f64,
    /// Cache window reach behind `now`, in hours.
    pub window_back_hours: i64,
    /// Cache window reach ahead of `now`, in hours.
    pub window_forward_hours: i64,
    /// Read-side horizon: passes starting further ahead are filtered out.
    pub horizon_hours: i64,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            step_seconds: 30,
            min_elevation_deg: 0.0,
            window_back_hours: 24,
            window_forward_hours: 96,
            horizon_hours: 48,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_spans_five_days() {
        let cfg = PredictConfig::default();
        assert_eq!(cfg.window_back_hours + cfg.window_forward_hours, 120);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: PredictConfig = serde_yaml::from_str("step_seconds: 10").unwrap();
        assert_eq!(cfg.step_seconds, 10);
        assert_eq!(cfg.horizon_hours, 48);
    }
}
