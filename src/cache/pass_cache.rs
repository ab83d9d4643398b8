use chrono::{DateTime, Duration, Utc};

use crate::config::PredictConfig;
use crate::ground::GroundPoint;
use crate::orbit::OrbitModel;
use crate::predict::{compute_passes, Pass, PredictError, PredictionMode, VisibilityFilters};

/// One committed prediction result for a (ground point, object) pair.
#[derive(Debug, Clone)]
pub struct CachedPasses {
    pub window: (DateTime<Utc>, DateTime<Utc>),
    pub passes: Vec<Pass>,
    pub snapshot: VisibilityFilters,
    pub computed_at: DateTime<Utc>,
}

/// Handle for an in-flight recompute. Commits carrying a token that was
/// superseded by a later `begin_update` are discarded, so an old, slow
/// recompute can never overwrite a newer result.
#[derive(Debug, Clone, Copy)]
pub struct UpdateToken {
    seq: u64,
}

/// Per-pair pass cache: Empty -> Valid -> Stale -> Valid -> ...
///
/// Valid means the current time sits inside the cached window, the filter
/// snapshot matches the live configuration, and no explicit invalidation is
/// pending. Anything else is stale and the next update recomputes.
#[derive(Debug, Default)]
pub struct PassCache {
    entry: Option<CachedPasses>,
    issued_seq: u64,
    committed_seq: u64,
    invalidated: bool,
}

impl PassCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self, now: DateTime<Utc>, filters: &VisibilityFilters) -> bool {
        if self.invalidated {
            return false;
        }
        match &self.entry {
            Some(entry) => {
                entry.window.0 <= now && now <= entry.window.1 && entry.snapshot == *filters
            }
            None => false,
        }
    }

    /// Force the next update to recompute, regardless of window validity.
    /// Used when the ground point, the tracked set, or the prediction mode
    /// changes.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    /// The cached passes, possibly stale; empty before the first commit.
    /// Readers always see a complete list, never a partial update.
    pub fn passes(&self) -> &[Pass] {
        self.entry.as_ref().map(|e| e.passes.as_slice()).unwrap_or(&[])
    }

    pub fn entry(&self) -> Option<&CachedPasses> {
        self.entry.as_ref()
    }

    pub fn begin_update(&mut self) -> UpdateToken {
        self.issued_seq += 1;
        UpdateToken {
            seq: self.issued_seq,
        }
    }

    /// Install a recompute result. Returns false (and changes nothing) when
    /// a later recompute already committed.
    pub fn commit(
        &mut self,
        token: UpdateToken,
        window: (DateTime<Utc>, DateTime<Utc>),
        passes: Vec<Pass>,
        snapshot: VisibilityFilters,
        now: DateTime<Utc>,
    ) -> bool {
        if token.seq <= self.committed_seq {
            return false; // stale race, discard silently
        }
        self.committed_seq = token.seq;
        self.entry = Some(CachedPasses {
            window,
            passes,
            snapshot,
            computed_at: now,
        });
        self.invalidated = false;
        true
    }

    /// No-op while valid; otherwise recompute `[now - back, now + forward]`
    /// through the predictor and replace the contents atomically. Returns
    /// whether a recompute happened.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        model: &OrbitModel,
        ground: &GroundPoint,
        mode: PredictionMode,
        now: DateTime<Utc>,
        filters: &VisibilityFilters,
        cfg: &PredictConfig,
    ) -> Result<bool, PredictError> {
        if self.is_valid(now, filters) {
            return Ok(false);
        }

        let token = self.begin_update();
        let window = cache_window(now, cfg);
        let passes = compute_passes(model, ground, mode, window.0, window.1, cfg)?;
        Ok(self.commit(token, window, passes, *filters, now))
    }
}

pub fn cache_window(now: DateTime<Utc>, cfg: &PredictConfig) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        now - Duration::hours(cfg.window_back_hours),
        now + Duration::hours(cfg.window_forward_hours),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ISS_LINE1: &str =
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_LINE2: &str =
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    fn fixture() -> (OrbitModel, GroundPoint, PredictConfig, DateTime<Utc>) {
        let model =
            OrbitModel::from_tle(Some("ISS (ZARYA)".into()), ISS_LINE1, ISS_LINE2).unwrap();
        let ground = GroundPoint::new(40.4168, -3.7038, 667.0, Some("Madrid".into())).unwrap();
        // keep the test sweep short
        let cfg = PredictConfig {
            window_back_hours: 2,
            window_forward_hours: 10,
            ..PredictConfig::default()
        };
        let now = Utc.with_ymd_and_hms(2008, 9, 21, 0, 0, 0).unwrap();
        (model, ground, cfg, now)
    }

    #[test]
    fn first_update_computes_second_is_a_noop() {
        let (model, ground, cfg, now) = fixture();
        let filters = VisibilityFilters::default();
        let mut cache = PassCache::new();

        assert!(!cache.is_valid(now, &filters));
        assert!(cache
            .update(&model, &ground, PredictionMode::Elevation, now, &filters, &cfg)
            .unwrap());
        assert!(cache.is_valid(now, &filters));
        assert!(!cache
            .update(&model, &ground, PredictionMode::Elevation, now, &filters, &cfg)
            .unwrap());
    }

    #[test]
    fn leaving_the_window_goes_stale() {
        let (model, ground, cfg, now) = fixture();
        let filters = VisibilityFilters::default();
        let mut cache = PassCache::new();
        cache
            .update(&model, &ground, PredictionMode::Elevation, now, &filters, &cfg)
            .unwrap();

        let later = now + Duration::hours(cfg.window_forward_hours + 1);
        assert!(!cache.is_valid(later, &filters));
        assert!(cache
            .update(&model, &ground, PredictionMode::Elevation, later, &filters, &cfg)
            .unwrap());
        assert!(cache.is_valid(later, &filters));
    }

    #[test]
    fn explicit_invalidation_forces_recompute() {
        let (model, ground, cfg, now) = fixture();
        let filters = VisibilityFilters::default();
        let mut cache = PassCache::new();
        cache
            .update(&model, &ground, PredictionMode::Elevation, now, &filters, &cfg)
            .unwrap();

        cache.invalidate();
        assert!(!cache.is_valid(now, &filters));
        assert!(cache
            .update(&model, &ground, PredictionMode::Elevation, now, &filters, &cfg)
            .unwrap());
    }

    #[test]
    fn snapshot_comparison_is_strict_both_ways() {
        let (model, ground, cfg, now) = fixture();
        let f1 = VisibilityFilters::default();
        let f2 = VisibilityFilters {
            hide_sunlit: true,
            show_only_lit: false,
        };
        let mut cache = PassCache::new();

        cache
            .update(&model, &ground, PredictionMode::Elevation, now, &f1, &cfg)
            .unwrap();
        // toggling to f2 misses
        assert!(!cache.is_valid(now, &f2));
        assert!(cache
            .update(&model, &ground, PredictionMode::Elevation, now, &f2, &cfg)
            .unwrap());
        // toggling straight back to f1 misses again
        assert!(!cache.is_valid(now, &f1));
        assert!(cache
            .update(&model, &ground, PredictionMode::Elevation, now, &f1, &cfg)
            .unwrap());
    }

    #[test]
    fn stale_commit_is_discarded() {
        let (_, _, _, now) = fixture();
        let mut cache = PassCache::new();
        let filters = VisibilityFilters::default();
        let window = (now, now + Duration::hours(1));

        let older = cache.begin_update();
        let newer = cache.begin_update();

        assert!(cache.commit(newer, window, Vec::new(), filters, now));
        // the older in-flight result arrives late and must lose
        assert!(!cache.commit(older, window, Vec::new(), filters, now + Duration::seconds(5)));
        assert_eq!(cache.entry().unwrap().computed_at, now);
    }

    #[test]
    fn poisoned_model_surfaces_an_error_not_a_commit() {
        let (model, ground, cfg, now) = fixture();
        model.mark_failed();
        let filters = VisibilityFilters::default();
        let mut cache = PassCache::new();

        assert!(cache
            .update(&model, &ground, PredictionMode::Elevation, now, &filters, &cfg)
            .is_err());
        assert!(cache.passes().is_empty());
    }
}
