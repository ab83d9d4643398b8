use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::pass_finder::EPOCH_GRACE_MINUTES;
use super::types::Pass;

pub const DEFAULT_HORIZON_HOURS: i64 = 48;

/// The user-facing sunlight/eclipse visibility toggles. The cache snapshots
/// this on every recompute and compares strictly on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityFilters {
    /// Keep only passes where the ground point is dark at start or end.
    pub hide_sunlit: bool,
    /// Keep only passes where the object is sunlit at start or end, or
    /// crosses the shadow boundary during the pass.
    pub show_only_lit: bool,
}

/// Narrow and sort a pass list for display. Pure; the inputs are never
/// mutated.
///
/// Order of application: time horizon, epoch validity, ground darkness,
/// object illumination, then an ascending sort by start time.
pub fn filter_passes(
    passes: &[Pass],
    now: DateTime<Utc>,
    horizon_hours: i64,
    filters: &VisibilityFilters,
) -> Vec<Pass> {
    let horizon = Duration::hours(horizon_hours);
    let grace = Duration::minutes(EPOCH_GRACE_MINUTES);

    let mut out: Vec<Pass> = passes
        .iter()
        .filter(|pass| {
            if pass.start - now >= horizon {
                return false;
            }
            if pass.epoch_in_future {
                if let Some(epoch) = pass.epoch_time {
                    if pass.start < epoch - grace {
                        return false;
                    }
                }
            }
            if filters.hide_sunlit
                && !pass.illumination.ground_dark_at_start
                && !pass.illumination.ground_dark_at_end
            {
                return false;
            }
            if filters.show_only_lit {
                let lit = !pass.illumination.object_eclipsed_at_start
                    || !pass.illumination.object_eclipsed_at_end
                    || !pass.transitions.is_empty();
                if !lit {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect();

    out.sort_by_key(|pass| pass.start);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::types::{Illumination, IlluminationEvent, PassGeometry};
    use chrono::TimeZone;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2008, 9, 21, 0, 0, 0).unwrap()
    }

    fn pass(start_offset_min: i64, ground_dark: (bool, bool), eclipsed: (bool, bool)) -> Pass {
        let start = base_time() + Duration::minutes(start_offset_min);
        let end = start + Duration::minutes(8);
        Pass {
            satellite: "TEST".into(),
            norad_id: 1,
            ground_point: "site".into(),
            start,
            end,
            duration_seconds: 480,
            geometry: PassGeometry::Elevation {
                max_elevation_deg: 45.0,
                apex_azimuth_deg: 180.0,
            },
            illumination: Illumination {
                ground_dark_at_start: ground_dark.0,
                ground_dark_at_end: ground_dark.1,
                object_eclipsed_at_start: eclipsed.0,
                object_eclipsed_at_end: eclipsed.1,
            },
            transitions: Vec::new(),
            epoch_in_future: false,
            epoch_time: None,
        }
    }

    #[test]
    fn horizon_cuts_far_future_passes() {
        let now = base_time();
        let passes = vec![pass(0, (true, true), (false, false)), pass(49 * 60, (true, true), (false, false))];
        let kept = filter_passes(&passes, now, 48, &VisibilityFilters::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start, now);
    }

    #[test]
    fn pass_exactly_at_now_is_kept() {
        let now = base_time();
        let kept = filter_passes(
            &[pass(0, (false, false), (false, false))],
            now,
            48,
            &VisibilityFilters::default(),
        );
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn hide_sunlit_keeps_dark_and_mixed_passes() {
        let now = base_time();
        // 2 fully lit ground, 1 fully dark, 1 mixed
        let passes = vec![
            pass(10, (false, false), (false, false)),
            pass(20, (false, false), (false, false)),
            pass(30, (true, true), (false, false)),
            pass(40, (true, false), (false, false)),
        ];
        let filters = VisibilityFilters {
            hide_sunlit: true,
            show_only_lit: false,
        };
        let kept = filter_passes(&passes, now, 48, &filters);
        assert_eq!(kept.len(), 2);
        assert!(kept[0].start < kept[1].start);
        assert!(kept.iter().all(|p| {
            p.illumination.ground_dark_at_start || p.illumination.ground_dark_at_end
        }));
    }

    #[test]
    fn show_only_lit_requires_sunlight_or_a_transition() {
        let now = base_time();
        let mut with_transition = pass(30, (true, true), (true, true));
        with_transition.transitions.push(IlluminationEvent {
            time: with_transition.start + Duration::minutes(3),
            enters_shadow: false,
        });
        let passes = vec![
            pass(10, (true, true), (true, true)),  // eclipsed throughout
            pass(20, (true, true), (false, true)), // sunlit at start
            with_transition,
        ];
        let filters = VisibilityFilters {
            hide_sunlit: false,
            show_only_lit: true,
        };
        let kept = filter_passes(&passes, now, 48, &filters);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn epoch_future_cutoff_is_ninety_minutes() {
        let now = base_time();
        let epoch = now + Duration::minutes(10);

        let mut too_early = pass(0, (true, true), (false, false));
        too_early.start = epoch - Duration::hours(2);
        too_early.end = too_early.start + Duration::minutes(8);
        too_early.epoch_in_future = true;
        too_early.epoch_time = Some(epoch);

        let mut close_enough = pass(0, (true, true), (false, false));
        close_enough.start = epoch - Duration::minutes(80);
        close_enough.end = close_enough.start + Duration::minutes(8);
        close_enough.epoch_in_future = true;
        close_enough.epoch_time = Some(epoch);

        let kept = filter_passes(
            &[too_early.clone(), close_enough.clone()],
            now,
            48,
            &VisibilityFilters::default(),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start, close_enough.start);
    }

    #[test]
    fn result_is_sorted_regardless_of_input_order() {
        let now = base_time();
        let passes = vec![
            pass(300, (true, true), (false, false)),
            pass(100, (true, true), (false, false)),
            pass(200, (true, true), (false, false)),
        ];
        let kept = filter_passes(&passes, now, 48, &VisibilityFilters::default());
        let starts: Vec<_> = kept.iter().map(|p| p.start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
    }
}
