use chrono::{Duration, TimeZone, Utc};

use satpass::config::PredictConfig;
use satpass::ground::GroundPoint;
use satpass::orbit::OrbitModel;
use satpass::predict::{
    compute_passes, filter_passes, PassGeometry, PredictionMode, VisibilityFilters,
};

// Vallado's reference ISS element set: ~91.6 minute low orbit.
const ISS_LINE1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

fn iss() -> OrbitModel {
    OrbitModel::from_tle(Some("ISS (ZARYA)".into()), ISS_LINE1, ISS_LINE2).unwrap()
}

fn madrid() -> GroundPoint {
    GroundPoint::new(40.4168, -3.7038, 667.0, Some("Madrid".into())).unwrap()
}

#[test]
fn four_day_elevation_scenario() {
    let model = iss();
    let ground = madrid();
    let start = Utc.with_ymd_and_hms(2008, 9, 21, 0, 0, 0).unwrap();
    let end = start + Duration::days(4);

    let passes = compute_passes(
        &model,
        &ground,
        PredictionMode::Elevation,
        start,
        end,
        &PredictConfig::default(),
    )
    .unwrap();

    // a ~92 minute LEO object over a mid-latitude city: several passes a day
    assert!(
        passes.len() >= 12 && passes.len() <= 40,
        "{} passes over 4 days",
        passes.len()
    );

    for pass in &passes {
        assert!(pass.start < pass.end);
        assert!(pass.start >= start && pass.end <= end);
        assert_eq!(pass.ground_point, "Madrid");
        match pass.geometry {
            PassGeometry::Elevation {
                max_elevation_deg, ..
            } => assert!(
                (0.0..=90.0).contains(&max_elevation_deg),
                "max elevation {max_elevation_deg}"
            ),
            _ => panic!("unexpected swath geometry"),
        }
        assert!(!pass.epoch_in_future, "epoch precedes the sweep");
    }

    for pair in passes.windows(2) {
        assert!(pair[0].start < pair[1].start, "sorted by start");
        assert!(pair[0].end <= pair[1].start, "non-overlapping");
    }
}

#[test]
fn swath_and_elevation_counts_are_same_order() {
    let model = iss();
    let ground = madrid();
    let start = Utc.with_ymd_and_hms(2008, 9, 21, 0, 0, 0).unwrap();
    let end = start + Duration::days(4);
    let cfg = PredictConfig::default();

    let elevation = compute_passes(
        &model,
        &ground,
        PredictionMode::Elevation,
        start,
        end,
        &cfg,
    )
    .unwrap();
    let swath = compute_passes(&model, &ground, PredictionMode::Swath, start, end, &cfg).unwrap();

    assert!(!elevation.is_empty());
    assert!(!swath.is_empty());

    // sanity bound, not equality: one broken geometry model would push the
    // ratio far outside this band
    let ratio = elevation.len() as f64 / swath.len() as f64;
    assert!(
        (0.2..=5.0).contains(&ratio),
        "elevation {} vs swath {}",
        elevation.len(),
        swath.len()
    );
}

#[test]
fn filtered_view_is_sorted_and_horizon_bounded() {
    let model = iss();
    let ground = madrid();
    let now = Utc.with_ymd_and_hms(2008, 9, 21, 0, 0, 0).unwrap();
    let end = now + Duration::days(4);
    let cfg = PredictConfig::default();

    let passes = compute_passes(
        &model,
        &ground,
        PredictionMode::Elevation,
        now,
        end,
        &cfg,
    )
    .unwrap();

    let horizon_hours = 48;
    let visible = filter_passes(&passes, now, horizon_hours, &VisibilityFilters::default());

    assert!(!visible.is_empty());
    assert!(visible.len() < passes.len(), "48 h horizon trims a 4 day sweep");
    for pass in &visible {
        assert!(pass.start - now < Duration::hours(horizon_hours));
    }
    for pair in visible.windows(2) {
        assert!(pair[0].start <= pair[1].start);
    }

    // the sunlight filters only ever narrow the list
    let dark_only = filter_passes(
        &passes,
        now,
        horizon_hours,
        &VisibilityFilters {
            hide_sunlit: true,
            show_only_lit: false,
        },
    );
    assert!(dark_only.len() <= visible.len());
    for pass in &dark_only {
        assert!(pass.illumination.ground_dark_at_start || pass.illumination.ground_dark_at_end);
    }
}

#[test]
fn degraded_elements_poison_dependents_but_nothing_else() {
    let healthy = iss();
    let ground = madrid();
    let now = Utc.with_ymd_and_hms(2008, 9, 21, 0, 0, 0).unwrap();

    // a fresh model over the same window still predicts normally
    let passes = compute_passes(
        &healthy,
        &ground,
        PredictionMode::Elevation,
        now,
        now + Duration::hours(12),
        &PredictConfig::default(),
    )
    .unwrap();
    assert!(!passes.is_empty());
    assert!(!healthy.has_error());
}
