use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::frames;
use crate::orbit::{OrbitError, OrbitModel};

/// Number of samples blended by the interpolator.
const INTERPOLATION_POINTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Inertial,
    Fixed,
}

/// A propagated position in both frames. Immutable once produced.
#[derive(Debug, Clone, Copy)]
pub struct PositionSample {
    pub time: DateTime<Utc>,
    pub inertial: [f64; 3],
    pub fixed: [f64; 3],
}

#[derive(Debug, Clone, Copy)]
pub struct SampledPosition {
    pub position: [f64; 3],
    /// Set when the requested time fell outside the covered interval and the
    /// nearest edge sample was held instead of interpolating.
    pub degraded: bool,
}

/// Rolling table of propagated positions for one orbit model.
///
/// Coverage requests extend the table forward/backward by computing only the
/// missing samples; a retention margin around the most recent request bounds
/// memory. Samples are strictly time-ordered and deduplicated by keying on
/// the millisecond timestamp.
pub struct SampledPositionCache {
    model: Arc<OrbitModel>,
    spacing: Duration,
    samples: BTreeMap<i64, PositionSample>,
    covered: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl SampledPositionCache {
    pub fn new(model: Arc<OrbitModel>) -> Self {
        let spacing = model.sample_spacing();
        Self {
            model,
            spacing,
            samples: BTreeMap::new(),
            covered: None,
        }
    }

    pub fn covered_interval(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.covered
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Extend coverage so that `[center - period/2, center + 1.5 * period]`
    /// is fully sampled, computing only the missing prefix and/or suffix,
    /// then trim samples outside the retention margin around that window.
    pub fn ensure_coverage(&mut self, center: DateTime<Utc>) -> Result<(), OrbitError> {
        if self.model.has_error() {
            return Err(OrbitError::Propagation(
                "element set flagged invalid by an earlier failure".into(),
            ));
        }

        let period = self.model.orbital_period();
        let target_lo = center - period / 2;
        let target_hi = center + period * 3 / 2;

        match self.covered {
            Some((lo, hi)) if target_lo <= hi && target_hi >= lo => {
                if target_lo < lo {
                    self.fill_backward(lo, target_lo)?;
                }
                if target_hi > hi {
                    self.fill_forward(hi, target_hi)?;
                }
                self.covered = Some((lo.min(target_lo), hi.max(target_hi)));
            }
            _ => {
                // first fill, or the request jumped clear of the old window
                self.samples.clear();
                self.fill_forward(target_lo - self.spacing, target_hi)?;
                self.covered = Some((target_lo, target_hi));
            }
        }

        self.trim(target_lo - period / 2, target_hi + period / 2);
        Ok(())
    }

    /// Interpolated position at `time` in the requested frame, or the held
    /// edge value (flagged `degraded`) outside the covered interval. `None`
    /// only while the cache has never been filled.
    pub fn position_at(&self, time: DateTime<Utc>, frame: Frame) -> Option<SampledPosition> {
        let (lo, hi) = self.covered?;
        if self.samples.is_empty() {
            return None;
        }

        if time < lo {
            let first = self.samples.values().next()?;
            return Some(SampledPosition {
                position: select(first, frame),
                degraded: true,
            });
        }
        if time > hi {
            let last = self.samples.values().next_back()?;
            return Some(SampledPosition {
                position: select(last, frame),
                degraded: true,
            });
        }

        let nodes = self.nearest_samples(time);
        if nodes.len() < 2 {
            let sample = nodes.first()?;
            return Some(SampledPosition {
                position: select(sample, frame),
                degraded: sample.time != time,
            });
        }

        let t0 = nodes[0].time;
        let ts: Vec<f64> = nodes
            .iter()
            .map(|s| (s.time - t0).num_milliseconds() as f64 / 1000.0)
            .collect();
        let t = (time - t0).num_milliseconds() as f64 / 1000.0;

        let mut position = [0.0; 3];
        for axis in 0..3 {
            let ys: Vec<f64> = nodes.iter().map(|s| select(s, frame)[axis]).collect();
            position[axis] = lagrange(&ts, &ys, t);
        }

        Some(SampledPosition {
            position,
            degraded: false,
        })
    }

    fn sample_at(&self, time: DateTime<Utc>) -> Result<PositionSample, OrbitError> {
        let state = self.model.propagate(time)?;
        let fixed = frames::inertial_to_fixed(state.position, time)?;
        Ok(PositionSample {
            time,
            inertial: state.position,
            fixed,
        })
    }

    /// Sample on the spacing grid from just after `from` until `until` is
    /// covered, inclusive.
    fn fill_forward(&mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Result<(), OrbitError> {
        let mut t = from;
        while t < until {
            t += self.spacing;
            let sample = self.sample_at(t)?;
            self.samples.insert(t.timestamp_millis(), sample);
        }
        Ok(())
    }

    fn fill_backward(&mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Result<(), OrbitError> {
        let mut t = from;
        while t > until {
            t -= self.spacing;
            let sample = self.sample_at(t)?;
            self.samples.insert(t.timestamp_millis(), sample);
        }
        Ok(())
    }

    fn trim(&mut self, retain_lo: DateTime<Utc>, retain_hi: DateTime<Utc>) {
        let lo_key = retain_lo.timestamp_millis();
        let hi_key = retain_hi.timestamp_millis();
        self.samples.retain(|k, _| *k >= lo_key && *k <= hi_key);

        if let Some((lo, hi)) = self.covered {
            self.covered = Some((lo.max(retain_lo), hi.min(retain_hi)));
        }
    }

    /// Up to `INTERPOLATION_POINTS` samples forming a contiguous run around
    /// `time`.
    fn nearest_samples(&self, time: DateTime<Utc>) -> Vec<PositionSample> {
        let key = time.timestamp_millis();
        let half = INTERPOLATION_POINTS;

        let mut nodes: Vec<PositionSample> = self
            .samples
            .range(..=key)
            .rev()
            .take(half)
            .map(|(_, s)| *s)
            .collect();
        nodes.reverse();
        nodes.extend(self.samples.range(key + 1..).take(half).map(|(_, s)| *s));

        while nodes.len() > INTERPOLATION_POINTS {
            let front_gap = time - nodes.first().unwrap().time;
            let back_gap = nodes.last().unwrap().time - time;
            if front_gap > back_gap {
                nodes.remove(0);
            } else {
                nodes.pop();
            }
        }
        nodes
    }
}

fn select(sample: &PositionSample, frame: Frame) -> [f64; 3] {
    match frame {
        Frame::Inertial => sample.inertial,
        Frame::Fixed => sample.fixed,
    }
}

fn lagrange(ts: &[f64], ys: &[f64], t: f64) -> f64 {
    let mut acc = 0.0;
    for i in 0..ts.len() {
        let mut weight = 1.0;
        for j in 0..ts.len() {
            if j != i {
                weight *= (t - ts[j]) / (ts[i] - ts[j]);
            }
        }
        acc += weight * ys[i];
    }
    acc
}
