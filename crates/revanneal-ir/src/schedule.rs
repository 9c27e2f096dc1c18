//! Piecewise-linear anneal schedules.
//!
//! A schedule is an ordered list of `(t, s)` breakpoints, `t` in
//! microseconds and `s` the normalized anneal fraction. The sampler
//! interpolates linearly between breakpoints.
//!
//! ```text
//!  s
//!  1 ●╲                    ╱●      reverse anneal
//!       ╲                ╱
//!        ╲   hold      ╱
//!  s_t    ●──────────●
//!     0  t_ramp    t_ramp+hold   t_end
//! ```
//!
//! A forward anneal starts at `s = 0`, a reverse anneal at `s = 1`; both end
//! at `s = 1`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};

/// Steepest ramp-back slope accepted by [`AnnealSchedule::reverse`], in 1/µs.
pub const MAX_RAMP_BACK_SLOPE: f64 = 0.2;

/// Default quench time back to `s = 1` after the hold, in µs.
pub const DEFAULT_RAMP_UP_TIME: f64 = 0.0201;

/// A single `(t, s)` breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct SchedulePoint {
    /// Time in microseconds.
    pub time_us: f64,
    /// Normalized anneal fraction in `[0, 1]`.
    pub s: f64,
}

impl SchedulePoint {
    /// Create a breakpoint.
    pub fn new(time_us: f64, s: f64) -> Self {
        Self { time_us, s }
    }
}

impl From<(f64, f64)> for SchedulePoint {
    fn from((time_us, s): (f64, f64)) -> Self {
        Self { time_us, s }
    }
}

impl From<SchedulePoint> for (f64, f64) {
    fn from(p: SchedulePoint) -> Self {
        (p.time_us, p.s)
    }
}

/// Direction of an anneal, decided by the first breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    /// Starts in the transverse-field ground state, `s = 0`.
    Forward,
    /// Starts from a classical state, `s = 1`.
    Reverse,
}

/// Solver constraints a schedule is checked against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleLimits {
    /// Maximum number of breakpoints.
    pub max_points: usize,
    /// Minimum anneal time in µs; bounds the slope at `1 / min`.
    pub min_anneal_time_us: f64,
    /// Maximum total duration in µs.
    pub max_anneal_time_us: f64,
}

impl Default for ScheduleLimits {
    fn default() -> Self {
        Self {
            max_points: 12,
            min_anneal_time_us: 0.02,
            max_anneal_time_us: 2000.0,
        }
    }
}

impl ScheduleLimits {
    /// Steepest allowed `|ds/dt|`.
    pub fn max_slope(&self) -> f64 {
        1.0 / self.min_anneal_time_us
    }
}

/// Geometry of a reverse anneal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverseScheduleSpec {
    /// Anneal fraction to ramp back to.
    pub s_target: f64,
    /// Time spent at `s_target`, µs.
    pub hold_time: f64,
    /// Slope of the ramp from `s = 1` down to `s_target`, 1/µs.
    pub ramp_back_slope: f64,
    /// Duration of the final ramp to `s = 1`, µs. Ignored when
    /// `ramp_up_slope` is set.
    pub ramp_up_time: f64,
    /// Slope of the final ramp, 1/µs.
    #[serde(default)]
    pub ramp_up_slope: Option<f64>,
}

impl Default for ReverseScheduleSpec {
    fn default() -> Self {
        Self {
            s_target: 0.0,
            hold_time: 10.0,
            ramp_back_slope: MAX_RAMP_BACK_SLOPE,
            ramp_up_time: DEFAULT_RAMP_UP_TIME,
            ramp_up_slope: None,
        }
    }
}

impl ReverseScheduleSpec {
    /// Spec with the given target and default ramps.
    pub fn new(s_target: f64) -> Self {
        Self {
            s_target,
            ..Self::default()
        }
    }

    /// Set the hold time.
    pub fn with_hold_time(mut self, hold_time: f64) -> Self {
        self.hold_time = hold_time;
        self
    }

    /// Set the ramp-back slope.
    pub fn with_ramp_back_slope(mut self, slope: f64) -> Self {
        self.ramp_back_slope = slope;
        self
    }

    /// Set the ramp-up duration.
    pub fn with_ramp_up_time(mut self, time: f64) -> Self {
        self.ramp_up_time = time;
        self.ramp_up_slope = None;
        self
    }

    /// Set the ramp-up slope instead of a duration.
    pub fn with_ramp_up_slope(mut self, slope: f64) -> Self {
        self.ramp_up_slope = Some(slope);
        self
    }
}

fn round4(x: f64) -> f64 {
    (x * 1e4).round() / 1e4
}

fn round10(x: f64) -> f64 {
    (x * 1e10).round() / 1e10
}

/// Ordered `(t, s)` breakpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnealSchedule(Vec<SchedulePoint>);

impl AnnealSchedule {
    /// Wrap breakpoints without validation.
    pub fn from_points(points: impl IntoIterator<Item = impl Into<SchedulePoint>>) -> Self {
        Self(points.into_iter().map(Into::into).collect())
    }

    /// Standard forward anneal of `anneal_time` µs.
    pub fn forward(anneal_time: f64) -> IrResult<Self> {
        if !(anneal_time > 0.0 && anneal_time.is_finite()) {
            return Err(IrError::InvalidSchedule(format!(
                "anneal time must be positive, got {anneal_time}"
            )));
        }
        Ok(Self::from_points([(0.0, 0.0), (anneal_time, 1.0)]))
    }

    /// Forward anneal with a pause at `pause_s` lasting `pause_duration` µs.
    ///
    /// The ramp up to the pause and after it keeps the slope `1 / anneal_time`.
    pub fn forward_with_pause(anneal_time: f64, pause_s: f64, pause_duration: f64) -> IrResult<Self> {
        if !(anneal_time > 0.0 && anneal_time.is_finite()) {
            return Err(IrError::InvalidSchedule(format!(
                "anneal time must be positive, got {anneal_time}"
            )));
        }
        if !(pause_s > 0.0 && pause_s < 1.0) {
            return Err(IrError::InvalidSchedule(format!(
                "pause point must lie strictly between 0 and 1, got {pause_s}"
            )));
        }
        if !(pause_duration > 0.0 && pause_duration.is_finite()) {
            return Err(IrError::InvalidSchedule(format!(
                "pause duration must be positive, got {pause_duration}"
            )));
        }

        let t_pause = round4(pause_s * anneal_time);
        Ok(Self::from_points([
            (0.0, 0.0),
            (t_pause, pause_s),
            (round4(t_pause + pause_duration), pause_s),
            (round4(anneal_time + pause_duration), 1.0),
        ]))
    }

    /// Four-point reverse anneal: ramp from `s = 1` down to `s_target`,
    /// hold, then ramp back up to `s = 1`.
    ///
    /// `s_target` must be below 1: a target of 1 would collapse the ramp to
    /// zero length and produce non-increasing times.
    pub fn reverse(spec: &ReverseScheduleSpec) -> IrResult<Self> {
        let ReverseScheduleSpec {
            s_target,
            hold_time,
            ramp_back_slope,
            ramp_up_time,
            ramp_up_slope,
        } = *spec;

        if !(0.0..1.0).contains(&s_target) {
            return Err(IrError::InvalidSchedule(format!(
                "s_target must be in [0, 1), got {s_target}"
            )));
        }
        if !(hold_time >= 0.0 && hold_time.is_finite()) {
            return Err(IrError::InvalidSchedule(format!(
                "hold time must be non-negative, got {hold_time}"
            )));
        }
        if !(ramp_back_slope > 0.0 && ramp_back_slope <= MAX_RAMP_BACK_SLOPE) {
            return Err(IrError::InvalidSchedule(format!(
                "ramp-back slope must be in (0, {MAX_RAMP_BACK_SLOPE}], got {ramp_back_slope}"
            )));
        }

        let ramp_up = match ramp_up_slope {
            Some(slope) if slope > 0.0 && slope.is_finite() => (1.0 - s_target) / slope,
            Some(slope) => {
                return Err(IrError::InvalidSchedule(format!(
                    "ramp-up slope must be positive, got {slope}"
                )));
            }
            None if ramp_up_time > 0.0 && ramp_up_time.is_finite() => ramp_up_time,
            None => {
                return Err(IrError::InvalidSchedule(format!(
                    "ramp-up time must be positive, got {ramp_up_time}"
                )));
            }
        };

        let ramp_time = (1.0 - s_target) / ramp_back_slope;
        let mut points = vec![
            SchedulePoint::new(0.0, 1.0),
            SchedulePoint::new(round4(ramp_time), s_target),
        ];
        // A hold shorter than the rounding step would repeat a timestamp.
        if round4(ramp_time + hold_time) > round4(ramp_time) {
            points.push(SchedulePoint::new(round4(ramp_time + hold_time), s_target));
        }
        points.push(SchedulePoint::new(
            round4(ramp_time + hold_time + ramp_up),
            1.0,
        ));
        Ok(Self(points))
    }

    /// Breakpoints in order.
    pub fn points(&self) -> &[SchedulePoint] {
        &self.0
    }

    /// Number of breakpoints.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no breakpoints.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Forward or reverse, from the first breakpoint; `None` if the first
    /// `s` is neither 0 nor 1.
    pub fn kind(&self) -> Option<ScheduleKind> {
        match self.0.first() {
            Some(p) if p.s == 0.0 => Some(ScheduleKind::Forward),
            Some(p) if p.s == 1.0 => Some(ScheduleKind::Reverse),
            _ => None,
        }
    }

    /// True for a schedule starting at `s = 1`.
    pub fn is_reverse(&self) -> bool {
        self.kind() == Some(ScheduleKind::Reverse)
    }

    /// Total duration in µs.
    pub fn duration(&self) -> f64 {
        self.0.last().map_or(0.0, |p| p.time_us)
    }

    /// Lowest `s` reached.
    pub fn min_s(&self) -> Option<f64> {
        self.0.iter().map(|p| p.s).reduce(f64::min)
    }

    /// Anneal fraction at time `t`, clamped to the first and last breakpoints.
    pub fn s_at(&self, t: f64) -> Option<f64> {
        let first = self.0.first()?;
        if t <= first.time_us {
            return Some(first.s);
        }
        for pair in self.0.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time_us {
                let span = b.time_us - a.time_us;
                if span <= 0.0 {
                    return Some(b.s);
                }
                return Some(a.s + (b.s - a.s) * (t - a.time_us) / span);
            }
        }
        self.0.last().map(|p| p.s)
    }

    /// Wire form, `[[t, s], ...]`.
    pub fn to_pairs(&self) -> Vec<[f64; 2]> {
        self.0.iter().map(|p| [p.time_us, p.s]).collect()
    }

    /// Check the schedule against structural rules and solver limits.
    pub fn validate(&self, limits: &ScheduleLimits) -> IrResult<()> {
        let invalid = |msg: String| Err(IrError::InvalidSchedule(msg));

        if self.0.len() < 2 {
            return invalid(format!(
                "schedule needs at least 2 points, got {}",
                self.0.len()
            ));
        }
        if self.0.len() > limits.max_points {
            return invalid(format!(
                "schedule has {} points, solver allows at most {}",
                self.0.len(),
                limits.max_points
            ));
        }

        for (i, p) in self.0.iter().enumerate() {
            if !p.time_us.is_finite() || !p.s.is_finite() {
                return invalid(format!("point {i} is not finite"));
            }
            if !(0.0..=1.0).contains(&p.s) {
                return invalid(format!("anneal fraction at point {i} is {}, outside [0, 1]", p.s));
            }
        }

        if self.0[0].time_us != 0.0 {
            return invalid(format!(
                "first point must be at t = 0, got {}",
                self.0[0].time_us
            ));
        }
        if self.kind().is_none() {
            return invalid(format!(
                "first point must have s = 0 (forward) or s = 1 (reverse), got {}",
                self.0[0].s
            ));
        }
        if self.0[self.0.len() - 1].s != 1.0 {
            return invalid("last point must have s = 1".into());
        }

        let max_slope = limits.max_slope();
        for (i, pair) in self.0.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            if b.time_us <= a.time_us {
                return invalid(format!(
                    "time must increase between points {i} and {}",
                    i + 1
                ));
            }
            let slope = round10(((b.s - a.s) / (b.time_us - a.time_us)).abs());
            if slope > max_slope {
                return invalid(format!(
                    "slope {slope} between points {i} and {} exceeds maximum {max_slope}",
                    i + 1
                ));
            }
        }

        if self.duration() > limits.max_anneal_time_us {
            return invalid(format!(
                "schedule lasts {} µs, solver allows at most {} µs",
                self.duration(),
                limits.max_anneal_time_us
            ));
        }

        Ok(())
    }
}

impl fmt::Display for AnnealSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|p| format!("({}, {})", p.time_us, p.s))
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reverse_default_geometry() {
        let schedule = AnnealSchedule::reverse(&ReverseScheduleSpec::new(0.45)).unwrap();
        // ramp = 0.55 / 0.2 = 2.75
        assert_eq!(
            schedule.to_pairs(),
            vec![[0.0, 1.0], [2.75, 0.45], [12.75, 0.45], [12.7701, 1.0]]
        );
        assert!(schedule.is_reverse());
        assert!(schedule.validate(&ScheduleLimits::default()).is_ok());
    }

    #[test]
    fn test_reverse_with_ramp_up_slope() {
        let spec = ReverseScheduleSpec::new(0.5)
            .with_hold_time(5.0)
            .with_ramp_up_slope(0.25);
        let schedule = AnnealSchedule::reverse(&spec).unwrap();
        assert_eq!(
            schedule.to_pairs(),
            vec![[0.0, 1.0], [2.5, 0.5], [7.5, 0.5], [9.5, 1.0]]
        );
    }

    #[test]
    fn test_reverse_without_hold_has_three_points() {
        let spec = ReverseScheduleSpec::new(0.6).with_hold_time(0.0);
        let schedule = AnnealSchedule::reverse(&spec).unwrap();
        assert_eq!(schedule.len(), 3);
        assert!(schedule.validate(&ScheduleLimits::default()).is_ok());
    }

    #[test]
    fn test_reverse_rejects_bad_input() {
        assert!(AnnealSchedule::reverse(&ReverseScheduleSpec::new(1.0)).is_err());
        assert!(AnnealSchedule::reverse(&ReverseScheduleSpec::new(-0.1)).is_err());
        assert!(
            AnnealSchedule::reverse(&ReverseScheduleSpec::new(0.5).with_ramp_back_slope(0.3))
                .is_err()
        );
        assert!(
            AnnealSchedule::reverse(&ReverseScheduleSpec::new(0.5).with_hold_time(-1.0)).is_err()
        );
    }

    #[test]
    fn test_forward_with_pause() {
        let schedule = AnnealSchedule::forward_with_pause(20.0, 0.4, 100.0).unwrap();
        assert_eq!(
            schedule.to_pairs(),
            vec![[0.0, 0.0], [8.0, 0.4], [108.0, 0.4], [120.0, 1.0]]
        );
        assert_eq!(schedule.kind(), Some(ScheduleKind::Forward));
        assert!(schedule.validate(&ScheduleLimits::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_monotonic_time() {
        let schedule = AnnealSchedule::from_points([(0.0, 1.0), (5.0, 0.5), (5.0, 0.5), (6.0, 1.0)]);
        let err = schedule.validate(&ScheduleLimits::default()).unwrap_err();
        assert!(err.to_string().contains("time must increase"));
    }

    #[test]
    fn test_validate_rejects_bad_endpoints() {
        let limits = ScheduleLimits::default();
        let mid_start = AnnealSchedule::from_points([(0.0, 0.5), (10.0, 1.0)]);
        assert!(mid_start.validate(&limits).is_err());

        let ends_low = AnnealSchedule::from_points([(0.0, 0.0), (10.0, 0.9)]);
        assert!(ends_low.validate(&limits).is_err());

        let late_start = AnnealSchedule::from_points([(1.0, 0.0), (10.0, 1.0)]);
        assert!(late_start.validate(&limits).is_err());
    }

    #[test]
    fn test_validate_slope_and_duration() {
        let limits = ScheduleLimits {
            max_points: 4,
            min_anneal_time_us: 1.0,
            max_anneal_time_us: 100.0,
        };
        let steep = AnnealSchedule::from_points([(0.0, 0.0), (0.5, 1.0)]);
        assert!(steep.validate(&limits).unwrap_err().to_string().contains("slope"));

        let long = AnnealSchedule::forward(150.0).unwrap();
        assert!(long.validate(&limits).unwrap_err().to_string().contains("lasts"));

        let too_many = AnnealSchedule::from_points([
            (0.0, 0.0),
            (1.0, 0.2),
            (2.0, 0.4),
            (3.0, 0.6),
            (4.0, 1.0),
        ]);
        assert!(too_many.validate(&limits).is_err());
    }

    #[test]
    fn test_s_at_interpolates() {
        let schedule = AnnealSchedule::reverse(&ReverseScheduleSpec::new(0.5)).unwrap();
        assert_eq!(schedule.s_at(-1.0), Some(1.0));
        assert!((schedule.s_at(1.25).unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(schedule.s_at(8.0), Some(0.5));
        assert_eq!(schedule.s_at(1e6), Some(1.0));
        assert_eq!(schedule.min_s(), Some(0.5));
    }

    #[test]
    fn test_serde_as_pairs() {
        let schedule = AnnealSchedule::forward(20.0).unwrap();
        let json = serde_json::to_string(&schedule).unwrap();
        assert_eq!(json, "[[0.0,0.0],[20.0,1.0]]");
        let parsed: AnnealSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schedule);
    }

    proptest! {
        #[test]
        fn prop_reverse_schedules_are_valid(
            s_target in 0.0f64..0.99,
            hold in 0.0f64..500.0,
            slope in 0.01f64..0.2,
        ) {
            let spec = ReverseScheduleSpec::new(s_target)
                .with_hold_time(hold)
                .with_ramp_back_slope(slope);
            let schedule = AnnealSchedule::reverse(&spec).unwrap();
            let limits = ScheduleLimits { max_points: 4, ..ScheduleLimits::default() };
            prop_assert!(schedule.validate(&limits).is_ok(), "{}", schedule);
            prop_assert!(schedule.is_reverse());
            prop_assert!((schedule.min_s().unwrap() - s_target).abs() < 1e-12);
        }
    }
}
