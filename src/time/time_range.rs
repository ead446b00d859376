// src/time/time_range.rs
//
// A half-open span `[start_time, end_time_exclusive)`. `duration`'s rate is
// authoritative whenever `start_time` is at a different rate — every
// endpoint computation rescales `start_time` up to `duration.rate` before
// combining, so a range's duration is never silently reinterpreted at the
// wrong rate.
//
// The Allen-interval predicates below all compare in seconds and accept an
// epsilon (defaulting to `time::DEFAULT_EPSILON_S`) so that "meets" and
// "before" can be told apart at sub-sample boundaries introduced by
// floating point rescaling.

use serde::{Deserialize, Serialize};

use crate::time::{RationalTime, DEFAULT_EPSILON_S};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_time: RationalTime,
    pub duration: RationalTime,
}

impl TimeRange {
    pub fn new(start_time: RationalTime, duration: RationalTime) -> Self {
        Self { start_time, duration }
    }

    /// A zero-duration range starting at `t`.
    pub fn from_start_end_time(start_time: RationalTime, end_time_exclusive: RationalTime) -> Self {
        let start_rescaled = start_time.rescaled_to(end_time_exclusive.rate);
        Self { start_time, duration: end_time_exclusive - start_rescaled }
    }

    pub fn from_point(t: RationalTime) -> Self {
        Self { start_time: t, duration: RationalTime::new(0.0, t.rate) }
    }

    pub fn from_components(start: f64, duration: f64, rate: f64) -> Self {
        Self { start_time: RationalTime::new(start, rate), duration: RationalTime::new(duration, rate) }
    }

    pub fn is_valid_range(&self) -> bool {
        self.start_time.is_valid_time()
            && self.duration.is_valid_time()
            && self.duration.value >= 0.0
    }

    pub fn end_time_exclusive(&self) -> RationalTime {
        self.start_time.rescaled_to(self.duration.rate) + self.duration
    }

    /// The last sample inside the range. For an integral duration this is
    /// one sample before the exclusive end; for a fractional duration it's
    /// the exclusive end floored to an integer sample.
    pub fn end_time_inclusive(&self) -> RationalTime {
        let end_exclusive = self.end_time_exclusive();
        if self.duration.value.fract() == 0.0 {
            end_exclusive - RationalTime::new(1.0, self.duration.rate)
        } else {
            RationalTime::new(end_exclusive.value.floor(), end_exclusive.rate)
        }
    }

    fn start_s(&self) -> f64 {
        self.start_time.rescaled_to(self.duration.rate).to_seconds()
    }

    fn end_s(&self) -> f64 {
        self.end_time_exclusive().to_seconds()
    }

    pub fn contains_time(&self, t: RationalTime) -> bool {
        let t_s = t.to_seconds();
        self.start_s() <= t_s && t_s < self.end_s()
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.contains_with_epsilon(other, DEFAULT_EPSILON_S)
    }

    pub fn contains_with_epsilon(&self, other: &TimeRange, epsilon: f64) -> bool {
        (other.start_s() - self.start_s()) > epsilon && (self.end_s() - other.end_s()) > epsilon
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.overlaps_with_epsilon(other, DEFAULT_EPSILON_S)
    }

    pub fn overlaps_with_epsilon(&self, other: &TimeRange, epsilon: f64) -> bool {
        (other.start_s() - self.start_s()) > epsilon
            && self.end_s() > other.start_s()
            && (other.end_s() - self.end_s()) > epsilon
    }

    pub fn before(&self, other: &TimeRange) -> bool {
        self.before_with_epsilon(other, DEFAULT_EPSILON_S)
    }

    pub fn before_with_epsilon(&self, other: &TimeRange, epsilon: f64) -> bool {
        (other.start_s() - self.end_s()) >= epsilon
    }

    pub fn meets(&self, other: &TimeRange) -> bool {
        self.meets_with_epsilon(other, DEFAULT_EPSILON_S)
    }

    pub fn meets_with_epsilon(&self, other: &TimeRange, epsilon: f64) -> bool {
        let delta = other.start_s() - self.end_s();
        (0.0..=epsilon).contains(&delta)
    }

    pub fn begins(&self, other: &TimeRange) -> bool {
        self.begins_with_epsilon(other, DEFAULT_EPSILON_S)
    }

    pub fn begins_with_epsilon(&self, other: &TimeRange, epsilon: f64) -> bool {
        (other.start_s() - self.start_s()).abs() <= epsilon && self.end_s() < other.end_s()
    }

    pub fn finishes(&self, other: &TimeRange) -> bool {
        self.finishes_with_epsilon(other, DEFAULT_EPSILON_S)
    }

    pub fn finishes_with_epsilon(&self, other: &TimeRange, epsilon: f64) -> bool {
        (self.end_s() - other.end_s()).abs() <= epsilon && self.start_s() > other.start_s()
    }

    pub fn intersects(&self, other: &TimeRange) -> bool {
        self.start_s() < other.end_s() && self.end_s() > other.start_s()
    }

    /// The minimum range covering both `self` and `other`.
    pub fn extended_by(&self, other: &TimeRange) -> TimeRange {
        let rate = self.duration.rate;
        let new_start = self.start_time.rescaled_to(rate).value.min(other.start_time.rescaled_to(rate).value);
        let new_end = self.end_time_exclusive().rescaled_to(rate).value.max(other.end_time_exclusive().rescaled_to(rate).value);
        TimeRange {
            start_time: RationalTime::new(new_start, rate),
            duration: RationalTime::new(new_end - new_start, rate),
        }
    }

    /// Clamp a time to `[start_time, end_time_inclusive]`.
    pub fn clamped_time(&self, t: RationalTime) -> RationalTime {
        let rate = self.duration.rate;
        let t_r = t.rescaled_to(rate);
        let lo = self.start_time.rescaled_to(rate);
        let hi = self.end_time_inclusive().rescaled_to(rate);
        if t_r.value < lo.value {
            lo
        } else if t_r.value > hi.value {
            hi
        } else {
            t_r
        }
    }

    /// Clip both endpoints of `other` to lie within `self`.
    pub fn clamped_range(&self, other: &TimeRange) -> TimeRange {
        let rate = self.duration.rate;
        let self_start = self.start_time.rescaled_to(rate).value;
        let self_end = self.end_time_exclusive().rescaled_to(rate).value;
        let other_start = other.start_time.rescaled_to(rate).value;
        let other_end = other.end_time_exclusive().rescaled_to(rate).value;
        let clamped_start = other_start.clamp(self_start, self_end);
        let clamped_end = other_end.clamp(self_start, self_end);
        TimeRange {
            start_time: RationalTime::new(clamped_start, rate),
            duration: RationalTime::new((clamped_end - clamped_start).max(0.0), rate),
        }
    }
}

impl PartialEq for TimeRange {
    fn eq(&self, other: &Self) -> bool {
        self.start_time == other.start_time && self.duration == other.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s2_end_times_integral_duration() {
        let r = TimeRange::new(RationalTime::new(0.0, 24.0), RationalTime::new(24.0, 24.0));
        assert_eq!(r.end_time_exclusive(), RationalTime::new(24.0, 24.0));
        assert_eq!(r.end_time_inclusive(), RationalTime::new(23.0, 24.0));
    }

    #[test]
    fn s2_end_time_inclusive_fractional_duration() {
        let r = TimeRange::new(RationalTime::new(0.0, 24.0), RationalTime::new(5.5, 24.0));
        assert_eq!(r.end_time_inclusive(), RationalTime::new(5.0, 24.0));
    }

    #[test]
    fn contains_time_half_open() {
        let r = TimeRange::from_components(0.0, 10.0, 24.0);
        assert!(r.contains_time(RationalTime::new(0.0, 24.0)));
        assert!(r.contains_time(RationalTime::new(9.0, 24.0)));
        assert!(!r.contains_time(RationalTime::new(10.0, 24.0)));
    }

    #[test]
    fn meets_and_before_are_distinguished() {
        let a = TimeRange::from_components(0.0, 10.0, 24.0);
        let b = TimeRange::from_components(10.0, 5.0, 24.0);
        assert!(a.meets(&b));
        assert!(!a.before(&b));

        let c = TimeRange::from_components(11.0, 5.0, 24.0);
        assert!(a.before(&c));
        assert!(!a.meets(&c));
    }

    #[test]
    fn extended_by_covers_both() {
        let a = TimeRange::from_components(0.0, 10.0, 24.0);
        let b = TimeRange::from_components(20.0, 5.0, 24.0);
        let u = a.extended_by(&b);
        assert_eq!(u.start_time, RationalTime::new(0.0, 24.0));
        assert_eq!(u.end_time_exclusive(), RationalTime::new(25.0, 24.0));
    }

    #[test]
    fn clamped_range_clips_endpoints() {
        let bounds = TimeRange::from_components(0.0, 10.0, 24.0);
        let other = TimeRange::from_components(-5.0, 20.0, 24.0);
        let clamped = bounds.clamped_range(&other);
        assert_eq!(clamped.start_time, RationalTime::new(0.0, 24.0));
        assert_eq!(clamped.duration, RationalTime::new(10.0, 24.0));
    }
}
