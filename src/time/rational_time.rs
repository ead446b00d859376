// src/time/rational_time.rs
//
// A RationalTime is a sample index at a sampling rate: `value / rate` gives
// the time in seconds. Arithmetic between two RationalTimes at different
// rates rescales the lower-rate operand up to the higher rate first, then
// operates on the (now integer-comparable) values — this keeps frame math
// exact for the common case of compatible rates (e.g. 24 and 48).

use serde::{Deserialize, Serialize};

use super::timecode::VALID_TIMECODE_RATES;

/// Sentinel rate used to mark an intentionally invalid `RationalTime`.
pub const INVALID_RATE: f64 = -1.0;

/// A time value expressed as a sample count at a given sampling rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RationalTime {
    pub value: f64,
    pub rate: f64,
}

impl RationalTime {
    /// Construct a new `RationalTime`.
    pub fn new(value: f64, rate: f64) -> Self {
        Self { value, rate }
    }

    /// A zero-duration time at rate 1 — a convenient, always-valid default.
    pub fn zero() -> Self {
        Self { value: 0.0, rate: 1.0 }
    }

    /// An explicitly invalid time: NaN value, sentinel rate.
    pub fn invalid_time() -> Self {
        Self { value: f64::NAN, rate: INVALID_RATE }
    }

    /// A time is valid iff its rate is positive and neither field is NaN.
    pub fn is_valid_time(&self) -> bool {
        self.rate > 0.0 && !self.rate.is_nan() && !self.value.is_nan()
    }

    /// `value / rate`, the time expressed in seconds.
    pub fn to_seconds(&self) -> f64 {
        self.value / self.rate
    }

    /// Truncate `n` to an integer frame count at `rate`.
    pub fn from_frames(n: f64, rate: f64) -> Self {
        Self { value: n.trunc(), rate }
    }

    /// `RationalTime(seconds, 1).rescaled_to(rate)`.
    pub fn from_seconds(seconds: f64, rate: f64) -> Self {
        Self { value: seconds, rate: 1.0 }.rescaled_to(rate)
    }

    /// Same instant, expressed at a different rate.
    pub fn rescaled_to(&self, new_rate: f64) -> Self {
        if !self.is_valid_time() || new_rate <= 0.0 || new_rate.is_nan() {
            return Self::invalid_time();
        }
        if (new_rate - self.rate).abs() == 0.0 {
            return *self;
        }
        Self { value: self.value * (new_rate / self.rate), rate: new_rate }
    }

    /// Rescale `self` to `other.rate`.
    pub fn rescaled_to_rational_time(&self, other: &RationalTime) -> Self {
        self.rescaled_to(other.rate)
    }

    /// Nearest integer frame count at the time's own rate.
    pub fn to_frames(&self) -> i64 {
        self.value.round() as i64
    }

    /// Nearest integer frame count after rescaling to `rate`.
    pub fn to_frames_at_rate(&self, rate: f64) -> i64 {
        self.rescaled_to(rate).to_frames()
    }

    pub fn is_valid_timecode_rate(rate: f64) -> bool {
        VALID_TIMECODE_RATES.iter().any(|r| (*r - rate).abs() < 1e-9)
    }

    /// The closed-set SMPTE rate nearest to `rate`, ties broken by the
    /// declared order `{23.976, 24, 25, 29.97, 30, 47.95, 48, 50, 59.94, 60}`.
    pub fn nearest_valid_timecode_rate(rate: f64) -> f64 {
        super::timecode::nearest_valid_timecode_rate(rate)
    }

    /// Add two times, rescaling the lower-rate operand up first. Returns
    /// an invalid time if either operand is invalid.
    fn binop(a: RationalTime, b: RationalTime, f: impl Fn(f64, f64) -> f64) -> RationalTime {
        if !a.is_valid_time() || !b.is_valid_time() {
            return RationalTime::invalid_time();
        }
        if a.rate == b.rate {
            return RationalTime { value: f(a.value, b.value), rate: a.rate };
        }
        let (hi, lo) = if a.rate >= b.rate { (a, b) } else { (b, a) };
        let lo_rescaled = lo.rescaled_to(hi.rate);
        // Preserve operand order for non-commutative `f` (subtraction).
        if a.rate >= b.rate {
            RationalTime { value: f(hi.value, lo_rescaled.value), rate: hi.rate }
        } else {
            RationalTime { value: f(lo_rescaled.value, hi.value), rate: hi.rate }
        }
    }

    pub fn compare_in_seconds(&self, other: &RationalTime) -> std::cmp::Ordering {
        self.to_seconds().partial_cmp(&other.to_seconds()).unwrap_or(std::cmp::Ordering::Equal)
    }

    pub fn almost_equal(&self, other: &RationalTime, epsilon: f64) -> bool {
        (self.to_seconds() - other.to_seconds()).abs() <= epsilon
    }
}

impl Default for RationalTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::ops::Add for RationalTime {
    type Output = RationalTime;
    fn add(self, rhs: RationalTime) -> RationalTime {
        RationalTime::binop(self, rhs, |a, b| a + b)
    }
}

impl std::ops::Sub for RationalTime {
    type Output = RationalTime;
    fn sub(self, rhs: RationalTime) -> RationalTime {
        RationalTime::binop(self, rhs, |a, b| a - b)
    }
}

impl std::ops::Neg for RationalTime {
    type Output = RationalTime;
    fn neg(self) -> RationalTime {
        RationalTime { value: -self.value, rate: self.rate }
    }
}

/// Equality is value-after-rescale equality, not field-wise: `(1, 24)` and
/// `(2, 48)` are the same instant and compare equal.
impl PartialEq for RationalTime {
    fn eq(&self, other: &Self) -> bool {
        if !self.is_valid_time() || !other.is_valid_time() {
            return self.is_valid_time() == other.is_valid_time();
        }
        let rescaled = other.rescaled_to(self.rate);
        self.value == rescaled.value
    }
}

impl PartialOrd for RationalTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.compare_in_seconds(other))
    }
}

impl std::fmt::Display for RationalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RationalTime({}, {})", self.value, self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addition_is_commutative_and_invertible() {
        let a = RationalTime::new(10.0, 24.0);
        let b = RationalTime::new(5.0, 48.0);
        assert_eq!(a + b, b + a);
        assert_eq!((a + b) - b, a);
    }

    #[test]
    fn rescale_preserves_seconds() {
        let a = RationalTime::new(48.0, 48.0);
        let r = a.rescaled_to(24.0);
        assert_eq!(r.value, 24.0);
        assert!((r.to_seconds() - a.to_seconds()).abs() < 1e-12);
    }

    #[test]
    fn equality_crosses_rates() {
        assert_eq!(RationalTime::new(1.0, 24.0), RationalTime::new(2.0, 48.0));
        assert_ne!(RationalTime::new(1.0, 24.0), RationalTime::new(3.0, 48.0));
    }

    #[test]
    fn invalid_propagates() {
        let inv = RationalTime::invalid_time();
        let ok = RationalTime::new(1.0, 24.0);
        assert!(!(inv + ok).is_valid_time());
        assert!(!(ok + inv).is_valid_time());
    }

    #[test]
    fn from_frames_truncates() {
        let t = RationalTime::from_frames(23.9, 24.0);
        assert_eq!(t.value, 23.0);
    }

    #[test]
    fn from_seconds_round_trips_to_seconds() {
        let t = RationalTime::from_seconds(2.5, 48.0);
        assert_eq!(t.value, 120.0);
        assert!((t.to_seconds() - 2.5).abs() < 1e-12);
    }
}
