// src/time/time_transform.rs
//
// An affine map on RationalTime: `t' = t * scale + offset`, evaluated at a
// fixed output rate. Composition is pointwise (offsets add, scales
// multiply) so a chain of parent/child transforms collapses to one before
// it's ever applied to a time value.

use serde::{Deserialize, Serialize};

use crate::time::RationalTime;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeTransform {
    pub offset: RationalTime,
    pub scale: f64,
    pub rate: f64,
}

impl TimeTransform {
    pub fn new(offset: RationalTime, scale: f64, rate: f64) -> Self {
        Self { offset, scale, rate }
    }

    pub fn identity() -> Self {
        Self { offset: RationalTime::zero(), scale: 1.0, rate: -1.0 }
    }

    fn output_rate(&self, input_rate: f64) -> f64 {
        if self.rate > 0.0 {
            self.rate
        } else {
            input_rate
        }
    }

    /// Apply this transform to `t`: multiply by `scale`, add `offset`.
    pub fn applied_to(&self, t: RationalTime) -> RationalTime {
        let out_rate = self.output_rate(t.rate);
        let scaled = t.rescaled_to(out_rate).value * self.scale;
        let offset = self.offset.rescaled_to(out_rate).value;
        RationalTime::new(scaled + offset, out_rate)
    }

    /// Compose `self` with `other`, such that
    /// `self.compose(other).applied_to(t) == self.applied_to(other.applied_to(t))`
    /// for offsets/scales expressed in the same coordinate frame.
    pub fn compose(&self, other: &TimeTransform) -> TimeTransform {
        TimeTransform {
            offset: self.offset + other.offset,
            scale: self.scale * other.scale,
            rate: if self.rate > 0.0 { self.rate } else { other.rate },
        }
    }
}

impl Default for TimeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for TimeTransform {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.scale == other.scale && self.rate == other.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_noop() {
        let t = RationalTime::new(10.0, 24.0);
        assert_eq!(TimeTransform::identity().applied_to(t), t);
    }

    #[test]
    fn scale_and_offset_apply() {
        let tt = TimeTransform::new(RationalTime::new(5.0, 24.0), 2.0, 24.0);
        let t = RationalTime::new(10.0, 24.0);
        let result = tt.applied_to(t);
        assert_eq!(result.value, 25.0);
        assert_eq!(result.rate, 24.0);
    }

    #[test]
    fn compose_multiplies_scales_and_adds_offsets() {
        let a = TimeTransform::new(RationalTime::new(1.0, 24.0), 2.0, 24.0);
        let b = TimeTransform::new(RationalTime::new(3.0, 24.0), 4.0, 24.0);
        let c = a.compose(&b);
        assert_eq!(c.scale, 8.0);
        assert_eq!(c.offset, RationalTime::new(4.0, 24.0));
    }
}
