// src/time/mod.rs
//
// Rational time arithmetic: RationalTime, TimeRange, TimeTransform, and
// SMPTE timecode / time-string conversion.
//
// Every value here is integer-exact at its own rate. Comparisons cross rates
// by converting to seconds; arithmetic crosses rates by rescaling the
// lower-rate operand up before combining (see `rational_time.rs`).

mod rational_time;
mod time_range;
mod time_string;
mod time_transform;
mod timecode;

pub use rational_time::RationalTime;
pub use time_range::TimeRange;
pub use time_string::{parse_time_string, to_time_string};
pub use time_transform::TimeTransform;
pub use timecode::{DropFramePolicy, from_timecode, nearest_valid_timecode_rate, to_timecode};

/// Half a sample at 192kHz — the default epsilon for seconds-based
/// comparisons across this module.
pub const DEFAULT_EPSILON_S: f64 = 1.0 / (2.0 * 192_000.0);
