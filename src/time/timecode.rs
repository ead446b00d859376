// src/time/timecode.rs
//
// SMPTE timecode parsing and formatting, including drop-frame (29.97/59.94
// family) support. Rates are the exact NTSC fractions, not their rounded
// decimal approximations, so `30000.0 / 1001.0` round-trips exactly rather
// than drifting against a hard-coded `29.97`.

use crate::error::{Error, Result};
use crate::time::RationalTime;

pub const NTSC_23_976: f64 = 24000.0 / 1001.0;
pub const NTSC_29_97: f64 = 30000.0 / 1001.0;
pub const NTSC_47_95: f64 = 48000.0 / 1001.0;
pub const NTSC_59_94: f64 = 60000.0 / 1001.0;

/// The closed set of valid SMPTE timecode rates, in the declared tie-break
/// order used by `nearest_valid_timecode_rate`.
pub const VALID_TIMECODE_RATES: [f64; 10] =
    [NTSC_23_976, 24.0, 25.0, NTSC_29_97, 30.0, NTSC_47_95, 48.0, 50.0, NTSC_59_94, 60.0];

const DROP_FRAME_RATES: [f64; 2] = [NTSC_29_97, NTSC_59_94];

fn is_drop_frame_rate(rate: f64) -> bool {
    DROP_FRAME_RATES.iter().any(|r| (*r - rate).abs() < 1e-6)
}

fn dropframes_for(rate: f64) -> i64 {
    if (rate - NTSC_29_97).abs() < 1e-6 {
        2
    } else if (rate - NTSC_59_94).abs() < 1e-6 {
        4
    } else {
        0
    }
}

/// The element of [`VALID_TIMECODE_RATES`] closest to `rate`. Ties resolve
/// to the first matching element in declared order.
pub fn nearest_valid_timecode_rate(rate: f64) -> f64 {
    let mut best = VALID_TIMECODE_RATES[0];
    let mut best_dist = (best - rate).abs();
    for &candidate in &VALID_TIMECODE_RATES[1..] {
        let dist = (candidate - rate).abs();
        if dist < best_dist {
            best = candidate;
            best_dist = dist;
        }
    }
    best
}

/// How a caller wants drop-frame notation decided when formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropFramePolicy {
    /// Always use drop-frame notation (`;` divider). The rate must be a
    /// drop-frame rate.
    ForceYes,
    /// Never use drop-frame notation, even at a drop-frame rate.
    ForceNo,
    /// Use drop-frame notation iff the (snapped) rate is a drop-frame rate.
    InferFromRate,
}

/// Parse `HH:MM:SS:FF` (or `HH:MM:SS;FF` for drop-frame) at `rate`.
pub fn from_timecode(timecode: &str, rate: f64) -> Result<RationalTime> {
    let is_drop_frame_str = timecode.contains(';');
    if is_drop_frame_str && !is_drop_frame_rate(rate) {
        return Err(Error::InvalidRateForDropFrameTimecode(rate));
    }

    let cleaned = timecode.replace(';', ":");
    let fields: Vec<&str> = cleaned.split(':').collect();
    if fields.len() != 4 {
        return Err(Error::InvalidTimecodeString(timecode.to_string()));
    }
    let parse = |s: &str| -> Result<i64> {
        s.parse::<i64>().map_err(|_| Error::InvalidTimecodeString(timecode.to_string()))
    };
    let hours = parse(fields[0])?;
    let minutes = parse(fields[1])?;
    let seconds = parse(fields[2])?;
    let frames = parse(fields[3])?;

    let nominal_fps = rate.ceil() as i64;
    if frames >= nominal_fps {
        return Err(Error::TimecodeRateMismatch(rate));
    }

    let dropframes = if is_drop_frame_str { dropframes_for(rate) } else { 0 };
    let total_minutes = hours * 60 + minutes;

    let value = ((total_minutes * 60) + seconds) * nominal_fps + frames
        - dropframes * (total_minutes - total_minutes / 10);

    Ok(RationalTime::new(value as f64, rate))
}

/// Format `time` as SMPTE timecode at `rate`, choosing drop-frame notation
/// per `policy`.
pub fn to_timecode(time: RationalTime, rate: f64, policy: DropFramePolicy) -> Result<String> {
    if time.value < 0.0 {
        return Err(Error::NegativeValue(format!("{time}")));
    }

    let snapped = nearest_valid_timecode_rate(rate);
    if (snapped - rate).abs() > 0.1 {
        return Err(Error::InvalidTimecodeRate(rate));
    }

    let rate_is_dropframe = is_drop_frame_rate(snapped);
    let drop_frame = match policy {
        DropFramePolicy::ForceYes => {
            if !rate_is_dropframe {
                return Err(Error::InvalidRateForDropFrameTimecode(snapped));
            }
            true
        }
        DropFramePolicy::ForceNo => false,
        DropFramePolicy::InferFromRate => rate_is_dropframe,
    };

    let dropframes = if drop_frame { dropframes_for(snapped) } else { 0 };
    let div = if drop_frame { ';' } else { ':' };
    let nominal_fps = snapped.ceil() as i64;

    let frames_per_24h = (nominal_fps * 3600 * 24) as f64;
    let frames_per_10min = (nominal_fps * 600) as f64;
    let frames_per_minute = (nominal_fps * 60 - dropframes) as f64;

    let raw_value = time.rescaled_to(snapped).value.round();
    let mut value = raw_value.rem_euclid(frames_per_24h);

    if drop_frame {
        let ten_minute_chunks = (value / frames_per_10min).floor();
        let frames_over = value.rem_euclid(frames_per_10min);
        if frames_over > dropframes as f64 {
            value += (dropframes as f64) * 9.0 * ten_minute_chunks
                + (dropframes as f64) * ((frames_over - dropframes as f64) / frames_per_minute).floor();
        } else {
            value += (dropframes as f64) * 9.0 * ten_minute_chunks;
        }
    }

    let frames = (value.rem_euclid(nominal_fps as f64)) as i64;
    let seconds_total = (value / nominal_fps as f64).floor() as i64;
    let seconds = seconds_total.rem_euclid(60);
    let minutes = (seconds_total / 60).rem_euclid(60);
    let hours = (seconds_total / 60) / 60;

    Ok(format!("{hours:02}:{minutes:02}:{seconds:02}{div}{frames:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_rate_exact_hits() {
        assert_eq!(nearest_valid_timecode_rate(24.0), 24.0);
        assert!((nearest_valid_timecode_rate(29.97) - NTSC_29_97).abs() < 1e-6);
    }

    #[test]
    fn s1_drop_frame_timecode_scenario() {
        let t = RationalTime::new(1084319.0, NTSC_29_97);
        assert_eq!(to_timecode(t, NTSC_29_97, DropFramePolicy::ForceYes).unwrap(), "10:03:00;05");
        assert_eq!(to_timecode(t, NTSC_29_97, DropFramePolicy::ForceNo).unwrap(), "10:02:23:29");
        assert_eq!(
            to_timecode(t, NTSC_29_97, DropFramePolicy::InferFromRate).unwrap(),
            "10:03:00;05"
        );
    }

    #[test]
    fn round_trip_non_drop_frame() {
        for &rate in &[24.0, 25.0, 30.0, 48.0, 50.0, 60.0] {
            for n in [0i64, 1, 100, 3599 * rate as i64] {
                let t = RationalTime::new(n as f64, rate);
                let tc = to_timecode(t, rate, DropFramePolicy::ForceNo).unwrap();
                let back = from_timecode(&tc, rate).unwrap();
                assert_eq!(back, t, "rate={rate} n={n} tc={tc}");
            }
        }
    }

    #[test]
    fn non_drop_frame_rate_rejects_semicolon() {
        let err = from_timecode("01:00:00;00", 24.0).unwrap_err();
        assert!(matches!(err, Error::InvalidRateForDropFrameTimecode(_)));
    }

    #[test]
    fn frame_beyond_nominal_fps_is_mismatch() {
        let err = from_timecode("00:00:00:24", 24.0).unwrap_err();
        assert!(matches!(err, Error::TimecodeRateMismatch(_)));
    }

    #[test]
    fn negative_value_rejected() {
        let t = RationalTime::new(-1.0, 24.0);
        let err = to_timecode(t, 24.0, DropFramePolicy::ForceNo).unwrap_err();
        assert!(matches!(err, Error::NegativeValue(_)));
    }
}
