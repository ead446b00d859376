// src/time/time_string.rs
//
// `[-]HH:MM:SS.micros` formatting and parsing. Distinct from SMPTE timecode:
// this format carries no frame rate and expresses time as wall-clock-style
// hours/minutes/seconds plus a fractional microsecond remainder.

use crate::error::{Error, Result};
use crate::time::RationalTime;

/// Format a `RationalTime` as `[-]HH:MM:SS.micros`.
///
/// Microseconds are rendered at full (six-digit) precision, then trailing
/// zeros are trimmed to a minimum of one digit after the decimal point —
/// this resolves the ambiguous `%02d:%02d:%02d.%d` precision used by the
/// reference C++ formatter.
pub fn to_time_string(time: RationalTime) -> String {
    let total_seconds = time.to_seconds();
    let negative = total_seconds < 0.0;
    let mut remaining = total_seconds.abs();

    let hours = (remaining / 3600.0).floor() as i64;
    remaining -= (hours as f64) * 3600.0;
    let minutes = (remaining / 60.0).floor() as i64;
    remaining -= (minutes as f64) * 60.0;
    let seconds = remaining.floor() as i64;
    let micros_frac = remaining - seconds as f64;
    let micros = (micros_frac * 1_000_000.0).round() as i64;

    let mut micros_str = format!("{micros:06}");
    while micros_str.len() > 1 && micros_str.ends_with('0') {
        micros_str.pop();
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros_str}")
}

/// Parse `[-]HH:MM:SS.micros`, permitting missing leading components
/// (right-to-left: seconds, minutes, hours). A per-field value of 60 or
/// more for minutes or seconds is rejected.
pub fn parse_time_string(s: &str, rate: f64) -> Result<RationalTime> {
    let trimmed = s.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, trimmed),
    };
    if rest.is_empty() {
        return Err(Error::InvalidTimeString(s.to_string()));
    }

    let parts: Vec<&str> = rest.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(Error::InvalidTimeString(s.to_string()));
    }

    let (h_str, m_str, s_str) = match parts.len() {
        1 => (None, None, parts[0]),
        2 => (None, Some(parts[0]), parts[1]),
        3 => (Some(parts[0]), Some(parts[1]), parts[2]),
        _ => unreachable!(),
    };

    let hours: f64 = match h_str {
        Some(v) => v.parse().map_err(|_| Error::InvalidTimeString(s.to_string()))?,
        None => 0.0,
    };
    let minutes: f64 = match m_str {
        Some(v) => v.parse().map_err(|_| Error::InvalidTimeString(s.to_string()))?,
        None => 0.0,
    };
    let seconds: f64 = s_str.parse().map_err(|_| Error::InvalidTimeString(s.to_string()))?;

    if minutes >= 60.0 || seconds >= 60.0 {
        return Err(Error::InvalidTimeString(s.to_string()));
    }

    let mut total = hours * 3600.0 + minutes * 60.0 + seconds;
    if negative {
        total = -total;
    }

    Ok(RationalTime::from_seconds(total, rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_trims_trailing_zeros() {
        let t = RationalTime::new(1.5, 1.0);
        assert_eq!(to_time_string(t), "00:00:01.5");
    }

    #[test]
    fn formats_zero_micros_keeps_one_digit() {
        let t = RationalTime::new(2.0, 1.0);
        assert_eq!(to_time_string(t), "00:00:02.0");
    }

    #[test]
    fn formats_negative_leading_sign() {
        let t = RationalTime::new(-61.25, 1.0);
        assert_eq!(to_time_string(t), "-00:01:01.25");
    }

    #[test]
    fn parses_missing_leading_components() {
        let t = parse_time_string("1.5", 1.0).unwrap();
        assert!((t.to_seconds() - 1.5).abs() < 1e-9);
        let t = parse_time_string("01:01.25", 1.0).unwrap();
        assert!((t.to_seconds() - 61.25).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_range_minutes_seconds() {
        assert!(parse_time_string("00:60:00", 1.0).is_err());
        assert!(parse_time_string("00:00:60", 1.0).is_err());
    }

    #[test]
    fn round_trip() {
        let t = RationalTime::new(3723.125, 1.0);
        let s = to_time_string(t);
        let back = parse_time_string(&s, 1.0).unwrap();
        assert!((back.to_seconds() - t.to_seconds()).abs() < 1e-6);
    }
}
