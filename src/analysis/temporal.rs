//! Elapsed-time arithmetic between position samples and against timetable clock times.

use chrono::{NaiveDateTime, NaiveTime};

use crate::analysis::AnalysisError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const CLOCK_FORMAT: &str = "%H:%M:%S";

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Non-zero intervals between consecutive samples.
///
/// `hours[k]` is the length of gap `gaps[k]`, where gap `i` spans sample `i` to sample `i + 1`
/// of the input. Zero-length gaps are absent from both vectors, so the two always have the
/// same length and never line up positionally with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intervals {
    pub hours: Vec<f64>,
    pub gaps: Vec<usize>,
}

impl Intervals {
    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    /// Iterates `(gap, hours)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.gaps.iter().copied().zip(self.hours.iter().copied())
    }
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, AnalysisError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| {
        AnalysisError::MalformedTimestamp {
            value: value.to_string(),
            format: TIMESTAMP_FORMAT,
        }
    })
}

/// Absolute elapsed hours between each pair of consecutive timestamps, dropping zero-length
/// pairs.
///
/// # Errors
///
/// Returns [`AnalysisError::MalformedTimestamp`] for the first timestamp that does not match
/// [`TIMESTAMP_FORMAT`].
pub fn elapsed_hours<S: AsRef<str>>(timestamps: &[S]) -> Result<Intervals, AnalysisError> {
    let parsed = timestamps
        .iter()
        .map(|t| parse_timestamp(t.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut intervals = Intervals::default();
    for (gap, pair) in parsed.windows(2).enumerate() {
        let seconds = (pair[1] - pair[0]).num_seconds().abs();
        if seconds == 0 {
            continue;
        }
        intervals.hours.push(seconds as f64 / SECONDS_PER_HOUR);
        intervals.gaps.push(gap);
    }

    Ok(intervals)
}

/// Parses a timetable clock time, folding hours past midnight (`24:00:00` and later) back into
/// the day.
fn parse_clock(value: &str, wrap_past_midnight: bool) -> Result<NaiveTime, AnalysisError> {
    let malformed = || AnalysisError::MalformedClockTime {
        value: value.to_string(),
    };

    let mut parts = value.trim().splitn(3, ':');
    let (Some(hour), Some(minute), Some(second)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    let mut hour: u32 = hour.parse().map_err(|_| malformed())?;
    if wrap_past_midnight && hour >= 24 {
        hour -= 24;
    }

    NaiveTime::parse_from_str(&format!("{hour:02}:{minute}:{second}"), CLOCK_FORMAT)
        .map_err(|_| malformed())
}

/// Absolute difference in hours between an observed clock reading and a scheduled clock time.
///
/// Timetables write departures after midnight as `24:xx`, `25:xx`, ...; the scheduled side is
/// shifted back by one day before comparing. The observed side is taken literally.
pub fn clock_offset_hours(observed: &str, scheduled: &str) -> Result<f64, AnalysisError> {
    let observed = parse_clock(observed, false)?;
    let scheduled = parse_clock(scheduled, true)?;
    let seconds = (scheduled - observed).num_seconds().abs();
    Ok(seconds as f64 / SECONDS_PER_HOUR)
}
