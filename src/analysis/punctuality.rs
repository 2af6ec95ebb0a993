//! Matches live vehicle positions against stop timetables.
//!
//! A scheduled arrival `(stop, line, time, brigade)` is checked against every observation of that
//! line and brigade taken within [`PunctualityRules::window_hours`] of the scheduled time. Each
//! such observation becomes one verdict: punctual when the vehicle was within
//! [`PunctualityRules::stop_radius_km`] of the stop, late otherwise. A scheduled arrival may
//! produce any number of verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::analysis::AnalysisError;
use crate::analysis::geodesy::{Coordinate, checked_distance_km};
use crate::analysis::temporal::{TIMESTAMP_FORMAT, clock_offset_hours};
use crate::records::{Observation, StopSchedule};

/// Matching tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PunctualityRules {
    /// Observations at least this far from the scheduled time (hours) are ignored.
    pub window_hours: f64,
    /// Observations closer than this to the stop (km) count as punctual.
    pub stop_radius_km: f64,
}

impl Default for PunctualityRules {
    fn default() -> Self {
        Self {
            window_hours: 0.1,
            stop_radius_km: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuality {
    Punctual,
    Late,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunctualityVerdict {
    pub line: String,
    pub brigade: String,
    pub scheduled_time: String,
    /// Minutes between observation and schedule, rounded to two decimals.
    pub offset_minutes: f64,
    pub distance_km: f64,
}

impl fmt::Display for PunctualityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}min, {}km)",
            self.line, self.brigade, self.scheduled_time, self.offset_minutes, self.distance_km
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PunctualityReport {
    pub punctual: Vec<PunctualityVerdict>,
    pub late: Vec<PunctualityVerdict>,
}

impl PunctualityReport {
    fn push(&mut self, class: Punctuality, verdict: PunctualityVerdict) {
        match class {
            Punctuality::Punctual => self.punctual.push(verdict),
            Punctuality::Late => self.late.push(verdict),
        }
    }

    pub fn len(&self) -> usize {
        self.punctual.len() + self.late.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Distance from the observation to the stop, or `None` when either side lacks usable
/// coordinates.
fn distance_to_stop(observation: &Observation, stop: &StopSchedule) -> Option<f64> {
    let stop_position = Coordinate::new(stop.latitude?, stop.longitude?);
    let vehicle_position = Coordinate::new(observation.latitude, observation.longitude);
    checked_distance_km(vehicle_position, stop_position)
}

/// Classifies every observation that matches a scheduled arrival by line, brigade and time.
///
/// # Errors
///
/// Fails when an observation timestamp has no `HH:MM:SS` part or a scheduled time is not a clock
/// time. Missing or invalid coordinates only drop the affected candidate.
#[tracing::instrument(skip_all, fields(observations = observations.len(), stops = stops.len()))]
pub fn classify(
    observations: &[Observation],
    stops: &[StopSchedule],
    rules: &PunctualityRules,
) -> Result<PunctualityReport, AnalysisError> {
    let mut report = PunctualityReport::default();
    let mut dropped = 0usize;

    for stop in stops {
        for (line, timetable) in &stop.lines {
            for (scheduled_time, brigade) in timetable {
                let candidates = observations
                    .iter()
                    .filter(|obs| &obs.line == line && &obs.brigade == brigade);

                for obs in candidates {
                    let clock = obs
                        .clock_time()
                        .ok_or_else(|| AnalysisError::MalformedTimestamp {
                            value: obs.time.clone(),
                            format: TIMESTAMP_FORMAT,
                        })?;
                    let offset = clock_offset_hours(clock, scheduled_time)?;
                    if offset >= rules.window_hours {
                        continue;
                    }

                    let Some(distance_km) = distance_to_stop(obs, stop) else {
                        dropped += 1;
                        continue;
                    };

                    let class = if distance_km < rules.stop_radius_km {
                        Punctuality::Punctual
                    } else {
                        Punctuality::Late
                    };

                    report.push(
                        class,
                        PunctualityVerdict {
                            line: line.clone(),
                            brigade: brigade.clone(),
                            scheduled_time: scheduled_time.clone(),
                            offset_minutes: round_to_hundredths(offset * 60.0),
                            distance_km,
                        },
                    );
                }
            }
        }
    }

    debug!(
        punctual = report.punctual.len(),
        late = report.late.len(),
        dropped,
        "Punctuality classified"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn obs(line: &str, brigade: &str, time: &str, lat: f64, lon: f64) -> Observation {
        Observation {
            line: line.into(),
            longitude: lon,
            vehicle: "1000".into(),
            time: time.into(),
            latitude: lat,
            brigade: brigade.into(),
        }
    }

    fn stop(lat: Option<f64>, lon: Option<f64>, line: &str, entries: &[(&str, &str)]) -> StopSchedule {
        let timetable: BTreeMap<String, String> = entries
            .iter()
            .map(|(t, b)| (t.to_string(), b.to_string()))
            .collect();
        StopSchedule {
            stop_id: "7009".into(),
            stop_number: "01".into(),
            latitude: lat,
            longitude: lon,
            lines: BTreeMap::from([(line.to_string(), timetable)]),
        }
    }

    #[test]
    fn test_exact_match_is_punctual() {
        let stops = [stop(Some(52.2), Some(21.0), "520", &[("12:00:00", "3")])];
        let rows = [obs("520", "3", "2021-02-10 12:00:00", 52.2, 21.0)];

        let report = classify(&rows, &stops, &PunctualityRules::default()).unwrap();

        assert_eq!(report.punctual.len(), 1);
        assert!(report.late.is_empty());
        let verdict = &report.punctual[0];
        assert_eq!(verdict.offset_minutes, 0.0);
        assert!(verdict.distance_km.abs() < 1e-9);
        assert_eq!(verdict.scheduled_time, "12:00:00");
    }

    #[test]
    fn test_far_from_stop_is_late() {
        // ~2.2 km north of the stop
        let stops = [stop(Some(52.2), Some(21.0), "520", &[("12:00:00", "3")])];
        let rows = [obs("520", "3", "2021-02-10 12:00:00", 52.22, 21.0)];

        let report = classify(&rows, &stops, &PunctualityRules::default()).unwrap();

        assert!(report.punctual.is_empty());
        assert_eq!(report.late.len(), 1);
        assert!(report.late[0].distance_km > 2.0);
    }

    #[test]
    fn test_outside_window_is_excluded() {
        let stops = [stop(Some(52.2), Some(21.0), "520", &[("12:00:00", "3")])];
        let rows = [
            obs("520", "3", "2021-02-10 12:06:00", 52.2, 21.0),
            obs("520", "3", "2021-02-10 11:50:00", 52.2, 21.0),
        ];

        let report = classify(&rows, &stops, &PunctualityRules::default()).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_offset_rounded_minutes() {
        let stops = [stop(Some(52.2), Some(21.0), "520", &[("12:00:00", "3")])];
        let rows = [obs("520", "3", "2021-02-10 12:03:20", 52.2, 21.0)];

        let report = classify(&rows, &stops, &PunctualityRules::default()).unwrap();
        assert_eq!(report.punctual[0].offset_minutes, 3.33);
    }

    #[test]
    fn test_only_matching_line_and_brigade() {
        let stops = [stop(Some(52.2), Some(21.0), "520", &[("12:00:00", "3")])];
        let rows = [
            obs("520", "4", "2021-02-10 12:00:00", 52.2, 21.0),
            obs("521", "3", "2021-02-10 12:00:00", 52.2, 21.0),
        ];

        let report = classify(&rows, &stops, &PunctualityRules::default()).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_multiple_matches_are_kept() {
        let stops = [stop(Some(52.2), Some(21.0), "520", &[("12:00:00", "3")])];
        let rows = [
            obs("520", "3", "2021-02-10 11:58:00", 52.205, 21.0),
            obs("520", "3", "2021-02-10 12:00:00", 52.2, 21.0),
            obs("520", "3", "2021-02-10 12:02:00", 52.195, 21.0),
        ];

        let report = classify(&rows, &stops, &PunctualityRules::default()).unwrap();
        assert_eq!(report.punctual.len(), 3);
        assert_eq!(report.punctual[0].offset_minutes, 2.0);
        assert_eq!(report.punctual[1].offset_minutes, 0.0);
    }

    #[test]
    fn test_schedule_past_midnight() {
        let stops = [stop(Some(52.2), Some(21.0), "N85", &[("24:03:00", "1")])];
        let rows = [obs("N85", "1", "2021-02-11 00:01:00", 52.2, 21.0)];

        let report = classify(&rows, &stops, &PunctualityRules::default()).unwrap();
        assert_eq!(report.punctual.len(), 1);
        assert_eq!(report.punctual[0].offset_minutes, 2.0);
    }

    #[test]
    fn test_missing_coordinates_drop_candidate() {
        let stops = [
            stop(None, Some(21.0), "520", &[("12:00:00", "3")]),
            stop(Some(52.2), Some(21.0), "520", &[("12:00:00", "3")]),
        ];
        let rows = [
            obs("520", "3", "2021-02-10 12:00:00", 52.2, 21.0),
            obs("520", "3", "2021-02-10 12:01:00", f64::NAN, 21.0),
        ];

        let report = classify(&rows, &stops, &PunctualityRules::default()).unwrap();
        assert_eq!(report.punctual.len(), 1);
        assert!(report.late.is_empty());
    }

    #[test]
    fn test_custom_rules() {
        let stops = [stop(Some(52.2), Some(21.0), "520", &[("12:00:00", "3")])];
        let rows = [obs("520", "3", "2021-02-10 12:08:00", 52.205, 21.0)];
        let rules = PunctualityRules {
            window_hours: 0.25,
            stop_radius_km: 0.1,
        };

        let report = classify(&rows, &stops, &rules).unwrap();
        assert_eq!(report.late.len(), 1);
    }

    #[test]
    fn test_malformed_times_are_fatal() {
        let stops = [stop(Some(52.2), Some(21.0), "520", &[("noon", "3")])];
        let rows = [obs("520", "3", "2021-02-10 12:00:00", 52.2, 21.0)];
        assert!(classify(&rows, &stops, &PunctualityRules::default()).is_err());

        let stops = [stop(Some(52.2), Some(21.0), "520", &[("12:00:00", "3")])];
        let rows = [obs("520", "3", "12:00:00", 52.2, 21.0)];
        assert!(matches!(
            classify(&rows, &stops, &PunctualityRules::default()),
            Err(AnalysisError::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn test_empty_inputs() {
        let report = classify(&[], &[], &PunctualityRules::default()).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_verdict_display() {
        let verdict = PunctualityVerdict {
            line: "520".into(),
            brigade: "3".into(),
            scheduled_time: "12:00:00".into(),
            offset_minutes: 1.5,
            distance_km: 0.25,
        };
        assert_eq!(verdict.to_string(), "(520, 3, 12:00:00, 1.5min, 0.25km)");
    }
}
