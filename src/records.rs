//! Row types shared by the ingestion, analysis and output layers.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A single vehicle-position sample as published by the transit API.
///
/// Field names on the wire follow the API (`Lines`, `VehicleNumber`, ...), which is also the
/// header layout of the position CSVs written by the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "Lines")]
    pub line: String,
    #[serde(rename = "Lon")]
    pub longitude: f64,
    #[serde(rename = "VehicleNumber")]
    pub vehicle: String,
    /// `YYYY-MM-DD HH:MM:SS`, parsed lazily by the analysis core.
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Lat")]
    pub latitude: f64,
    #[serde(rename = "Brigade")]
    pub brigade: String,
}

impl Observation {
    /// Time-of-day part of the timestamp, if the timestamp has one.
    pub fn clock_time(&self) -> Option<&str> {
        self.time.split(' ').nth(1)
    }
}

/// An observation flagged by the speed filter, together with its position in the input table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedingRecord {
    pub row: usize,
    #[serde(rename = "Lines")]
    pub line: String,
    #[serde(rename = "Lon")]
    pub longitude: f64,
    #[serde(rename = "VehicleNumber")]
    pub vehicle: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Lat")]
    pub latitude: f64,
    #[serde(rename = "Brigade")]
    pub brigade: String,
    pub avg_speed: f64,
}

impl SpeedingRecord {
    pub fn new(row: usize, observation: &Observation, avg_speed: f64) -> Self {
        Self {
            row,
            line: observation.line.clone(),
            longitude: observation.longitude,
            vehicle: observation.vehicle.clone(),
            time: observation.time.clone(),
            latitude: observation.latitude,
            brigade: observation.brigade.clone(),
            avg_speed,
        }
    }
}

/// Scheduled arrivals for one line at one stop: clock time (`HH:MM:SS`, hours may exceed 23)
/// mapped to the brigade due at that time.
pub type LineTimetable = BTreeMap<String, String>;

/// Timetable of a single stop post.
///
/// The published stop data is noisy, so coordinates are optional: numbers, numeric strings,
/// `null` and missing keys are all accepted, and anything unparsable becomes `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopSchedule {
    #[serde(default, alias = "zespol")]
    pub stop_id: String,
    #[serde(default, alias = "slupek")]
    pub stop_number: String,
    #[serde(default, alias = "szer_geo", deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "dlug_geo", deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,
    #[serde(default, alias = "bus_schedules")]
    pub lines: BTreeMap<String, LineTimetable>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawCoordinate> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawCoordinate::Number(value)) => Some(value),
        Some(RawCoordinate::Text(text)) => text.trim().parse().ok(),
        Some(RawCoordinate::Other(_)) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_time_splits_on_space() {
        let obs = Observation {
            line: "520".into(),
            longitude: 21.0,
            vehicle: "1000".into(),
            time: "2021-02-10 12:34:56".into(),
            latitude: 52.2,
            brigade: "3".into(),
        };
        assert_eq!(obs.clock_time(), Some("12:34:56"));

        let broken = Observation {
            time: "12:34:56".into(),
            ..obs
        };
        assert_eq!(broken.clock_time(), None);
    }

    #[test]
    fn test_stop_schedule_accepts_source_field_names() {
        let json = r#"{
            "zespol": "7009",
            "slupek": "01",
            "szer_geo": "52.219",
            "dlug_geo": 21.012,
            "bus_schedules": {"520": {"05:12:00": "1", "25:10:00": "4"}, "N85": {}}
        }"#;
        let stop: StopSchedule = serde_json::from_str(json).unwrap();

        assert_eq!(stop.stop_id, "7009");
        assert_eq!(stop.stop_number, "01");
        assert_eq!(stop.latitude, Some(52.219));
        assert_eq!(stop.longitude, Some(21.012));
        assert_eq!(stop.lines["520"]["25:10:00"], "4");
        assert!(stop.lines["N85"].is_empty());
    }

    #[test]
    fn test_stop_schedule_tolerates_bad_coordinates() {
        let json = r#"{"zespol": "1", "szer_geo": "null", "dlug_geo": null}"#;
        let stop: StopSchedule = serde_json::from_str(json).unwrap();
        assert_eq!(stop.latitude, None);
        assert_eq!(stop.longitude, None);

        let json = r#"{"zespol": "1"}"#;
        let stop: StopSchedule = serde_json::from_str(json).unwrap();
        assert_eq!(stop.latitude, None);
        assert!(stop.lines.is_empty());
    }

    #[test]
    fn test_speeding_record_copies_observation() {
        let obs = Observation {
            line: "174".into(),
            longitude: 20.9,
            vehicle: "9001".into(),
            time: "2021-02-10 08:00:00".into(),
            latitude: 52.1,
            brigade: "2".into(),
        };
        let record = SpeedingRecord::new(7, &obs, 63.5);

        assert_eq!(record.row, 7);
        assert_eq!(record.vehicle, "9001");
        assert_eq!(record.avg_speed, 63.5);
    }
}
