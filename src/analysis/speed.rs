//! Average speed between consecutive samples of each vehicle, and the speeding filter on top.

use std::collections::HashMap;
use tracing::debug;

use crate::analysis::AnalysisError;
use crate::analysis::geodesy::consecutive_distances_km;
use crate::analysis::temporal::elapsed_hours;
use crate::records::{Observation, SpeedingRecord};

/// Default speed limit in km/h.
pub const DEFAULT_SPEED_LIMIT_KMH: f64 = 50.0;

/// Groups row indices by vehicle, keeping each vehicle's rows in table order. Vehicles come out
/// in order of first appearance.
fn partition_by_vehicle(observations: &[Observation]) -> Vec<(&str, Vec<usize>)> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut partitions: Vec<(&str, Vec<usize>)> = Vec::new();
    for (row, obs) in observations.iter().enumerate() {
        let vehicle = obs.vehicle.as_str();
        let slot = *slots.entry(vehicle).or_insert_with(|| {
            partitions.push((vehicle, Vec::new()));
            partitions.len() - 1
        });
        partitions[slot].1.push(row);
    }
    partitions
}

/// Speeds for one vehicle's rows, aligned with `rows`. The speed over gap `i` belongs to the
/// sample that closes it, `rows[i + 1]`.
fn partition_speeds(
    observations: &[Observation],
    rows: &[usize],
) -> Result<Vec<Option<f64>>, AnalysisError> {
    let mut speeds = vec![None; rows.len()];

    let timestamps: Vec<&str> = rows.iter().map(|&r| observations[r].time.as_str()).collect();
    let intervals = elapsed_hours(&timestamps)?;
    if intervals.is_empty() {
        return Ok(speeds);
    }

    let latitudes: Vec<f64> = rows.iter().map(|&r| observations[r].latitude).collect();
    let longitudes: Vec<f64> = rows.iter().map(|&r| observations[r].longitude).collect();
    let distances = consecutive_distances_km(&latitudes, &longitudes)?;

    for (gap, hours) in intervals.iter() {
        speeds[gap + 1] = Some(distances[gap] / hours);
    }

    Ok(speeds)
}

/// Average speed in km/h attributed to every row of `observations`.
///
/// A row gets `None` when no interval ends at it: the first sample of a vehicle, or a sample
/// whose timestamp repeats the previous one.
///
/// # Errors
///
/// Fails on the first malformed timestamp or invalid coordinate, checking vehicles in order of
/// first appearance.
pub fn average_speeds(observations: &[Observation]) -> Result<Vec<Option<f64>>, AnalysisError> {
    let mut column = vec![None; observations.len()];

    for (vehicle, rows) in partition_by_vehicle(observations) {
        let speeds = partition_speeds(observations, &rows)?;
        debug!(
            vehicle,
            samples = rows.len(),
            intervals = speeds.iter().flatten().count(),
            "Vehicle speeds computed"
        );
        for (row, speed) in rows.into_iter().zip(speeds) {
            column[row] = speed;
        }
    }

    Ok(column)
}

/// Rows whose average speed strictly exceeds `speed_limit` km/h, in table order.
///
/// Rows without an attributed speed are reported as 0 km/h elsewhere but are never flagged here,
/// even for a negative limit.
#[tracing::instrument(skip(observations), fields(rows = observations.len()))]
pub fn speeding(
    observations: &[Observation],
    speed_limit: f64,
) -> Result<Vec<SpeedingRecord>, AnalysisError> {
    let speeds = average_speeds(observations)?;

    let flagged: Vec<SpeedingRecord> = observations
        .iter()
        .zip(speeds)
        .enumerate()
        .filter_map(|(row, (obs, speed))| match speed {
            Some(kmh) if kmh > speed_limit => Some(SpeedingRecord::new(row, obs, kmh)),
            _ => None,
        })
        .collect();

    debug!(flagged = flagged.len(), "Speeding filter applied");
    Ok(flagged)
}
