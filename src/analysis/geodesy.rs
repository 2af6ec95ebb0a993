//! WGS-84 geodesic distances between position samples.

use geo::{Distance, Geodesic, Point};

use crate::analysis::AnalysisError;

const METERS_PER_KILOMETER: f64 = 1000.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }

    fn validated(self) -> Result<Self, AnalysisError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(AnalysisError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Geodesic distance in kilometers between two coordinates.
pub fn distance_km(from: Coordinate, to: Coordinate) -> Result<f64, AnalysisError> {
    let from = from.validated()?;
    let to = to.validated()?;
    Ok(Geodesic::distance(from.point(), to.point()) / METERS_PER_KILOMETER)
}

/// Like [`distance_km`], but yields `None` instead of an error for unusable coordinates.
pub fn checked_distance_km(from: Coordinate, to: Coordinate) -> Option<f64> {
    distance_km(from, to).ok()
}

/// Distances in kilometers between each consecutive pair of coordinates given as parallel
/// latitude and longitude slices. `n` coordinates produce `n - 1` distances.
pub fn consecutive_distances_km(
    latitudes: &[f64],
    longitudes: &[f64],
) -> Result<Vec<f64>, AnalysisError> {
    if latitudes.len() != longitudes.len() {
        return Err(AnalysisError::LengthMismatch {
            latitudes: latitudes.len(),
            longitudes: longitudes.len(),
        });
    }

    let coordinates: Vec<Coordinate> = latitudes
        .iter()
        .zip(longitudes)
        .map(|(&lat, &lon)| Coordinate::new(lat, lon))
        .collect();

    coordinates
        .windows(2)
        .map(|pair| distance_km(pair[0], pair[1]))
        .collect()
}
