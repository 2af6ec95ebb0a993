use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Malformed timestamp {value:?}, expected {format:?}")]
    MalformedTimestamp { value: String, format: &'static str },

    #[error("Malformed clock time {value:?}, expected HH:MM:SS")]
    MalformedClockTime { value: String },

    #[error("Invalid coordinate (lat {latitude}, lon {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Coordinate sequences differ in length: {latitudes} latitudes, {longitudes} longitudes")]
    LengthMismatch { latitudes: usize, longitudes: usize },
}
