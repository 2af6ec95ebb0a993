//! JSON parser for the vehicle-position endpoint.

use anyhow::{Result, bail};
use serde::Deserialize;

use crate::records::Observation;

/// The API wraps every payload in `{"result": ...}`. On a bad request or key it still answers
/// 200 but puts an error message string in `result`.
#[derive(Deserialize)]
struct Envelope {
    result: Payload,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Positions(Vec<Observation>),
    Message(String),
}

/// Decodes a position snapshot from raw response bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not the expected JSON or the API reported an error.
pub fn parse_positions(bytes: &[u8]) -> Result<Vec<Observation>> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    match envelope.result {
        Payload::Positions(positions) => Ok(positions),
        Payload::Message(message) => bail!("API returned an error: {message}"),
    }
}
