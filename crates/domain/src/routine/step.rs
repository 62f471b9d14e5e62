//! Step — one timed station activation inside a routine.

use serde::{Deserialize, Serialize};

use crate::relay::RelayId;

/// Shortest duration a step can run, in minutes.
pub const MIN_DURATION_MINUTES: u8 = 1;
/// Longest duration a step can run, in minutes.
pub const MAX_DURATION_MINUTES: u8 = 20;
/// Duration given to newly added steps, in minutes.
pub const DEFAULT_DURATION_MINUTES: u8 = 5;

/// A single entry of a routine.
///
/// Field names on the wire follow the device's stored format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "id")]
    pub station: RelayId,
    pub name: String,
    #[serde(rename = "duration")]
    pub duration_minutes: u8,
    pub enabled: bool,
    /// Rank within the routine; the only source of execution order.
    pub order: u32,
}

impl Step {
    #[must_use]
    pub fn new(station: RelayId, name: impl Into<String>, order: u32) -> Self {
        Self {
            station,
            name: name.into(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            enabled: true,
            order,
        }
    }
}

/// Saturate any requested duration into the allowed range.
#[must_use]
pub fn clamp_duration(minutes: i64) -> u8 {
    let clamped = minutes.clamp(
        i64::from(MIN_DURATION_MINUTES),
        i64::from(MAX_DURATION_MINUTES),
    );
    u8::try_from(clamped).unwrap_or(MAX_DURATION_MINUTES)
}

/// Interpret free-form duration input; unparsable text counts as the minimum.
#[must_use]
pub fn parse_duration(input: &str) -> u8 {
    input
        .trim()
        .parse::<i64>()
        .map_or(MIN_DURATION_MINUTES, clamp_duration)
}
