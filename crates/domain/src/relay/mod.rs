//! Relay — one of the four controllable outputs (stations) on the controller.
//!
//! The device is authoritative for every relay's state. This module holds the
//! wire types it reports and the [`RelayBoard`] that merges those reports with
//! locally extrapolated countdowns.

mod board;

pub use board::{ExpiryChange, RelayBoard, RelayView, format_countdown};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of relays on the controller.
pub const RELAY_COUNT: u8 = 4;

/// Factory names of the four stations, indexed by relay id.
pub const DEFAULT_STATION_NAMES: [&str; RELAY_COUNT as usize] =
    ["Plants", "Grass", "Patio Grass", "Front Lawn"];

/// Identifier of a relay, guaranteed to be in `0..RELAY_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RelayId(u8);

impl RelayId {
    /// Validate a raw relay number.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRelay`] when `raw >= RELAY_COUNT`.
    pub fn new(raw: u8) -> Result<Self, ValidationError> {
        if raw < RELAY_COUNT {
            Ok(Self(raw))
        } else {
            Err(ValidationError::InvalidRelay(raw))
        }
    }

    /// Every relay, in id order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..RELAY_COUNT).map(Self)
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Position of this relay in per-relay arrays.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl TryFrom<u8> for RelayId {
    type Error = ValidationError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<RelayId> for u8 {
    fn from(id: RelayId) -> Self {
        id.0
    }
}

impl fmt::Display for RelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Physical on/off state reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayState {
    On,
    #[default]
    Off,
}

impl RelayState {
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Activation mode reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    #[default]
    Off,
    /// On until switched off.
    Manual,
    /// On with a device-tracked auto-off deadline.
    Timed,
}

impl fmt::Display for RelayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::Manual => f.write_str("manual"),
            Self::Timed => f.write_str("timed"),
        }
    }
}

/// A command sent to a single relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayAction {
    On,
    Off,
    Toggle,
    Timed { seconds: u32 },
}

impl RelayAction {
    /// Build a timed activation from a user-entered number of minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonPositiveDuration`] when `minutes <= 0`.
    pub fn timed_minutes(minutes: i64) -> Result<Self, ValidationError> {
        if minutes <= 0 {
            return Err(ValidationError::NonPositiveDuration);
        }
        let seconds = u32::try_from(minutes.saturating_mul(60)).unwrap_or(u32::MAX);
        Ok(Self::Timed { seconds })
    }

    /// Value of the `action` query parameter.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Toggle => "toggle",
            Self::Timed { .. } => "timed",
        }
    }

    /// Value of the `duration` query parameter, only for timed activations.
    #[must_use]
    pub fn duration_seconds(&self) -> Option<u32> {
        match self {
            Self::Timed { seconds } => Some(*seconds),
            _ => None,
        }
    }
}

impl fmt::Display for RelayAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One relay entry of `GET /api/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStatus {
    pub id: RelayId,
    pub state: RelayState,
    pub mode: RelayMode,
    #[serde(rename = "rem", default)]
    pub remaining_seconds: u32,
}

/// Body returned by `GET /api/relay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelayActionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay: Option<RelayId>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub state: RelayState,
    #[serde(default)]
    pub mode: RelayMode,
    #[serde(rename = "rem", default)]
    pub remaining_seconds: u32,
}
