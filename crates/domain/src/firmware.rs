//! Firmware — over-the-air update targets and upload progress.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Partition an OTA image is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirmwareTarget {
    /// Application firmware.
    #[default]
    App,
    /// Web UI filesystem image.
    Spiffs,
}

impl FirmwareTarget {
    /// Value of the `type` query parameter.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Spiffs => "spiffs",
        }
    }
}

impl fmt::Display for FirmwareTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FirmwareTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "app" => Ok(Self::App),
            "spiffs" => Ok(Self::Spiffs),
            other => Err(format!("unknown firmware target: {other}")),
        }
    }
}

/// Bytes sent so far out of the image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Whole percent sent; an empty upload counts as complete.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = self.sent.min(self.total).saturating_mul(100) / self.total;
        u8::try_from(pct).unwrap_or(100)
    }
}
