//! Connection settings for the controller.

use std::time::Duration;

/// Where the controller lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Origin of the controller, e.g. `http://192.168.4.1`.
    pub base_url: String,
    /// Timeout for ordinary API calls.
    pub timeout: Duration,
    /// Timeout for a whole firmware upload.
    pub upload_timeout: Duration,
    /// Size of each streamed firmware chunk, in bytes.
    pub upload_chunk_size: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.4.1".to_string(),
            timeout: Duration::from_secs(10),
            upload_timeout: Duration::from_secs(300),
            upload_chunk_size: 16 * 1024,
        }
    }
}
