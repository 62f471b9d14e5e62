//! HTTP-specific error type wrapping reqwest errors.

use sprinkler_domain::error::{DeviceError, SprinklerError};

/// Errors originating from the HTTP device adapter.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The request could not be sent or the response not received.
    #[error("request failed")]
    Transport(#[from] reqwest::Error),

    /// The device answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not the JSON the endpoint promises.
    #[error("unexpected response body")]
    Json(#[from] serde_json::Error),

    /// The configured base URL cannot be used.
    #[error("invalid device URL {0:?}")]
    InvalidBaseUrl(String),
}

impl From<HttpError> for SprinklerError {
    fn from(err: HttpError) -> Self {
        let device = match err {
            HttpError::Status { status, body } => DeviceError::Status {
                status,
                message: body,
            },
            HttpError::Json(err) => DeviceError::Decode(Box::new(err)),
            HttpError::Transport(err) if err.is_decode() => DeviceError::Decode(Box::new(err)),
            other => DeviceError::Unreachable(Box::new(other)),
        };
        Self::Device(device)
    }
}
