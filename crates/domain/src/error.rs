//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`SprinklerError`] via `From`, so services can propagate with `?`.

/// Base error for every fallible operation in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum SprinklerError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("local cache error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Input rejected before it reaches the device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("relay id {0} is out of range (0..4)")]
    InvalidRelay(u8),

    #[error("duration must be a positive number of minutes")]
    NonPositiveDuration,

    #[error("firmware image is empty")]
    EmptyFirmwareImage,

    #[error("routines payload is {size} bytes, the device accepts at most {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
}

/// Failures talking to the remote controller.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The request never produced a response (connection refused, timeout, …).
    #[error("device unreachable: {0}")]
    Unreachable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The device answered with a non-success status code.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The device answered `success: false`.
    #[error("device rejected {operation}")]
    Rejected { operation: &'static str },

    /// The request body could not be serialized.
    #[error("could not encode request: {0}")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The response body did not match the expected shape.
    #[error("malformed device response: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_base_error() {
        let err: SprinklerError = ValidationError::NonPositiveDuration.into();
        assert!(matches!(
            err,
            SprinklerError::Validation(ValidationError::NonPositiveDuration)
        ));
    }

    #[test]
    fn should_display_status_error_with_code_and_message() {
        let err = DeviceError::Status {
            status: 400,
            message: "Invalid relay ID".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 400: Invalid relay ID");
    }

    #[test]
    fn should_display_payload_limit() {
        let err = ValidationError::PayloadTooLarge {
            size: 5000,
            limit: 4096,
        };
        assert_eq!(
            err.to_string(),
            "routines payload is 5000 bytes, the device accepts at most 4096"
        );
    }
}
