//! Device port — the controller's HTTP contract.
//!
//! Implementations translate transport failures into
//! [`DeviceError::Unreachable`](sprinkler_domain::error::DeviceError::Unreachable),
//! non-success status codes into
//! [`DeviceError::Status`](sprinkler_domain::error::DeviceError::Status), and
//! unparsable bodies into
//! [`DeviceError::Decode`](sprinkler_domain::error::DeviceError::Decode).

use std::future::Future;
use std::sync::Arc;

use sprinkler_domain::error::{DeviceError, SprinklerError, ValidationError};
use sprinkler_domain::firmware::{FirmwareTarget, UploadProgress};
use sprinkler_domain::relay::{RelayAction, RelayActionResponse, RelayId};
use sprinkler_domain::routine::Routine;
use sprinkler_domain::status::{ControlResponse, DeviceStatus, RoutineCommand};

/// Largest routines document the device accepts, in bytes.
pub const ROUTINES_PAYLOAD_LIMIT: usize = 4096;

/// Callback receiving upload progress after each chunk.
pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// A serialized routine collection known to fit the device's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutinesPayload(String);

impl RoutinesPayload {
    /// Serialize `routines` with their steps arranged by `order`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PayloadTooLarge`] when the JSON exceeds
    /// [`ROUTINES_PAYLOAD_LIMIT`].
    pub fn encode(routines: &[Routine]) -> Result<Self, SprinklerError> {
        let arranged: Vec<Routine> = routines.iter().map(Routine::arranged).collect();
        let json = serde_json::to_string(&arranged)
            .map_err(|err| DeviceError::Encode(Box::new(err)))?;
        if json.len() > ROUTINES_PAYLOAD_LIMIT {
            return Err(ValidationError::PayloadTooLarge {
                size: json.len(),
                limit: ROUTINES_PAYLOAD_LIMIT,
            }
            .into());
        }
        Ok(Self(json))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Remote controller operations.
pub trait DeviceApi {
    /// `GET /api/relay`: switch one relay.
    fn relay(
        &self,
        relay: RelayId,
        action: RelayAction,
    ) -> impl Future<Output = Result<RelayActionResponse, SprinklerError>> + Send;

    /// `GET /api/status`: relays and routine execution.
    fn status(&self) -> impl Future<Output = Result<DeviceStatus, SprinklerError>> + Send;

    /// `GET /api/routines`: the stored collection; a non-array body is empty.
    fn routines(&self) -> impl Future<Output = Result<Vec<Routine>, SprinklerError>> + Send;

    /// `POST /api/routines`: replace the stored collection.
    fn save_routines(
        &self,
        payload: RoutinesPayload,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send;

    /// `GET /api/routine/control`: start, stop, or skip.
    fn control_routine(
        &self,
        command: RoutineCommand,
    ) -> impl Future<Output = Result<ControlResponse, SprinklerError>> + Send;

    /// `POST /api/ota`: stream a firmware image; the device reboots on success.
    fn upload_firmware(
        &self,
        target: FirmwareTarget,
        image: Vec<u8>,
        progress: ProgressFn,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send;
}

impl<T: DeviceApi + Send + Sync> DeviceApi for Arc<T> {
    fn relay(
        &self,
        relay: RelayId,
        action: RelayAction,
    ) -> impl Future<Output = Result<RelayActionResponse, SprinklerError>> + Send {
        (**self).relay(relay, action)
    }

    fn status(&self) -> impl Future<Output = Result<DeviceStatus, SprinklerError>> + Send {
        (**self).status()
    }

    fn routines(&self) -> impl Future<Output = Result<Vec<Routine>, SprinklerError>> + Send {
        (**self).routines()
    }

    fn save_routines(
        &self,
        payload: RoutinesPayload,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        (**self).save_routines(payload)
    }

    fn control_routine(
        &self,
        command: RoutineCommand,
    ) -> impl Future<Output = Result<ControlResponse, SprinklerError>> + Send {
        (**self).control_routine(command)
    }

    fn upload_firmware(
        &self,
        target: FirmwareTarget,
        image: Vec<u8>,
        progress: ProgressFn,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        (**self).upload_firmware(target, image, progress)
    }
}
