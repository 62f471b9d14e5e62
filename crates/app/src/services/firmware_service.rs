//! Firmware service — over-the-air updates.

use sprinkler_domain::error::{DeviceError, SprinklerError, ValidationError};
use sprinkler_domain::firmware::FirmwareTarget;
use sprinkler_domain::notice::Notice;

use crate::ports::{Confirmation, DeviceApi, EventPublisher, ProgressFn};

const NO_FILE: &str = "Please select a file first.";
const UPDATE_OK: &str = "Update successful! Rebooting...";
const CONNECTION_ERROR: &str = "Connection error during update.";

/// Outcome of an upload attempt that did not fail with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The device accepted the image and is rebooting.
    Flashed,
    /// The user declined the confirmation prompt.
    Cancelled,
}

pub struct FirmwareService<D, P> {
    device: D,
    publisher: P,
}

impl<D, P> FirmwareService<D, P>
where
    D: DeviceApi + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    pub fn new(device: D, publisher: P) -> Self {
        Self { device, publisher }
    }

    /// Confirmation text for flashing `target`.
    #[must_use]
    pub fn prompt(target: FirmwareTarget) -> String {
        format!("Are you sure you want to flash this {target} update? The device will reboot.")
    }

    /// Stream `image` to the device after the user confirms.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyFirmwareImage`] for an empty image, or
    /// the device error of a failed upload. Every failure is also published
    /// as an error notice.
    pub async fn upload(
        &self,
        target: FirmwareTarget,
        image: Vec<u8>,
        confirmation: &impl Confirmation,
        progress: ProgressFn,
    ) -> Result<UploadOutcome, SprinklerError> {
        if image.is_empty() {
            self.notify(Notice::error(NO_FILE)).await;
            return Err(ValidationError::EmptyFirmwareImage.into());
        }
        if !confirmation.confirm(&Self::prompt(target)).await {
            tracing::info!(%target, "firmware update cancelled");
            return Ok(UploadOutcome::Cancelled);
        }

        tracing::info!(%target, bytes = image.len(), "uploading firmware");
        match self.device.upload_firmware(target, image, progress).await {
            Ok(()) => {
                tracing::info!(%target, "firmware accepted, device rebooting");
                self.notify(Notice::success(UPDATE_OK)).await;
                Ok(UploadOutcome::Flashed)
            }
            Err(err) => {
                tracing::warn!(%target, error = %err, "firmware update failed");
                let message = match &err {
                    SprinklerError::Device(DeviceError::Status { message, .. }) => {
                        format!("Update failed: {message}")
                    }
                    _ => CONNECTION_ERROR.to_string(),
                };
                self.notify(Notice::error(message)).await;
                Err(err)
            }
        }
    }

    async fn notify(&self, notice: Notice) {
        if let Err(err) = self.publisher.publish(notice.into()).await {
            tracing::warn!(error = %err, "failed to publish dashboard event");
        }
    }
}
