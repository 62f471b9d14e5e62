//! In-memory fakes of every port, shared by the service tests.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Mutex;

use chrono::TimeDelta;
use sprinkler_domain::error::{DeviceError, SprinklerError};
use sprinkler_domain::event::DashboardEvent;
use sprinkler_domain::firmware::{FirmwareTarget, UploadProgress};
use sprinkler_domain::notice::Notice;
use sprinkler_domain::relay::{RelayAction, RelayActionResponse, RelayId};
use sprinkler_domain::routine::Routine;
use sprinkler_domain::status::{ControlResponse, DeviceStatus, RoutineCommand};
use sprinkler_domain::time::{Timestamp, now};

use crate::ports::{
    Clock, Confirmation, DeviceApi, EventPublisher, LocalCache, ProgressFn, RoutinesPayload,
};

pub fn unreachable() -> SprinklerError {
    DeviceError::Unreachable(Box::new(std::io::Error::other("connection refused"))).into()
}

pub fn http_status(status: u16, message: &str) -> SprinklerError {
    DeviceError::Status {
        status,
        message: message.to_string(),
    }
    .into()
}

/// Scripted device. `None` replies fail as unreachable.
#[derive(Default)]
pub struct FakeDevice {
    pub relay_reply: Mutex<Option<RelayActionResponse>>,
    pub relay_calls: Mutex<Vec<(RelayId, RelayAction)>>,
    pub status_reply: Mutex<Option<DeviceStatus>>,
    pub status_calls: Mutex<usize>,
    pub routines_reply: Mutex<Option<Vec<Routine>>>,
    pub save_failure: Mutex<Option<u16>>,
    pub saved: Mutex<Vec<String>>,
    pub control_reply: Mutex<Option<ControlResponse>>,
    pub control_calls: Mutex<Vec<RoutineCommand>>,
    /// `Ok(())` accepts, `Err(Some(..))` answers with a status, `Err(None)` drops.
    pub upload_reply: Mutex<Option<Result<(), Option<(u16, String)>>>>,
    pub uploads: Mutex<Vec<(FirmwareTarget, usize)>>,
}

impl DeviceApi for FakeDevice {
    fn relay(
        &self,
        relay: RelayId,
        action: RelayAction,
    ) -> impl Future<Output = Result<RelayActionResponse, SprinklerError>> + Send {
        self.relay_calls.lock().unwrap().push((relay, action));
        let reply = *self.relay_reply.lock().unwrap();
        async move { reply.ok_or_else(unreachable) }
    }

    fn status(&self) -> impl Future<Output = Result<DeviceStatus, SprinklerError>> + Send {
        *self.status_calls.lock().unwrap() += 1;
        let reply = self.status_reply.lock().unwrap().clone();
        async move { reply.ok_or_else(unreachable) }
    }

    fn routines(&self) -> impl Future<Output = Result<Vec<Routine>, SprinklerError>> + Send {
        let reply = self.routines_reply.lock().unwrap().clone();
        async move { reply.ok_or_else(unreachable) }
    }

    fn save_routines(
        &self,
        payload: RoutinesPayload,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        let failure = *self.save_failure.lock().unwrap();
        if failure.is_none() {
            self.saved.lock().unwrap().push(payload.into_string());
        }
        async move {
            match failure {
                None => Ok(()),
                Some(status) => Err(http_status(status, "Internal Server Error")),
            }
        }
    }

    fn control_routine(
        &self,
        command: RoutineCommand,
    ) -> impl Future<Output = Result<ControlResponse, SprinklerError>> + Send {
        self.control_calls.lock().unwrap().push(command);
        let reply = *self.control_reply.lock().unwrap();
        async move { reply.ok_or_else(unreachable) }
    }

    fn upload_firmware(
        &self,
        target: FirmwareTarget,
        image: Vec<u8>,
        progress: ProgressFn,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        self.uploads.lock().unwrap().push((target, image.len()));
        let reply = self.upload_reply.lock().unwrap().clone();
        async move {
            let total = image.len() as u64;
            match reply {
                Some(Ok(())) => {
                    progress(UploadProgress { sent: total / 2, total });
                    progress(UploadProgress { sent: total, total });
                    Ok(())
                }
                Some(Err(Some((status, body)))) => Err(http_status(status, &body)),
                Some(Err(None)) | None => Err(unreachable()),
            }
        }
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<DashboardEvent>>,
}

impl RecordingPublisher {
    pub fn notices(&self) -> Vec<Notice> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                DashboardEvent::Notice(notice) => Some(notice.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_notice(&self) -> Option<Notice> {
        self.notices().pop()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(
        &self,
        event: DashboardEvent,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }
}

#[derive(Default)]
pub struct FakeCache {
    pub last_duration: Mutex<Option<u32>>,
    pub expiries: Mutex<BTreeMap<RelayId, Timestamp>>,
}

impl LocalCache for FakeCache {
    fn last_duration(&self) -> impl Future<Output = Result<Option<u32>, SprinklerError>> + Send {
        let value = *self.last_duration.lock().unwrap();
        async move { Ok(value) }
    }

    fn set_last_duration(
        &self,
        minutes: u32,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        *self.last_duration.lock().unwrap() = Some(minutes);
        async { Ok(()) }
    }

    fn expiries(
        &self,
    ) -> impl Future<Output = Result<Vec<(RelayId, Timestamp)>, SprinklerError>> + Send {
        let entries: Vec<_> = self
            .expiries
            .lock()
            .unwrap()
            .iter()
            .map(|(relay, at)| (*relay, *at))
            .collect();
        async move { Ok(entries) }
    }

    fn set_expiry(
        &self,
        relay: RelayId,
        expires_at: Timestamp,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        self.expiries.lock().unwrap().insert(relay, expires_at);
        async { Ok(()) }
    }

    fn clear_expiry(
        &self,
        relay: RelayId,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        self.expiries.lock().unwrap().remove(&relay);
        async { Ok(()) }
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    instant: Mutex<Timestamp>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            instant: Mutex::new(now()),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, delta: TimeDelta) {
        *self.instant.lock().unwrap() += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.instant.lock().unwrap()
    }
}

/// Confirmation that always gives the same answer and records prompts.
pub struct Answer {
    pub yes: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl Answer {
    pub fn yes() -> Self {
        Self {
            yes: true,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn no() -> Self {
        Self {
            yes: false,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl Confirmation for Answer {
    fn confirm(&self, prompt: &str) -> impl Future<Output = bool> + Send {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let yes = self.yes;
        async move { yes }
    }
}
