//! Local cache port — non-authoritative state that survives restarts.
//!
//! The device stays the source of truth; the cache only lets a restarted
//! panel keep the last timer duration and resume countdowns until the next
//! poll overwrites them.

use std::future::Future;

use sprinkler_domain::error::SprinklerError;
use sprinkler_domain::relay::RelayId;
use sprinkler_domain::time::Timestamp;

pub trait LocalCache {
    /// Last duration used for a timed activation, in minutes.
    fn last_duration(&self) -> impl Future<Output = Result<Option<u32>, SprinklerError>> + Send;

    fn set_last_duration(
        &self,
        minutes: u32,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send;

    /// Every cached timed-mode expiry.
    fn expiries(
        &self,
    ) -> impl Future<Output = Result<Vec<(RelayId, Timestamp)>, SprinklerError>> + Send;

    fn set_expiry(
        &self,
        relay: RelayId,
        expires_at: Timestamp,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send;

    /// Remove the expiry of `relay`; removing a missing entry is not an error.
    fn clear_expiry(&self, relay: RelayId)
    -> impl Future<Output = Result<(), SprinklerError>> + Send;
}

impl<T: LocalCache + Send + Sync> LocalCache for std::sync::Arc<T> {
    fn last_duration(&self) -> impl Future<Output = Result<Option<u32>, SprinklerError>> + Send {
        (**self).last_duration()
    }

    fn set_last_duration(
        &self,
        minutes: u32,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        (**self).set_last_duration(minutes)
    }

    fn expiries(
        &self,
    ) -> impl Future<Output = Result<Vec<(RelayId, Timestamp)>, SprinklerError>> + Send {
        (**self).expiries()
    }

    fn set_expiry(
        &self,
        relay: RelayId,
        expires_at: Timestamp,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        (**self).set_expiry(relay, expires_at)
    }

    fn clear_expiry(
        &self,
        relay: RelayId,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        (**self).clear_expiry(relay)
    }
}
