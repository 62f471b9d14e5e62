//! Relay board — per-relay display state merged from device responses.
//!
//! The board keeps the last authoritative reading of every relay and a cache
//! of expiry instants for timed activations. Remaining time is never stored:
//! it is recomputed from `expiry - now` every time a view is produced, so a
//! countdown cannot drift from the deadline it was derived from.
//!
//! Every mutation returns the [`ExpiryChange`]s it made so that callers can
//! mirror the cache into persistent storage.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::relay::{RELAY_COUNT, RelayActionResponse, RelayId, RelayMode, RelayState, RelayStatus};
use crate::time::{Timestamp, after_seconds, whole_seconds_until};

/// A change made to the expiry cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryChange {
    Set(RelayId, Timestamp),
    Cleared(RelayId),
}

#[derive(Debug, Clone, Copy, Default)]
struct Reading {
    state: RelayState,
    mode: RelayMode,
}

impl Reading {
    fn is_timed_on(self) -> bool {
        self.state.is_on() && self.mode == RelayMode::Timed
    }
}

/// What the UI shows for one relay at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayView {
    pub relay: RelayId,
    pub is_on: bool,
    pub mode: RelayMode,
    /// Present only while the relay is on, timed, and has time left.
    pub remaining_seconds: Option<u32>,
}

impl RelayView {
    /// Remaining time as `m:ss`.
    #[must_use]
    pub fn countdown(&self) -> Option<String> {
        self.remaining_seconds.map(format_countdown)
    }
}

impl fmt::Display for RelayView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_on {
            return f.write_str("OFF");
        }
        f.write_str("ON")?;
        if let Some(countdown) = self.countdown() {
            write!(f, " ({countdown})")?;
        }
        Ok(())
    }
}

/// Format a number of seconds as `m:ss`.
#[must_use]
pub fn format_countdown(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Display state of all relays plus the cached timed-mode expiries.
#[derive(Debug, Clone, Default)]
pub struct RelayBoard {
    readings: [Reading; RELAY_COUNT as usize],
    expiries: BTreeMap<RelayId, Timestamp>,
}

impl RelayBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the expiry cache from persisted entries.
    ///
    /// Readings start as off; the first poll decides which entries are live.
    #[must_use]
    pub fn restore(expiries: impl IntoIterator<Item = (RelayId, Timestamp)>) -> Self {
        Self {
            readings: Default::default(),
            expiries: expiries.into_iter().collect(),
        }
    }

    /// Merge a successful relay action response.
    pub fn apply_action(
        &mut self,
        relay: RelayId,
        response: &RelayActionResponse,
        now: Timestamp,
    ) -> Option<ExpiryChange> {
        self.record(
            relay,
            Reading {
                state: response.state,
                mode: response.mode,
            },
            response.remaining_seconds,
            now,
        )
    }

    /// Merge the relay section of a status poll, overwriting local state.
    pub fn apply_status(&mut self, relays: &[RelayStatus], now: Timestamp) -> Vec<ExpiryChange> {
        relays
            .iter()
            .filter_map(|status| {
                self.record(
                    status.id,
                    Reading {
                        state: status.state,
                        mode: status.mode,
                    },
                    status.remaining_seconds,
                    now,
                )
            })
            .collect()
    }

    fn record(
        &mut self,
        relay: RelayId,
        reading: Reading,
        remaining_seconds: u32,
        now: Timestamp,
    ) -> Option<ExpiryChange> {
        self.readings[relay.index()] = reading;

        if reading.is_timed_on() && remaining_seconds > 0 {
            let expires_at = after_seconds(now, remaining_seconds);
            self.expiries.insert(relay, expires_at);
            return Some(ExpiryChange::Set(relay, expires_at));
        }

        self.expiries
            .remove(&relay)
            .map(|_| ExpiryChange::Cleared(relay))
    }

    /// Local countdown tick: drop expiries of timed relays that ran out.
    ///
    /// Performs no reconciliation; the relay keeps its last reported
    /// state until the next poll says otherwise.
    pub fn tick(&mut self, now: Timestamp) -> Vec<ExpiryChange> {
        let elapsed: Vec<RelayId> = self
            .expiries
            .iter()
            .filter(|(relay, expires_at)| {
                self.readings[relay.index()].is_timed_on()
                    && whole_seconds_until(**expires_at, now) == 0
            })
            .map(|(relay, _)| *relay)
            .collect();

        for relay in &elapsed {
            self.expiries.remove(relay);
        }

        elapsed.into_iter().map(ExpiryChange::Cleared).collect()
    }

    /// Relays currently showing a live countdown.
    pub fn counting_down(&self) -> impl Iterator<Item = RelayId> + '_ {
        self.expiries
            .keys()
            .copied()
            .filter(|relay| self.readings[relay.index()].is_timed_on())
    }

    #[must_use]
    pub fn expiry(&self, relay: RelayId) -> Option<Timestamp> {
        self.expiries.get(&relay).copied()
    }

    #[must_use]
    pub fn view(&self, relay: RelayId, now: Timestamp) -> RelayView {
        let reading = self.readings[relay.index()];
        let remaining_seconds = if reading.is_timed_on() {
            self.expiries
                .get(&relay)
                .map(|expires_at| whole_seconds_until(*expires_at, now))
                .filter(|seconds| *seconds > 0)
        } else {
            None
        };

        RelayView {
            relay,
            is_on: reading.state.is_on(),
            mode: reading.mode,
            remaining_seconds,
        }
    }

    #[must_use]
    pub fn views(&self, now: Timestamp) -> Vec<RelayView> {
        RelayId::all().map(|relay| self.view(relay, now)).collect()
    }
}
