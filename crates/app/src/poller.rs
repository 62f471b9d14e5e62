//! Status poller — the single task that owns live dashboard state.
//!
//! One loop multiplexes the coarse status poll, the fine countdown tick, and
//! user commands. Handlers run to completion one at a time, so the routine
//! collection, the relay board, and the routine activity need no locking. A
//! slow request delays the next tick instead of racing it.
//!
//! The loop ends when every [`mpsc::Sender`] of its command channel is gone.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};

use sprinkler_domain::relay::{RelayAction, RelayId};
use sprinkler_domain::status::RoutineCommand;

use crate::ports::{Clock, DeviceApi, EventPublisher, LocalCache};
use crate::services::{RoutineStore, StatusTracker};

/// Something the user asked the dashboard to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerCommand {
    Relay { relay: RelayId, action: RelayAction },
    Timer { relay: RelayId, minutes: i64 },
    Routine(RoutineCommand),
    ReloadRoutines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub status_interval: Duration,
    pub countdown_interval: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            status_interval: Duration::from_secs(10),
            countdown_interval: Duration::from_secs(1),
        }
    }
}

pub struct StatusPoller<D, C, P, K> {
    store: RoutineStore<D, P>,
    tracker: StatusTracker<D, C, P, K>,
    settings: PollerSettings,
}

impl<D, C, P, K> StatusPoller<D, C, P, K>
where
    D: DeviceApi + Send + Sync,
    C: LocalCache + Send + Sync,
    P: EventPublisher + Send + Sync,
    K: Clock + Send + Sync,
{
    pub fn new(
        store: RoutineStore<D, P>,
        tracker: StatusTracker<D, C, P, K>,
        settings: PollerSettings,
    ) -> Self {
        Self {
            store,
            tracker,
            settings,
        }
    }

    #[must_use]
    pub fn store(&self) -> &RoutineStore<D, P> {
        &self.store
    }

    #[must_use]
    pub fn tracker(&self) -> &StatusTracker<D, C, P, K> {
        &self.tracker
    }

    /// Run until the command channel closes, then hand the state back.
    ///
    /// The first status poll and countdown tick happen immediately.
    pub async fn run(mut self, mut commands: mpsc::Receiver<PollerCommand>) -> Self {
        let mut status = interval(self.settings.status_interval);
        status.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut countdown = interval(self.settings.countdown_interval);
        countdown.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            status_secs = self.settings.status_interval.as_secs_f64(),
            countdown_secs = self.settings.countdown_interval.as_secs_f64(),
            "status poller started"
        );

        loop {
            tokio::select! {
                biased;

                _ = status.tick() => {
                    // failures are logged by the tracker; the next tick retries
                    let _ = self.tracker.poll(self.store.routines()).await;
                }
                _ = countdown.tick() => {
                    self.tracker.tick().await;
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
            }
        }

        tracing::info!("status poller stopped");
        self
    }

    async fn handle(&mut self, command: PollerCommand) {
        tracing::debug!(?command, "dashboard command");
        let result = match command {
            PollerCommand::Relay { relay, action } => {
                self.tracker.switch_relay(relay, action).await.map(|_| ())
            }
            PollerCommand::Timer { relay, minutes } => {
                self.tracker.timed_relay(relay, minutes).await.map(|_| ())
            }
            PollerCommand::Routine(command) => {
                self.tracker
                    .control_routine(command, self.store.routines())
                    .await
            }
            PollerCommand::ReloadRoutines => self.store.load().await,
        };
        if let Err(err) = result {
            tracing::debug!(?command, error = %err, "dashboard command failed");
        }
    }
}
