//! Status tracker — relay actions, status polls, and the local countdown.
//!
//! The device decides relay state and routine execution; the tracker only
//! merges what it reports into a [`RelayBoard`] and a [`RoutineActivity`],
//! extrapolates timed countdowns between polls, and mirrors expiries into the
//! [`LocalCache`] so they survive a restart.

use sprinkler_domain::error::{DeviceError, SprinklerError};
use sprinkler_domain::event::{DashboardEvent, ExecutionView};
use sprinkler_domain::execution::{ActivityChange, RoutineActivity};
use sprinkler_domain::notice::Notice;
use sprinkler_domain::relay::{ExpiryChange, RelayAction, RelayBoard, RelayId, RelayView};
use sprinkler_domain::routine::Routine;
use sprinkler_domain::status::RoutineCommand;

use crate::ports::{Clock, DeviceApi, EventPublisher, LocalCache};

/// Timer duration offered before the user ever picked one, in minutes.
pub const DEFAULT_TIMER_MINUTES: u32 = 10;

const RELAY_FAILURE: &str = "Failed to control relay. Please try again.";
const INVALID_DURATION: &str = "Please enter a valid duration in minutes.";
const ROUTINE_COMPLETED: &str = "Routine completed!";
const START_FAILURE: &str = "Failed to start routine";

pub struct StatusTracker<D, C, P, K> {
    device: D,
    cache: C,
    publisher: P,
    clock: K,
    board: RelayBoard,
    activity: RoutineActivity,
    last_duration: u32,
}

impl<D, C, P, K> StatusTracker<D, C, P, K>
where
    D: DeviceApi + Send + Sync,
    C: LocalCache + Send + Sync,
    P: EventPublisher + Send + Sync,
    K: Clock + Send + Sync,
{
    pub fn new(device: D, cache: C, publisher: P, clock: K) -> Self {
        Self {
            device,
            cache,
            publisher,
            clock,
            board: RelayBoard::new(),
            activity: RoutineActivity::new(),
            last_duration: DEFAULT_TIMER_MINUTES,
        }
    }

    /// Seed the board and the timer default from the local cache.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the cache cannot be read.
    pub async fn restore(&mut self) -> Result<(), SprinklerError> {
        let expiries = self.cache.expiries().await?;
        tracing::debug!(count = expiries.len(), "restored relay expiries");
        self.board = RelayBoard::restore(expiries);
        if let Some(minutes) = self.cache.last_duration().await?.filter(|m| *m > 0) {
            self.last_duration = minutes;
        }
        Ok(())
    }

    /// Timer duration to offer next, in minutes.
    #[must_use]
    pub fn last_duration(&self) -> u32 {
        self.last_duration
    }

    #[must_use]
    pub fn views(&self) -> Vec<RelayView> {
        self.board.views(self.clock.now())
    }

    #[must_use]
    pub fn activity(&self) -> &RoutineActivity {
        &self.activity
    }

    /// Switch a relay on, off, or toggle it.
    ///
    /// # Errors
    ///
    /// Returns the device error when the request failed or was rejected.
    /// Either way an error notice has been published.
    pub async fn switch_relay(
        &mut self,
        relay: RelayId,
        action: RelayAction,
    ) -> Result<RelayView, SprinklerError> {
        self.send_relay(relay, action).await
    }

    /// Turn a relay on for `minutes` minutes.
    ///
    /// Non-positive durations are rejected before any request is made.
    /// Accepted durations become the new default.
    ///
    /// # Errors
    ///
    /// Returns a validation error for non-positive durations, or the device error.
    pub async fn timed_relay(
        &mut self,
        relay: RelayId,
        minutes: i64,
    ) -> Result<RelayView, SprinklerError> {
        let action = match RelayAction::timed_minutes(minutes) {
            Ok(action) => action,
            Err(err) => {
                self.publish(Notice::error(INVALID_DURATION).into()).await;
                return Err(err.into());
            }
        };

        let remembered = u32::try_from(minutes).unwrap_or(u32::MAX);
        self.last_duration = remembered;
        if let Err(err) = self.cache.set_last_duration(remembered).await {
            tracing::warn!(error = %err, "failed to remember timer duration");
        }

        self.send_relay(relay, action).await
    }

    async fn send_relay(
        &mut self,
        relay: RelayId,
        action: RelayAction,
    ) -> Result<RelayView, SprinklerError> {
        tracing::debug!(%relay, %action, "relay action");
        let response = match self.device.relay(relay, action).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(%relay, %action, error = %err, "relay action failed");
                self.publish(Notice::error(RELAY_FAILURE).into()).await;
                return Err(err);
            }
        };

        if !response.success {
            tracing::warn!(%relay, %action, "device rejected relay action");
            let message = format!("Relay {relay} rejected the {action} command");
            self.publish(Notice::error(message).into()).await;
            return Err(DeviceError::Rejected {
                operation: "relay action",
            }
            .into());
        }

        let now = self.clock.now();
        if let Some(change) = self.board.apply_action(relay, &response, now) {
            self.persist(change).await;
        }
        tracing::info!(%relay, state = ?response.state, mode = %response.mode, "relay updated");
        self.publish_relays().await;
        Ok(self.board.view(relay, now))
    }

    /// Fetch the device status and overwrite local state with it.
    ///
    /// `routines` is the local collection used to locate the running routine.
    ///
    /// # Errors
    ///
    /// Returns the device error; local state is untouched in that case.
    pub async fn poll(&mut self, routines: &[Routine]) -> Result<(), SprinklerError> {
        let status = self.device.status().await.inspect_err(|err| {
            tracing::warn!(error = %err, "status poll failed");
        })?;

        let now = self.clock.now();
        for change in self.board.apply_status(&status.relays, now) {
            self.persist(change).await;
        }

        if let Some(ActivityChange::Completed { name }) =
            self.activity.observe(status.routine.as_ref(), routines)
        {
            tracing::info!(routine = %name, "routine completed");
            self.publish(Notice::success(ROUTINE_COMPLETED).into()).await;
        }

        self.publish_relays().await;
        self.publish(DashboardEvent::Execution(self.execution_view())).await;
        Ok(())
    }

    /// Advance local countdowns without touching the network.
    ///
    /// Elapsed expiries are dropped; on/off and mode stay as last reported.
    pub async fn tick(&mut self) {
        let changes = self.board.tick(self.clock.now());
        let counting = self.board.counting_down().next().is_some();
        for change in &changes {
            self.persist(*change).await;
        }
        if counting || !changes.is_empty() {
            self.publish_relays().await;
        }
    }

    /// Start, stop, or skip a routine, then refresh the status.
    ///
    /// # Errors
    ///
    /// Returns the control request's device error, or the poll error.
    pub async fn control_routine(
        &mut self,
        command: RoutineCommand,
        routines: &[Routine],
    ) -> Result<(), SprinklerError> {
        tracing::debug!(action = command.as_str(), index = ?command.index(), "routine control");
        match self.device.control_routine(command).await {
            Ok(response) if response.success => {}
            Ok(_) => {
                tracing::warn!(action = command.as_str(), "device refused routine command");
                if matches!(command, RoutineCommand::Start(_)) {
                    // the device left nothing to refresh
                    return Ok(());
                }
            }
            Err(err) => {
                tracing::warn!(action = command.as_str(), error = %err, "routine control failed");
                if matches!(command, RoutineCommand::Start(_)) {
                    self.publish(Notice::error(START_FAILURE).into()).await;
                }
                return Err(err);
            }
        }
        self.poll(routines).await
    }

    #[must_use]
    pub fn execution_view(&self) -> ExecutionView {
        ExecutionView {
            running: self.activity.is_running(),
            active_index: self.activity.active_index(),
            snapshot: self.activity.running_snapshot().cloned(),
        }
    }

    async fn persist(&self, change: ExpiryChange) {
        let result = match change {
            ExpiryChange::Set(relay, expires_at) => self.cache.set_expiry(relay, expires_at).await,
            ExpiryChange::Cleared(relay) => self.cache.clear_expiry(relay).await,
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, ?change, "failed to mirror relay expiry");
        }
    }

    async fn publish_relays(&self) {
        self.publish(DashboardEvent::Relays {
            relays: self.views(),
        })
        .await;
    }

    async fn publish(&self, event: DashboardEvent) {
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(error = %err, "failed to publish dashboard event");
        }
    }
}
