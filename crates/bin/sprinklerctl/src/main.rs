//! # sprinklerctl — sprinkler controller panel
//!
//! Composition root that wires the adapters together and drives the
//! controller from the terminal.
//!
//! ## Responsibilities
//! - Parse configuration (CLI args, env vars, config file)
//! - Initialize logging
//! - Construct the HTTP device client and the `SQLite` local cache
//! - Construct application services, injecting adapters via port traits
//! - Dispatch the requested command and print published notices
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod cli;
mod config;
mod editor;
mod prompt;
mod ui;
mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing_subscriber::EnvFilter;

use sprinkler_adapter_http_reqwest::HttpDevice;
use sprinkler_adapter_storage_sqlite_sqlx::SqliteLocalCache;
use sprinkler_app::event_bus::InProcessEventBus;
use sprinkler_app::poller::StatusPoller;
use sprinkler_app::ports::{ProgressFn, SystemClock};
use sprinkler_app::services::{FirmwareService, RoutineStore, StatusTracker, UploadOutcome};
use sprinkler_domain::event::DashboardEvent;
use sprinkler_domain::firmware::{FirmwareTarget, UploadProgress};
use sprinkler_domain::relay::RelayId;
use sprinkler_domain::status::RoutineCommand;

use crate::cli::{Cli, Command, RoutineControl, RoutinesCommand, Switch};
use crate::config::Config;
use crate::prompt::{TerminalConfirmation, TerminalInput};
use crate::ui::reorder::Flip;

type Device = Arc<HttpDevice>;
type Bus = Arc<InProcessEventBus>;
type Tracker = StatusTracker<Device, SqliteLocalCache, Bus, SystemClock>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.device {
        config.device.base_url = url;
        config.validate()?;
    }
    init_tracing(&config.logging.filter);

    // Adapters
    let device = Arc::new(HttpDevice::new(config.device_config())?);
    tracing::debug!(base_url = device.base_url(), "controller client ready");

    // Event bus
    let bus = Arc::new(InProcessEventBus::new(256));
    let mut notices = bus.subscribe();

    let panel = Panel {
        input: TerminalInput::stdin().context("failed to read from stdin")?,
        assume_yes: cli.yes,
        config,
        device,
        bus,
    };
    let result = panel.dispatch(cli.command, &mut notices).await;
    print_notices(&mut notices);
    result
}

fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

fn print_notices(events: &mut broadcast::Receiver<DashboardEvent>) {
    for notice in ui::pending_notices(events) {
        println!("{notice}");
    }
}

struct Panel {
    config: Config,
    device: Device,
    bus: Bus,
    input: TerminalInput,
    assume_yes: bool,
}

impl Panel {
    async fn dispatch(
        &self,
        command: Command,
        notices: &mut broadcast::Receiver<DashboardEvent>,
    ) -> anyhow::Result<()> {
        match command {
            Command::Status => self.status().await,
            Command::Watch => {
                let result = self.watch().await;
                // the dashboard already printed everything published so far
                *notices = notices.resubscribe();
                result
            }
            Command::Relay { id, action } => self.relay(id, action).await,
            Command::Timer { id, minutes } => self.timer(id, minutes).await,
            Command::Routines {
                command: RoutinesCommand::List,
            } => self.list_routines().await,
            Command::Routines {
                command: RoutinesCommand::Edit,
            } => self.edit_routines(notices).await,
            Command::Routine { command } => self.control_routine(command).await,
            Command::Ota { file, target } => self.flash(&file, target).await,
        }
    }

    fn store(&self) -> RoutineStore<Device, Bus> {
        RoutineStore::new(Arc::clone(&self.device), Arc::clone(&self.bus))
    }

    fn confirmation(&self) -> TerminalConfirmation {
        TerminalConfirmation::new(self.input.clone(), self.assume_yes)
    }

    /// Tracker seeded from the local cache.
    async fn tracker(&self) -> anyhow::Result<Tracker> {
        let db = sprinkler_adapter_storage_sqlite_sqlx::Config {
            database_url: self.config.cache_url().to_string(),
        }
        .build()
        .await
        .context("failed to open local cache")?;
        let cache = SqliteLocalCache::new(db.pool().clone());

        let mut tracker = StatusTracker::new(
            Arc::clone(&self.device),
            cache,
            Arc::clone(&self.bus),
            SystemClock,
        );
        tracker.restore().await?;
        Ok(tracker)
    }

    async fn status(&self) -> anyhow::Result<()> {
        let mut store = self.store();
        // a failed load is reported as a notice; relays can still be shown
        let _ = store.load().await;
        let mut tracker = self.tracker().await?;
        tracker.poll(store.routines()).await?;

        println!(
            "{}",
            ui::relay_line(&tracker.views(), &self.config.station_names())
        );
        for line in ui::execution_lines(&tracker.execution_view()) {
            println!("{line}");
        }
        Ok(())
    }

    async fn watch(&self) -> anyhow::Result<()> {
        let events = BroadcastStream::new(self.bus.subscribe());
        let mut store = self.store();
        let _ = store.load().await;
        let tracker = self.tracker().await?;
        let poller = StatusPoller::new(store, tracker, self.config.poller_settings());

        watch::run(poller, events, &self.input, self.config.station_names()).await
    }

    async fn relay(&self, id: u8, switch: Switch) -> anyhow::Result<()> {
        let relay = station(id)?;
        let mut tracker = self.tracker().await?;
        let view = tracker.switch_relay(relay, switch.into()).await?;
        println!("{}: {view}", self.config.station_name(relay));
        Ok(())
    }

    async fn timer(&self, id: u8, minutes: Option<i64>) -> anyhow::Result<()> {
        let relay = station(id)?;
        let mut tracker = self.tracker().await?;
        let minutes = minutes.unwrap_or_else(|| i64::from(tracker.last_duration()));
        let view = tracker.timed_relay(relay, minutes).await?;
        println!("{}: {view}", self.config.station_name(relay));
        Ok(())
    }

    async fn list_routines(&self) -> anyhow::Result<()> {
        let mut store = self.store();
        store.load().await?;

        let mut tracker = self.tracker().await?;
        let active = match tracker.poll(store.routines()).await {
            Ok(()) => tracker.execution_view().active_index,
            Err(err) => {
                tracing::debug!(error = %err, "listing without execution status");
                None
            }
        };
        print!("{}", ui::routine_list(store.routines(), None, active));
        for routine in store.routines() {
            print!("\n{}", ui::routine_detail(routine, &Flip::default()));
        }
        Ok(())
    }

    async fn edit_routines(
        &self,
        notices: &mut broadcast::Receiver<DashboardEvent>,
    ) -> anyhow::Result<()> {
        let mut store = self.store();
        // an empty list is still editable after a failed load
        let _ = store.load().await;
        print_notices(notices);

        let editor = editor::Editor::new(store, self.config.station_names());
        editor::run(editor, &self.input, &self.confirmation(), notices).await
    }

    async fn control_routine(&self, control: RoutineControl) -> anyhow::Result<()> {
        let command = match control {
            RoutineControl::Start { position } => RoutineCommand::Start(
                position
                    .checked_sub(1)
                    .context("routine positions start at 1")?,
            ),
            RoutineControl::Stop => RoutineCommand::Stop,
            RoutineControl::Skip => RoutineCommand::Skip,
        };

        let mut store = self.store();
        // names are only needed to mark the running routine
        let _ = store.load().await;
        let mut tracker = self.tracker().await?;
        tracker.control_routine(command, store.routines()).await?;

        for line in ui::execution_lines(&tracker.execution_view()) {
            println!("{line}");
        }
        Ok(())
    }

    async fn flash(&self, file: &Path, target: FirmwareTarget) -> anyhow::Result<()> {
        let image = tokio::fs::read(file)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?;

        let service = FirmwareService::new(Arc::clone(&self.device), Arc::clone(&self.bus));
        let progress: ProgressFn = Arc::new(|progress: UploadProgress| {
            eprint!("\rUploading... {:>3}%", progress.percent());
        });
        let outcome = service
            .upload(target, image, &self.confirmation(), progress)
            .await;
        eprintln!();

        if outcome? == UploadOutcome::Cancelled {
            println!("Update cancelled");
        }
        Ok(())
    }
}

/// Relay from a 1-based station number.
fn station(number: u8) -> anyhow::Result<RelayId> {
    let index = number
        .checked_sub(1)
        .context("station numbers start at 1")?;
    Ok(RelayId::new(index)?)
}
