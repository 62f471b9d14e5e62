//! # sprinkler-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceApi` — the controller's HTTP contract
//!   - `LocalCache` — last timer duration and relay expiries across restarts
//!   - `EventPublisher` — dashboard events
//!   - `Confirmation` — yes/no prompts before destructive actions
//!   - `Clock` — the current instant
//! - Define **driving/inbound ports** as use-case structs:
//!   - `RoutineStore` — load, edit, and save the routine collection
//!   - `StatusTracker` — relay actions, status polls, countdown ticks, routine control
//!   - `FirmwareService` — over-the-air updates
//!   - `StatusPoller` — the event loop multiplexing polls, ticks, and commands
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `sprinkler-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod poller;
pub mod ports;
pub mod services;

#[cfg(test)]
mod testing;
