//! Application services — use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod firmware_service;
pub mod routine_store;
pub mod status_tracker;

pub use firmware_service::{FirmwareService, UploadOutcome};
pub use routine_store::RoutineStore;
pub use status_tracker::StatusTracker;
