//! # sprinkler-domain
//!
//! Pure domain model for the sprinkler control panel.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - Define **Routines** (named, ordered sequences of timed station activations)
//!   and the step-editing operations that keep their `order` ranks consistent
//! - Define **Relays** (the four controllable outputs) and the relay board that
//!   reconciles device responses with locally extrapolated countdowns
//! - Define **Execution** snapshots reported by the device and the routine
//!   activity tracking derived from them
//! - Define **Notices** and dashboard **Events**
//! - Define **Firmware** upload targets and progress
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod event;
pub mod execution;
pub mod firmware;
pub mod notice;
pub mod relay;
pub mod routine;
pub mod status;
