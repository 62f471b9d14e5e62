//! # sprinkler-adapter-http-reqwest
//!
//! HTTP adapter built on [reqwest](https://docs.rs/reqwest).
//!
//! ## Responsibilities
//! - Implement the `DeviceApi` port defined in `sprinkler-app::ports::device`
//!   against the controller's endpoints:
//!   - `GET /api/relay`, `GET /api/status`
//!   - `GET`/`POST /api/routines`, `GET /api/routine/control`
//!   - `POST /api/ota` (streamed raw image)
//! - Map transport failures, status codes, and malformed bodies into
//!   `DeviceError`s
//!
//! ## Dependency rule
//! Depends on `sprinkler-app` (for port traits) and `sprinkler-domain` (for
//! wire types). Never leaks reqwest types into the domain.

mod config;
mod device;
mod error;

pub use config::DeviceConfig;
pub use device::HttpDevice;
pub use error::HttpError;
