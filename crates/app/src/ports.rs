//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod clock;
pub mod confirm;
pub mod device;
pub mod event_bus;
pub mod local_cache;

pub use clock::{Clock, SystemClock};
pub use confirm::Confirmation;
pub use device::{DeviceApi, ProgressFn, ROUTINES_PAYLOAD_LIMIT, RoutinesPayload};
pub use event_bus::EventPublisher;
pub use local_cache::LocalCache;
