//! Event bus port — publish/subscribe for dashboard events.

use std::future::Future;

use sprinkler_domain::error::SprinklerError;
use sprinkler_domain::event::DashboardEvent;

/// Publishes dashboard events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(
        &self,
        event: DashboardEvent,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: DashboardEvent,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        (**self).publish(event)
    }
}
