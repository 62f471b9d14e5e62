//! In-process event bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use sprinkler_domain::error::SprinklerError;
use sprinkler_domain::event::DashboardEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
pub struct InProcessEventBus {
    sender: broadcast::Sender<DashboardEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(
        &self,
        event: DashboardEvent,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        // send only fails without receivers
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprinkler_domain::notice::Notice;

    #[tokio::test]
    async fn should_deliver_event_to_subscriber() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(Notice::success("Routines saved").into())
            .await
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(
            received,
            DashboardEvent::Notice(Notice::success("Routines saved"))
        );
    }

    #[tokio::test]
    async fn should_deliver_event_to_multiple_subscribers() {
        let bus = InProcessEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(DashboardEvent::RoutinesChanged { count: 2 })
            .await
            .unwrap();

        assert_eq!(
            rx1.recv().await.unwrap(),
            DashboardEvent::RoutinesChanged { count: 2 }
        );
        assert_eq!(
            rx2.recv().await.unwrap(),
            DashboardEvent::RoutinesChanged { count: 2 }
        );
    }

    #[tokio::test]
    async fn should_succeed_when_no_subscribers() {
        let bus = InProcessEventBus::new(16);
        let result = bus.publish(Notice::error("nobody listens").into()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn should_not_deliver_events_published_before_subscription() {
        let bus = InProcessEventBus::new(16);
        bus.publish(DashboardEvent::RoutinesChanged { count: 1 })
            .await
            .unwrap();

        let mut rx = bus.subscribe();
        bus.publish(DashboardEvent::RoutinesChanged { count: 3 })
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            DashboardEvent::RoutinesChanged { count: 3 }
        );
    }
}
