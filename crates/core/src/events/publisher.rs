//! Event publication.
//!
//! Writers hand events to an [`EventPublisher`] after their unit of work has
//! committed. Publication never blocks and never fails the write: the caller
//! logs and moves on.

use tokio::sync::mpsc;
use tracing::warn;

use crate::events::error::EventError;
use crate::events::types::DomainEvent;

/// Sink for committed domain events.
#[cfg_attr(test, mockall::automock)]
pub trait EventPublisher: Send + Sync {
    /// Hands one event to the relay without waiting.
    fn publish(&self, event: DomainEvent) -> Result<(), EventError>;
}

/// Publisher backed by a bounded in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::Sender<DomainEvent>,
}

impl ChannelPublisher {
    /// Creates a publisher and the receiver the relay drains.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DomainEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl EventPublisher for ChannelPublisher {
    fn publish(&self, event: DomainEvent) -> Result<(), EventError> {
        self.sender.try_send(event).map_err(|err| match err {
            mpsc::error::TrySendError::Full(event) => EventError::ChannelFull {
                topic: base_topic(&event),
            },
            mpsc::error::TrySendError::Closed(event) => EventError::ChannelClosed {
                topic: base_topic(&event),
            },
        })
    }
}

/// Publisher that drops everything. Used when no relay is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: DomainEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// Publishes each event, logging failures instead of returning them.
pub fn publish_all(publisher: &dyn EventPublisher, events: impl IntoIterator<Item = DomainEvent>) {
    for event in events {
        let topic = base_topic(&event);
        if let Err(err) = publisher.publish(event) {
            warn!(topic = %topic, code = err.error_code(), error = %err, "Domain event dropped");
        }
    }
}

fn base_topic(event: &DomainEvent) -> String {
    format!("{}.{}", event.entity().kind, event.action())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::{EntityKind, EntityRef};
    use coopledger_shared::types::{BranchId, OrganizationId, Tenant};
    use uuid::Uuid;

    fn event() -> DomainEvent {
        DomainEvent::Created(EntityRef::new(
            EntityKind::GeneralLedger,
            Uuid::new_v4(),
            Tenant::new(OrganizationId::new(), BranchId::new()),
            None,
        ))
    }

    #[tokio::test]
    async fn test_channel_delivers_in_order() {
        let (publisher, mut receiver) = ChannelPublisher::channel(4);
        let first = event();
        let second = event();

        publisher.publish(first.clone()).unwrap();
        publisher.publish(second.clone()).unwrap();

        assert_eq!(receiver.recv().await, Some(first));
        assert_eq!(receiver.recv().await, Some(second));
    }

    #[test]
    fn test_full_channel_reports_topic() {
        let (publisher, _receiver) = ChannelPublisher::channel(1);
        publisher.publish(event()).unwrap();

        let err = publisher.publish(event()).unwrap_err();
        assert_eq!(
            err,
            EventError::ChannelFull {
                topic: "general_ledger.create".into()
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_closed_channel() {
        let (publisher, receiver) = ChannelPublisher::channel(1);
        drop(receiver);
        assert!(matches!(
            publisher.publish(event()),
            Err(EventError::ChannelClosed { .. })
        ));
    }

    #[test]
    fn test_publish_all_keeps_going_after_failure() {
        let mut mock = MockEventPublisher::new();
        let mut calls = 0;
        mock.expect_publish().times(3).returning(move |_| {
            calls += 1;
            if calls == 2 {
                Err(EventError::ChannelFull { topic: "x".into() })
            } else {
                Ok(())
            }
        });

        publish_all(&mock, vec![event(), event(), event()]);
    }
}
