//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{ActionEvent, ErrorEvent, LifecycleEvent, TelemetryEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Enable/disable and start/stop transitions
    Lifecycle,
    /// Placements, detonations and plan refreshes
    Action,
    /// Throughput reports
    Telemetry,
    /// Cycle faults
    Error,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Lifecycle(LifecycleEvent),
    Action(ActionEvent),
    Telemetry(TelemetryEvent),
    Error(ErrorEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Lifecycle(_) => Topic::Lifecycle,
            Event::Action(_) => Topic::Action,
            Event::Telemetry(_) => Topic::Telemetry,
            Event::Error(_) => Topic::Error,
        }
    }
}

impl From<LifecycleEvent> for Event {
    fn from(event: LifecycleEvent) -> Self {
        Event::Lifecycle(event)
    }
}

impl From<ActionEvent> for Event {
    fn from(event: ActionEvent) -> Self {
        Event::Action(event)
    }
}

impl From<TelemetryEvent> for Event {
    fn from(event: TelemetryEvent) -> Self {
        Event::Telemetry(event)
    }
}

impl From<ErrorEvent> for Event {
    fn from(event: ErrorEvent) -> Self {
        Event::Error(event)
    }
}

struct Channels {
    lifecycle: broadcast::Sender<Event>,
    action: broadcast::Sender<Event>,
    telemetry: broadcast::Sender<Event>,
    error: broadcast::Sender<Event>,
}

impl Channels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Lifecycle => &self.lifecycle,
            Topic::Action => &self.action,
            Topic::Telemetry => &self.telemetry,
            Topic::Error => &self.error,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                lifecycle: broadcast::channel(capacity).0,
                action: broadcast::channel(capacity).0,
                telemetry: broadcast::channel(capacity).0,
                error: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();

        if self.channels.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StopReason;

    #[test]
    fn events_reach_only_their_topic() {
        let bus = EventBus::with_capacity(4);
        let mut lifecycle = bus.subscribe(Topic::Lifecycle);
        let mut errors = bus.subscribe(Topic::Error);

        bus.publish(LifecycleEvent::Stopped {
            reason: StopReason::NoTarget,
        });

        assert_eq!(
            lifecycle.try_recv().unwrap(),
            Event::Lifecycle(LifecycleEvent::Stopped {
                reason: StopReason::NoTarget
            })
        );
        assert!(errors.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.publish(ErrorEvent {
            message: "ignored".into(),
        });

        let mut receivers = bus.subscribe_multiple(&[Topic::Action, Topic::Telemetry]);
        assert_eq!(receivers.len(), 2);
        assert!(receivers.get_mut(&Topic::Action).unwrap().try_recv().is_err());
    }
}
