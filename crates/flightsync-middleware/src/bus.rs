//! Session event bus.
//!
//! One [`tokio::sync::broadcast`] channel per lane. A renderer can follow
//! the busy render lane while a console only listens to diagnostics, and a
//! slow listener loses old events instead of holding up the session.
//!
//! # Topics
//!
//! | Topic | Carries |
//! |---|---|
//! | [`Topic::Render`] | Create / update / remove commands for scene nodes |
//! | [`Topic::Gameplay`] | Trace updates, path start, collisions, destinations |
//! | [`Topic::Diagnostics`] | Status counters and feed faults |

use flightsync_types::{Event, EventPayload, FlightError};
use tokio::sync::broadcast;
use tracing::warn;

/// Events buffered per lane before slow subscribers start lagging.
const DEFAULT_CAPACITY: usize = 256;

/// Routing lanes on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Scene node lifecycle, high frequency while feeds are delivering.
    Render,
    /// Everything the drawn path and the actor produce.
    Gameplay,
    /// Status line and feed faults.
    Diagnostics,
}

impl Topic {
    /// The lane a payload is routed to.
    pub fn of(payload: &EventPayload) -> Topic {
        match payload {
            EventPayload::Render(_) => Topic::Render,
            EventPayload::TraceExtended(_)
            | EventPayload::TraceCleared
            | EventPayload::PathStarted { .. }
            | EventPayload::Collision { .. }
            | EventPayload::DestinationReached { .. }
            | EventPayload::NewDestination(_) => Topic::Gameplay,
            EventPayload::Status { .. } | EventPayload::FeedFault { .. } => Topic::Diagnostics,
        }
    }
}

/// Handle to the three lanes. Clones publish into the same channels; the
/// lanes close once every clone is dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    render: broadcast::Sender<Event>,
    gameplay: broadcast::Sender<Event>,
    diagnostics: broadcast::Sender<Event>,
}

impl EventBus {
    /// `capacity` is per lane.
    pub fn new(capacity: usize) -> Self {
        let (render, _) = broadcast::channel(capacity);
        let (gameplay, _) = broadcast::channel(capacity);
        let (diagnostics, _) = broadcast::channel(capacity);
        Self {
            render,
            gameplay,
            diagnostics,
        }
    }

    /// Publish `event` to the given [`Topic`] channel.
    ///
    /// Returns the number of active receivers that were handed the event,
    /// or [`FlightError::Channel`] when nobody is listening on the topic.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, FlightError> {
        self.topic_sender(topic)
            .send(event)
            .map_err(|_| FlightError::Channel(format!("No subscribers for topic {:?}", topic)))
    }

    /// Publish `event` on the lane chosen by [`Topic::of`].
    pub fn publish(&self, event: Event) -> Result<usize, FlightError> {
        self.publish_to(Topic::of(&event.payload), event)
    }

    /// Listen on one lane from now on.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Render => &self.render,
            Topic::Gameplay => &self.gameplay,
            Topic::Diagnostics => &self.diagnostics,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Topic-based receiver
// ---------------------------------------------------------------------------

/// Receiving end of one lane, from [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Raw receive; lag and closure are reported as errors.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Like [`recv`][Self::recv] but skips over lag, logging how many events
    /// were lost. Returns `None` once the bus is closed.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(topic = ?self.topic, lagged_by = n, "TopicReceiver lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking [`next`][Self::next]; `None` when nothing is pending.
    pub fn try_next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(topic = ?self.topic, lagged_by = n, "TopicReceiver lagged");
                    continue;
                }
                Err(_) => return None,
            }
        }
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightsync_types::{IcaoCode, RenderCommand};

    fn remove_event(key: &str) -> Event {
        Event::new(
            "flightsync-middleware::test",
            EventPayload::Render(RenderCommand::Remove {
                key: IcaoCode::new(key).unwrap(),
            }),
        )
    }

    #[test]
    fn payloads_route_to_expected_topics() {
        assert_eq!(Topic::of(&remove_event("A1").payload), Topic::Render);
        assert_eq!(Topic::of(&EventPayload::TraceCleared), Topic::Gameplay);
        assert_eq!(
            Topic::of(&EventPayload::Status {
                complete: 0,
                total: 0,
                merges: 0
            }),
            Topic::Diagnostics
        );
    }

    #[tokio::test]
    async fn publish_routes_by_payload() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut render = bus.subscribe_to(Topic::Render);

        let event = remove_event("A1");
        bus.publish(event.clone())?;

        let received = render.recv().await?;
        assert_eq!(received.id, event.id);
        assert_eq!(render.topic(), Topic::Render);
        Ok(())
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut first = bus.subscribe_to(Topic::Gameplay);
        let mut second = bus.subscribe_to(Topic::Gameplay);

        let event = Event::new("test", EventPayload::TraceCleared);
        bus.publish_to(Topic::Gameplay, event.clone())?;

        assert_eq!(first.recv().await?.id, event.id);
        assert_eq!(second.recv().await?.id, event.id);
        Ok(())
    }

    #[test]
    fn publish_without_subscribers_returns_error() {
        let bus = EventBus::default();
        assert!(bus.publish(remove_event("A1")).is_err());
    }

    #[tokio::test]
    async fn other_topics_are_isolated() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut diagnostics = bus.subscribe_to(Topic::Diagnostics);
        let _render = bus.subscribe_to(Topic::Render);

        bus.publish(remove_event("A1"))?;

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(50), diagnostics.recv()).await;
        assert!(result.is_err(), "Diagnostics must not receive render traffic");
        Ok(())
    }

    #[tokio::test]
    async fn next_skips_lag() {
        let bus = EventBus::new(4);
        let mut slow = bus.subscribe_to(Topic::Render);
        for i in 0..32 {
            let _ = bus.publish(remove_event(&format!("K{i}")));
        }
        let event = slow.next().await.expect("an event survives the lag");
        assert!(matches!(event.payload, EventPayload::Render(_)));
    }

    #[test]
    fn try_next_is_empty_without_traffic() {
        let bus = EventBus::default();
        let mut gameplay = bus.subscribe_to(Topic::Gameplay);
        assert!(gameplay.try_next().is_none());
    }
}
