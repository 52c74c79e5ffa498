//! Headless, typed, topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others.
//!
//! # Topics
//!
//! | Topic | Typical traffic |
//! |---|---|
//! | [`Topic::Odometry`] | Pose and twist samples from the drive base |
//! | [`Topic::Battery`] | Charge samples from the power board |
//! | [`Topic::RobotState`] | Status reports bound for the fleet manager |
//!
//! Inbound streams are latest-wins: a subscriber that falls behind gets a
//! `Lagged` error and simply continues with the newest sample.

use rmfbridge_types::{BridgeError, Event, EventPayload};
use tokio::sync::broadcast;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 64;

/// Enumeration of all routing topics on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// `nav_msgs/Odometry` samples.
    Odometry,
    /// `sensor_msgs/BatteryState` samples.
    Battery,
    /// Outbound `rmf_fleet_msgs/RobotState` reports.
    RobotState,
}

impl Topic {
    /// The lane a payload belongs on.
    pub fn of(payload: &EventPayload) -> Self {
        match payload {
            EventPayload::Odometry(_) => Topic::Odometry,
            EventPayload::Battery(_) => Topic::Battery,
            EventPayload::RobotState(_) => Topic::RobotState,
        }
    }
}

/// Shared event bus. Clone it cheaply – all clones share the same underlying
/// broadcast channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    odometry: broadcast::Sender<Event>,
    battery: broadcast::Sender<Event>,
    robot_state: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every topic channel independently.
    pub fn new(capacity: usize) -> Self {
        let (odometry, _) = broadcast::channel(capacity);
        let (battery, _) = broadcast::channel(capacity);
        let (robot_state, _) = broadcast::channel(capacity);
        Self {
            odometry,
            battery,
            robot_state,
        }
    }

    /// Publish `event` to the given [`Topic`] channel.
    ///
    /// Returns the number of active receivers that were handed the event, or
    /// [`BridgeError::Channel`] when nobody is listening on the topic.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, BridgeError> {
        self.topic_sender(topic)
            .send(event)
            .map_err(|_| BridgeError::Channel(format!("No subscribers for topic {topic:?}")))
    }

    /// Publish `event` on the lane matching its payload.
    pub fn publish(&self, event: Event) -> Result<usize, BridgeError> {
        let topic = Topic::of(&event.payload);
        self.publish_to(topic, event)
    }

    /// Subscribe to a specific [`Topic`] channel.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Odometry => &self.odometry,
            Topic::Battery => &self.battery,
            Topic::RobotState => &self.robot_state,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// An async receiver bound to a single [`Topic`] channel.
///
/// Obtained via [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of [`recv`][Self::recv].
    pub fn try_recv(&mut self) -> Result<Event, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmfbridge_types::{BatteryState, Odometry, RobotState};

    fn odom_event(source: &str) -> Event {
        Event::new(source, EventPayload::Odometry(Odometry::default()))
    }

    #[tokio::test]
    async fn publish_to_and_receive() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut rx = bus.subscribe_to(Topic::Odometry);

        let event = odom_event("rosbridge/odom");
        bus.publish_to(Topic::Odometry, event.clone())?;

        let received = rx.recv().await?;
        assert_eq!(received.id, event.id);
        assert_eq!(received.source, event.source);
        assert_eq!(rx.topic(), Topic::Odometry);
        Ok(())
    }

    #[tokio::test]
    async fn publish_routes_by_payload_kind() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut odom = bus.subscribe_to(Topic::Odometry);
        let mut battery = bus.subscribe_to(Topic::Battery);
        let mut state = bus.subscribe_to(Topic::RobotState);

        let b = Event::new("test", EventPayload::Battery(BatteryState::with_percentage(0.5)));
        let s = Event::new("test", EventPayload::RobotState(RobotState::default()));
        bus.publish(b.clone())?;
        bus.publish(s.clone())?;

        assert_eq!(battery.recv().await?.id, b.id);
        assert_eq!(state.recv().await?.id, s.id);
        assert!(odom.try_recv().is_err(), "odometry lane must stay empty");
        Ok(())
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe_to(Topic::Battery);
        let mut rx2 = bus.subscribe_to(Topic::Battery);

        let event = Event::new("test", EventPayload::Battery(BatteryState::default()));
        assert_eq!(bus.publish_to(Topic::Battery, event.clone())?, 2);

        assert_eq!(rx1.recv().await?.id, event.id);
        assert_eq!(rx2.recv().await?.id, event.id);
        Ok(())
    }

    #[test]
    fn publish_no_subscribers_returns_error() {
        let bus = EventBus::default();
        let result = bus.publish_to(Topic::Odometry, odom_event("test"));
        assert!(matches!(result, Err(BridgeError::Channel(_))));
    }

    #[tokio::test]
    async fn subscriber_does_not_receive_other_topic_events() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut battery_sub = bus.subscribe_to(Topic::Battery);
        let _odom_sub = bus.subscribe_to(Topic::Odometry);

        bus.publish_to(Topic::Odometry, odom_event("rosbridge/odom"))?;

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            battery_sub.recv(),
        )
        .await;
        assert!(result.is_err(), "Battery subscriber must not receive an Odometry event");
        Ok(())
    }

    #[tokio::test]
    async fn slow_subscriber_lags_instead_of_blocking() {
        const CAPACITY: usize = 8;
        let bus = EventBus::new(CAPACITY);
        let mut slow_sub = bus.subscribe_to(Topic::Odometry);

        for _ in 0..100 {
            let _ = bus.publish_to(Topic::Odometry, odom_event("flood::odom"));
        }

        let result = slow_sub.recv().await;
        assert!(
            matches!(result, Err(broadcast::error::RecvError::Lagged(_))),
            "expected Lagged error, got: {result:?}"
        );
        // After the lag report the newest samples are still available.
        assert!(slow_sub.recv().await.is_ok());
    }

}
