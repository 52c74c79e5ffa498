//! [`StatePublisherNode`] – single-consumer event loop around a
//! [`StatePublisher`].
//!
//! Odometry samples, battery samples and the publish timer are funnelled into
//! one `tokio::select!` loop that owns the publisher outright, so the three
//! handlers never run concurrently and no lock is needed.
//!
//! Each timer tick builds one report and hands it to the configured
//! [`StatusSink`]. A failed hand-off is logged and dropped; the next tick
//! carries fresher data anyway.

use std::time::Duration;

use chrono::Utc;
use rmfbridge_middleware::{StatusSink, Topic, TopicReceiver};
use rmfbridge_types::{Event, EventPayload};
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::state_publisher::{RobotIdentity, StatePublisher};

/// Interval between two status reports (10 Hz).
pub const PUBLISH_PERIOD: Duration = Duration::from_millis(100);

/// Drives a [`StatePublisher`] from bus subscriptions and a periodic timer.
pub struct StatePublisherNode<S: StatusSink> {
    publisher: StatePublisher,
    sink: S,
    period: Duration,
}

impl<S: StatusSink> StatePublisherNode<S> {
    /// Create a node publishing every [`PUBLISH_PERIOD`].
    pub fn new(identity: RobotIdentity, sink: S) -> Self {
        Self {
            publisher: StatePublisher::new(identity),
            sink,
            period: PUBLISH_PERIOD,
        }
    }

    /// Override the publish period (builder-style).
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Run until `shutdown` flips to `true` or both inbound topics close.
    ///
    /// The first report goes out immediately; later ones follow every
    /// period. Ticks missed while the task was starved are skipped, not
    /// replayed. Returns the publisher so callers can inspect its final
    /// state.
    pub async fn run(
        mut self,
        mut odometry: TopicReceiver,
        mut battery: TopicReceiver,
        mut shutdown: watch::Receiver<bool>,
    ) -> StatePublisher {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut odometry_open = true;
        let mut battery_open = true;

        info!(
            robot = %self.publisher.identity().name,
            period_ms = self.period.as_millis() as u64,
            "state publisher running"
        );

        while !*shutdown.borrow() && (odometry_open || battery_open) {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Sender gone: nobody can ask us to stop any more.
                        break;
                    }
                }
                result = odometry.recv(), if odometry_open => {
                    odometry_open = self.handle_recv(odometry.topic(), result);
                }
                result = battery.recv(), if battery_open => {
                    battery_open = self.handle_recv(battery.topic(), result);
                }
                _ = ticker.tick() => {
                    self.publish_tick().await;
                }
            }
        }

        info!(last_seq = self.publisher.seq(), "state publisher stopped");
        self.publisher
    }

    /// Apply one receive result. Returns `false` once the topic has closed.
    fn handle_recv(&mut self, topic: Topic, result: Result<Event, RecvError>) -> bool {
        match result {
            Ok(event) => {
                self.apply(event.payload);
                true
            }
            Err(RecvError::Lagged(n)) => {
                warn!(topic = ?topic, lagged_by = n, "state publisher lagged; continuing with newest sample");
                true
            }
            Err(RecvError::Closed) => {
                debug!(topic = ?topic, "inbound topic closed");
                false
            }
        }
    }

    fn apply(&mut self, payload: EventPayload) {
        match payload {
            EventPayload::Odometry(odom) => self.publisher.on_odometry(&odom),
            EventPayload::Battery(battery) => self.publisher.on_battery_update(battery.percentage),
            EventPayload::RobotState(_) => {}
        }
    }

    async fn publish_tick(&mut self) {
        let state = self.publisher.on_tick(Utc::now());
        if let Err(e) = self.sink.publish_status(&state).await {
            debug!(seq = state.seq, error = %e, "robot state not delivered");
        }
    }
}
