//! Outbound seam between the state publisher and the transport.
//!
//! The state publisher never talks to ROS directly. It hands every
//! [`RobotState`] to a [`StatusSink`]; the production sink is the
//! [`EventBus`], from which the
//! [`RosbridgeClient`][crate::rosbridge::RosbridgeClient] forwards frames to
//! `rosbridge_server`. Tests substitute an in-memory sink.

use async_trait::async_trait;
use rmfbridge_types::{BridgeError, Event, EventPayload, RobotState};

use crate::bus::{EventBus, Topic};

/// Source tag stamped on status events entering the bus.
pub const STATUS_SOURCE: &str = "rmfbridge-runtime::state_publisher";

/// Accepts status reports for transport.
///
/// # Contract
///
/// * `publish_status` must not block on the network; delivery is best-effort
///   and callers never retry a failed report.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Hand one status report to the transport.
    async fn publish_status(&self, state: &RobotState) -> Result<(), BridgeError>;
}

#[async_trait]
impl StatusSink for EventBus {
    async fn publish_status(&self, state: &RobotState) -> Result<(), BridgeError> {
        let event = Event::new(STATUS_SOURCE, EventPayload::RobotState(state.clone()));
        self.publish_to(Topic::RobotState, event).map(|_| ())
    }
}
