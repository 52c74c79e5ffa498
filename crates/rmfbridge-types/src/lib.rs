//! `rmfbridge-types` – shared vocabulary of the robot-state bridge.
//!
//! Holds the ROS 2 / Open-RMF message definitions ([`msgs`]), the envelope
//! routed over the internal event bus ([`Event`]) and the crate-wide error
//! type ([`BridgeError`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod msgs;

pub use msgs::builtin_interfaces::Time;
pub use msgs::geometry_msgs::{Point, Pose, Quaternion, Twist, Vector3};
pub use msgs::nav_msgs::Odometry;
pub use msgs::rmf_fleet_msgs::{Location, RobotMode, RobotState};
pub use msgs::sensor_msgs::BatteryState;

/// Unified event wrapper for the internal event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "rmfbridge-middleware::rosbridge/odom"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Wrap `payload` in a fresh envelope stamped with the current time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data that can be routed over the internal event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// Pose and velocity sample from the odometry stream.
    Odometry(Odometry),
    /// Charge sample from the battery stream.
    Battery(BatteryState),
    /// Outbound status report for the fleet manager.
    RobotState(RobotState),
}

/// Error type shared by every crate in the bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Config Error: {0}")]
    Config(String),
}
