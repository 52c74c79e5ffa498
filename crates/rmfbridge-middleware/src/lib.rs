//! `rmfbridge-middleware` – transport plumbing for the robot-state bridge.
//!
//! Moves messages between the ROS graph and the state publisher without
//! interpreting them.
//!
//! # Modules
//!
//! - [`bus`] – typed, topic-partitioned publish/subscribe bus built on Tokio
//!   broadcast channels.
//! - [`adapter`] – the [`StatusSink`] seam through which status reports leave
//!   the process.
//! - [`rosbridge`] – WebSocket client speaking the `rosbridge_server` JSON
//!   protocol: subscribes to odometry and battery, publishes robot state.

pub mod adapter;
pub mod bus;
pub mod rosbridge;

pub use adapter::StatusSink;
pub use bus::{EventBus, Topic, TopicReceiver};
pub use rosbridge::{RosbridgeClient, RosbridgeConfig};
