//! `rmfbridge-runtime` – the state publisher and its event loop.
//!
//! # Modules
//!
//! - [`state_publisher`] – [`StatePublisher`][state_publisher::StatePublisher]:
//!   holds the latest pose, heading, motion classification and battery level
//!   and turns them into an Open-RMF `RobotState` on demand.
//! - [`node`] – [`StatePublisherNode`][node::StatePublisherNode]: the single
//!   consumer that funnels odometry, battery and the 10 Hz timer into one
//!   `StatePublisher` and hands each report to a
//!   [`StatusSink`][rmfbridge_middleware::StatusSink].
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.

pub mod node;
pub mod state_publisher;
pub mod telemetry;

pub use node::{PUBLISH_PERIOD, StatePublisherNode};
pub use state_publisher::{
    MOTION_THRESHOLD, MotionState, RobotIdentity, RobotTelemetry, StatePublisher, classify_motion,
};
pub use telemetry::{TracerProviderGuard, init_tracing};
