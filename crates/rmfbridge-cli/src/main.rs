//! `rmf-robot-state-publisher` – reports a robot's state to Open-RMF.
//!
//! The binary:
//!
//! 1. Initialises structured logging (and OTLP export when configured).
//! 2. Loads transport settings from `~/.rmfbridge/config.toml` and
//!    `RMFBRIDGE_*` overrides.
//! 3. Connects to `rosbridge_server`, subscribes to odometry and battery, and
//!    publishes an `rmf_fleet_msgs/RobotState` at 10 Hz.
//! 4. Intercepts **Ctrl-C** to unadvertise and exit cleanly.

mod config;

use std::process::ExitCode;
use std::sync::Arc;

use rmfbridge_middleware::{EventBus, RosbridgeClient, Topic};
use rmfbridge_runtime::{RobotIdentity, StatePublisherNode, init_tracing};
use rmfbridge_types::BridgeError;
use tokio::sync::watch;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    // Tracing comes up before the runtime so the OTLP exporter can stay
    // synchronous.
    let _guard = init_tracing("rmf-robot-state-publisher");

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, path = %config::config_path().display(), "config unreadable; using defaults");
            config::Config::default()
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "robot state publisher failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: config::Config) -> Result<(), BridgeError> {
    // ── Shutdown signal ───────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let ctrlc_tx = Arc::clone(&shutdown_tx);

    if let Err(e) = ctrlc::set_handler(move || {
        info!("interrupt received; shutting down");
        let _ = ctrlc_tx.send(true);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    // ── Wiring ────────────────────────────────────────────────────────────
    let bus = Arc::new(EventBus::default());
    let identity = RobotIdentity::default();

    // Subscribe before the client starts pushing samples.
    let odometry = bus.subscribe_to(Topic::Odometry);
    let battery = bus.subscribe_to(Topic::Battery);

    let node = StatePublisherNode::new(identity.clone(), (*bus).clone());
    let client = RosbridgeClient::new(Arc::clone(&bus), cfg.rosbridge());

    info!(
        robot = %identity.name,
        rosbridge = %cfg.rosbridge_url,
        odom_topic = %cfg.odom_topic,
        battery_topic = %cfg.battery_topic,
        robot_state_topic = %cfg.robot_state_topic,
        "RMF robot state publisher started"
    );

    let node_task = tokio::spawn(node.run(odometry, battery, shutdown_rx.clone()));

    let result = client.run(shutdown_rx).await;

    // Transport gone or Ctrl-C: either way the node has nothing left to do.
    let _ = shutdown_tx.send(true);
    match node_task.await {
        Ok(publisher) => info!(reports = publisher.seq(), "robot state publisher stopped"),
        Err(e) => warn!(error = %e, "state publisher task ended abnormally"),
    }

    result
}
