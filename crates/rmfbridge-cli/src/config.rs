//! Transport configuration – reads `~/.rmfbridge/config.toml`.
//!
//! Robot identity is compiled in; only the rosbridge endpoint and topic
//! names are configurable. A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use rmfbridge_middleware::RosbridgeConfig;
use rmfbridge_types::BridgeError;
use serde::{Deserialize, Serialize};

/// Persisted transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// WebSocket URL of the `rosbridge_server`.
    #[serde(default = "default_rosbridge_url")]
    pub rosbridge_url: String,

    /// Topic carrying `nav_msgs/Odometry`.
    #[serde(default = "default_odom_topic")]
    pub odom_topic: String,

    /// Topic carrying `sensor_msgs/BatteryState`.
    #[serde(default = "default_battery_topic")]
    pub battery_topic: String,

    /// Topic the `rmf_fleet_msgs/RobotState` reports go to.
    #[serde(default = "default_robot_state_topic")]
    pub robot_state_topic: String,

    /// Subscription depth requested from rosbridge.
    #[serde(default = "default_queue_length")]
    pub queue_length: u32,
}

fn default_rosbridge_url() -> String {
    "ws://localhost:9090".to_string()
}
fn default_odom_topic() -> String {
    "/base_controller/odom".to_string()
}
fn default_battery_topic() -> String {
    "/battery_state".to_string()
}
fn default_robot_state_topic() -> String {
    "/robot_state".to_string()
}
fn default_queue_length() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rosbridge_url: default_rosbridge_url(),
            odom_topic: default_odom_topic(),
            battery_topic: default_battery_topic(),
            robot_state_topic: default_robot_state_topic(),
            queue_length: default_queue_length(),
        }
    }
}

impl Config {
    /// Settings for the rosbridge client.
    pub fn rosbridge(&self) -> RosbridgeConfig {
        RosbridgeConfig {
            url: self.rosbridge_url.clone(),
            odom_topic: self.odom_topic.clone(),
            battery_topic: self.battery_topic.clone(),
            robot_state_topic: self.robot_state_topic.clone(),
            queue_length: self.queue_length,
        }
    }
}

/// Return the path to `~/.rmfbridge/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".rmfbridge").join("config.toml")
}

/// Load the config from disk and apply environment overrides.
///
/// Returns defaults (plus overrides) when the file does not exist.
pub fn load() -> Result<Config, BridgeError> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the config from a specific path. Returns `None` if it does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, BridgeError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        BridgeError::Config(format!("Failed to read config at {}: {}", path.display(), e))
    })?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| BridgeError::Config(format!("Failed to parse config: {}", e)))?;
    Ok(Some(cfg))
}

/// Apply `RMFBRIDGE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `RMFBRIDGE_ROSBRIDGE_URL` | `rosbridge_url` |
/// | `RMFBRIDGE_ODOM_TOPIC` | `odom_topic` |
/// | `RMFBRIDGE_BATTERY_TOPIC` | `battery_topic` |
/// | `RMFBRIDGE_ROBOT_STATE_TOPIC` | `robot_state_topic` |
/// | `RMFBRIDGE_QUEUE_LENGTH` | `queue_length` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("RMFBRIDGE_ROSBRIDGE_URL") {
        cfg.rosbridge_url = v;
    }
    if let Ok(v) = std::env::var("RMFBRIDGE_ODOM_TOPIC") {
        cfg.odom_topic = v;
    }
    if let Ok(v) = std::env::var("RMFBRIDGE_BATTERY_TOPIC") {
        cfg.battery_topic = v;
    }
    if let Ok(v) = std::env::var("RMFBRIDGE_ROBOT_STATE_TOPIC") {
        cfg.robot_state_topic = v;
    }
    if let Ok(v) = std::env::var("RMFBRIDGE_QUEUE_LENGTH")
        && let Ok(depth) = v.parse::<u32>()
    {
        cfg.queue_length = depth;
    }
}
