//! Definitions for the Open-RMF `rmf_fleet_msgs` package.
//!
//! A fleet adapter consumes one [`RobotState`] per robot at a steady rate and
//! uses it to track position, battery and activity.

use serde::{Deserialize, Serialize};

use super::builtin_interfaces::Time;

/// What the robot is currently doing, as seen by the fleet manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotMode {
    pub mode: u32,
    pub mode_request_id: u64,
}

impl RobotMode {
    pub const MODE_IDLE: u32 = 0;
    pub const MODE_CHARGING: u32 = 1;
    pub const MODE_MOVING: u32 = 2;
    pub const MODE_PAUSED: u32 = 3;
    pub const MODE_WAITING: u32 = 4;
    pub const MODE_EMERGENCY: u32 = 5;
    pub const MODE_GOING_HOME: u32 = 6;
    pub const MODE_DOCKING: u32 = 7;
    pub const MODE_ADAPTER_ERROR: u32 = 8;
    pub const MODE_CLEANING: u32 = 9;

    /// A mode with no associated request.
    pub fn new(mode: u32) -> Self {
        Self {
            mode,
            mode_request_id: 0,
        }
    }
}

/// A stamped planar location on a named map level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub t: Time,
    pub x: f32,
    pub y: f32,
    pub yaw: f32,
    pub obey_approach_speed_limit: bool,
    pub approach_speed_limit: f32,
    pub level_name: String,
    pub index: u64,
}

/// The periodic status report of one robot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotState {
    pub name: String,
    pub model: String,
    pub task_id: String,
    pub seq: u64,
    pub mode: RobotMode,
    pub battery_percent: f32,
    pub location: Location,
    pub path: Vec<Location>,
}
