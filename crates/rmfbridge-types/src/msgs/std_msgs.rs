//! Definitions for the ROS 2 `std_msgs` package.

use serde::{Deserialize, Serialize};

use super::builtin_interfaces::Time;

/// Standard metadata for higher-level stamped data types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    /// Two-integer timestamp that is expressed as seconds and nanoseconds.
    pub stamp: Time,

    /// Transform frame with which this data is associated.
    pub frame_id: String,
}
