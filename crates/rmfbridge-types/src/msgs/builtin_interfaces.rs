//! Definitions for the ROS 2 `builtin_interfaces` package.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in time, split into whole seconds and nanoseconds since the epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Time {
    pub sec: i32,
    pub nanosec: u32,
}

impl From<DateTime<Utc>> for Time {
    fn from(stamp: DateTime<Utc>) -> Self {
        Self {
            // `sec` is an int32 on the wire; stamps past 2038 saturate.
            sec: stamp
                .timestamp()
                .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
            nanosec: stamp.timestamp_subsec_nanos(),
        }
    }
}
