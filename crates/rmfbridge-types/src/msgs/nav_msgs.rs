//! Definitions for the ROS 2 `nav_msgs` package.

use serde::{Deserialize, Serialize};

use super::geometry_msgs::{PoseWithCovariance, TwistWithCovariance};
use super::std_msgs::Header;

/// Represents an estimate of a position and velocity in free space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Odometry {
    pub header: Header,

    /// Frame id the pose points to.
    pub child_frame_id: String,

    /// Estimated pose that is typically relative to a fixed world frame.
    pub pose: PoseWithCovariance,

    /// Estimated linear and angular velocity relative to child_frame_id.
    pub twist: TwistWithCovariance,
}
