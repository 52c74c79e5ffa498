//! Definitions for the ROS 2 `geometry_msgs` package.
//!
//! Only the pose and twist family is modelled. Covariances are kept as plain
//! vectors (36 row-major entries on the wire).

use serde::{Deserialize, Serialize};

use super::{nan_when_null, nan_when_null_vec};

/// A position in free space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    #[serde(deserialize_with = "nan_when_null")]
    pub x: f64,
    #[serde(deserialize_with = "nan_when_null")]
    pub y: f64,
    #[serde(deserialize_with = "nan_when_null")]
    pub z: f64,
}

/// An orientation in free space in quaternion form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quaternion {
    #[serde(deserialize_with = "nan_when_null")]
    pub x: f64,
    #[serde(deserialize_with = "nan_when_null")]
    pub y: f64,
    #[serde(deserialize_with = "nan_when_null")]
    pub z: f64,
    #[serde(deserialize_with = "nan_when_null")]
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// The identity rotation.
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }

    /// A pure rotation of `yaw` radians about the vertical axis.
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw * 0.5;
        Self {
            x: 0.0,
            y: 0.0,
            z: half.sin(),
            w: half.cos(),
        }
    }

    /// Heading about the vertical axis, in radians within `[-π, π]`.
    ///
    /// Pitch and roll are discarded. The quaternion is not normalised first,
    /// so a non-unit input yields a correspondingly skewed angle.
    pub fn yaw(&self) -> f64 {
        let siny_cosp = 2.0 * (self.w * self.z + self.x * self.y);
        let cosy_cosp = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        siny_cosp.atan2(cosy_cosp)
    }
}

/// A 3-D vector, used for linear and angular rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vector3 {
    #[serde(deserialize_with = "nan_when_null")]
    pub x: f64,
    #[serde(deserialize_with = "nan_when_null")]
    pub y: f64,
    #[serde(deserialize_with = "nan_when_null")]
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Position and orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub position: Point,
    pub orientation: Quaternion,
}

/// A pose with its uncertainty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseWithCovariance {
    pub pose: Pose,
    #[serde(deserialize_with = "nan_when_null_vec")]
    pub covariance: Vec<f64>,
}

/// Velocity in free space broken into its linear and angular parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl Twist {
    pub fn new(linear: Vector3, angular: Vector3) -> Self {
        Self { linear, angular }
    }
}

/// A twist with its uncertainty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwistWithCovariance {
    pub twist: Twist,
    #[serde(deserialize_with = "nan_when_null_vec")]
    pub covariance: Vec<f64>,
}
