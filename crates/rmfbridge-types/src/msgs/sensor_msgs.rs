//! Definitions for the ROS 2 `sensor_msgs` package.

use serde::{Deserialize, Serialize};

use super::{nan_when_null_f32, nan_when_null_vec_f32};
use super::std_msgs::Header;

/// Describes the power state of the battery.
///
/// Unmeasured quantities are NaN on the ROS side and arrive as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryState {
    pub header: Header,
    #[serde(deserialize_with = "nan_when_null_f32")]
    pub voltage: f32,
    #[serde(deserialize_with = "nan_when_null_f32")]
    pub temperature: f32,
    #[serde(deserialize_with = "nan_when_null_f32")]
    pub current: f32,
    #[serde(deserialize_with = "nan_when_null_f32")]
    pub charge: f32,
    #[serde(deserialize_with = "nan_when_null_f32")]
    pub capacity: f32,
    #[serde(deserialize_with = "nan_when_null_f32")]
    pub design_capacity: f32,
    /// Charge fraction, 0 to 1.
    #[serde(deserialize_with = "nan_when_null_f32")]
    pub percentage: f32,
    pub power_supply_status: u8,
    pub power_supply_health: u8,
    pub power_supply_technology: u8,
    pub present: bool,
    #[serde(deserialize_with = "nan_when_null_vec_f32")]
    pub cell_voltage: Vec<f32>,
    #[serde(deserialize_with = "nan_when_null_vec_f32")]
    pub cell_temperature: Vec<f32>,
    pub location: String,
    pub serial_number: String,
}

impl BatteryState {
    /// A message carrying only a charge fraction.
    pub fn with_percentage(percentage: f32) -> Self {
        Self {
            percentage,
            present: true,
            ..Self::default()
        }
    }
}
