//! ROS 2 message definitions in their rosbridge JSON encoding.
//!
//! Only the packages the bridge actually touches are modelled. Field names
//! match the `.msg` definitions so that `serde_json` produces exactly the
//! frames `rosbridge_server` expects.

pub mod builtin_interfaces;
pub mod geometry_msgs;
pub mod nav_msgs;
pub mod rmf_fleet_msgs;
pub mod sensor_msgs;
pub mod std_msgs;

use serde::{Deserialize, Deserializer};

/// rosbridge encodes non-finite floats as JSON `null`; read them back as NaN.
pub(crate) fn nan_when_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// `f32` flavour of [`nan_when_null`].
pub(crate) fn nan_when_null_f32<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::NAN))
}

/// List flavour of [`nan_when_null`]: each `null` element becomes NaN.
pub(crate) fn nan_when_null_vec<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Vec::<Option<f64>>::deserialize(deserializer)?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// `f32` list flavour of [`nan_when_null`].
pub(crate) fn nan_when_null_vec_f32<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Vec::<Option<f32>>::deserialize(deserializer)?
        .into_iter()
        .map(|v| v.unwrap_or(f32::NAN))
        .collect())
}
