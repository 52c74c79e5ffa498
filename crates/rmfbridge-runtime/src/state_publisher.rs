//! [`StatePublisher`] – translates local telemetry into Open-RMF status.
//!
//! Holds one [`RobotTelemetry`] snapshot that the odometry and battery
//! streams overwrite independently, and builds a fresh [`RobotState`] from it
//! on every timer tick.
//!
//! Motion is classified from the most recent twist alone: the robot is
//! [`MotionState::Moving`] when its planar speed or its yaw rate exceeds
//! [`MOTION_THRESHOLD`], otherwise [`MotionState::Idle`]. There is no
//! hysteresis, so a single noisy sample flips the state.
//!
//! Inputs are not validated. NaN, an out-of-range charge fraction or a
//! non-unit quaternion flow straight through into the report.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use rmfbridge_runtime::state_publisher::{MotionState, RobotIdentity, StatePublisher};
//! use rmfbridge_types::{Pose, Twist, Vector3};
//!
//! let mut publisher = StatePublisher::new(RobotIdentity::default());
//! let twist = Twist::new(Vector3::new(0.5, 0.0, 0.0), Vector3::default());
//! publisher.on_pose_update(&Pose::default(), &twist);
//! publisher.on_battery_update(0.42);
//!
//! assert_eq!(publisher.telemetry().motion, MotionState::Moving);
//! let state = publisher.on_tick(Utc::now());
//! assert_eq!(state.seq, 0);
//! assert!((state.battery_percent - 42.0).abs() < 1e-4);
//! ```

use chrono::{DateTime, Utc};
use rmfbridge_types::{Location, Odometry, Pose, RobotMode, RobotState, Twist, Vector3};

// ────────────────────────────────────────────────────────────────────────────
// Constants
// ────────────────────────────────────────────────────────────────────────────

/// Speed above which the robot counts as moving, in m/s for the planar
/// component and rad/s for the yaw rate. The comparison is strict.
pub const MOTION_THRESHOLD: f64 = 0.01;

/// Name reported to the fleet manager.
pub const ROBOT_NAME: &str = "minibot_1";
/// Robot model reported to the fleet manager.
pub const ROBOT_MODEL: &str = "minibot";
/// Map level the robot operates on.
pub const LEVEL_NAME: &str = "L1";

// ────────────────────────────────────────────────────────────────────────────
// Motion classification
// ────────────────────────────────────────────────────────────────────────────

/// Binary activity classification derived from instantaneous velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MotionState {
    #[default]
    Idle,
    Moving,
}

impl MotionState {
    /// The Open-RMF mode this classification maps to.
    pub fn robot_mode(self) -> RobotMode {
        match self {
            MotionState::Idle => RobotMode::new(RobotMode::MODE_IDLE),
            MotionState::Moving => RobotMode::new(RobotMode::MODE_MOVING),
        }
    }
}

/// Classify a velocity sample.
///
/// Uses the Euclidean norm of the x/y linear components and the absolute
/// angular rate about z. Vertical velocity and roll/pitch rates are ignored.
pub fn classify_motion(linear: &Vector3, angular: &Vector3) -> MotionState {
    let planar_speed = linear.x.hypot(linear.y);
    let yaw_rate = angular.z.abs();
    if planar_speed > MOTION_THRESHOLD || yaw_rate > MOTION_THRESHOLD {
        MotionState::Moving
    } else {
        MotionState::Idle
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Identity & telemetry
// ────────────────────────────────────────────────────────────────────────────

/// Static identity fields stamped on every report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotIdentity {
    pub name: String,
    pub model: String,
    pub level_name: String,
}

impl Default for RobotIdentity {
    fn default() -> Self {
        Self {
            name: ROBOT_NAME.to_string(),
            model: ROBOT_MODEL.to_string(),
            level_name: LEVEL_NAME.to_string(),
        }
    }
}

/// Latest known robot state. Each field reflects the most recent sample on
/// its own stream; pose and battery may lag each other arbitrarily.
///
/// Before any sample arrives the robot sits idle at the origin facing yaw 0
/// and the battery reads 100 %, so reports sent ahead of the first battery
/// sample claim a full charge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotTelemetry {
    /// Map-frame X position (metres).
    pub position_x: f64,
    /// Map-frame Y position (metres).
    pub position_y: f64,
    /// Yaw (radians).
    pub heading_rad: f64,
    pub motion: MotionState,
    /// Charge in percent (fraction × 100).
    pub battery_percent: f32,
}

impl Default for RobotTelemetry {
    fn default() -> Self {
        Self {
            position_x: 0.0,
            position_y: 0.0,
            heading_rad: 0.0,
            motion: MotionState::Idle,
            // Assume a full battery until the power board reports.
            battery_percent: 100.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// StatePublisher
// ────────────────────────────────────────────────────────────────────────────

/// Owns the robot's telemetry and the report sequence counter.
///
/// All three handlers take `&mut self`; callers on a multi-threaded host must
/// serialise them (see [`StatePublisherNode`][crate::node::StatePublisherNode]).
#[derive(Debug, Clone)]
pub struct StatePublisher {
    identity: RobotIdentity,
    telemetry: RobotTelemetry,
    seq: u64,
}

impl StatePublisher {
    /// Create a publisher with default telemetry and sequence 0.
    pub fn new(identity: RobotIdentity) -> Self {
        Self {
            identity,
            telemetry: RobotTelemetry::default(),
            seq: 0,
        }
    }

    /// Overwrite position, heading and motion classification.
    ///
    /// Only the yaw of the orientation is kept.
    pub fn on_pose_update(&mut self, pose: &Pose, twist: &Twist) {
        self.telemetry.position_x = pose.position.x;
        self.telemetry.position_y = pose.position.y;
        self.telemetry.heading_rad = pose.orientation.yaw();
        self.telemetry.motion = classify_motion(&twist.linear, &twist.angular);
    }

    /// Convenience wrapper unpacking a `nav_msgs/Odometry` sample.
    pub fn on_odometry(&mut self, odom: &Odometry) {
        self.on_pose_update(&odom.pose.pose, &odom.twist.twist);
    }

    /// Record a normalised charge fraction.
    pub fn on_battery_update(&mut self, fraction: f32) {
        self.telemetry.battery_percent = fraction * 100.0;
    }

    /// Snapshot the telemetry into a report stamped with `now` and advance the
    /// sequence counter.
    ///
    /// The counter wraps at `u64::MAX`.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> RobotState {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);

        RobotState {
            name: self.identity.name.clone(),
            model: self.identity.model.clone(),
            task_id: String::new(),
            seq,
            mode: self.telemetry.motion.robot_mode(),
            battery_percent: self.telemetry.battery_percent,
            location: Location {
                t: now.into(),
                x: self.telemetry.position_x as f32,
                y: self.telemetry.position_y as f32,
                yaw: self.telemetry.heading_rad as f32,
                obey_approach_speed_limit: false,
                approach_speed_limit: 0.0,
                level_name: self.identity.level_name.clone(),
                index: 0,
            },
            path: Vec::new(),
        }
    }

    /// Current telemetry snapshot.
    pub fn telemetry(&self) -> &RobotTelemetry {
        &self.telemetry
    }

    /// Sequence number the next report will carry.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn identity(&self) -> &RobotIdentity {
        &self.identity
    }
}
