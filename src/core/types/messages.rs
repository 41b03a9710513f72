//! Message types exchanged with the rest of the robot stack.
//!
//! Transport is out of scope for this crate; these are the plain payloads
//! carried over channels in-process and over the bag format on disk.

use serde::{Deserialize, Serialize};

use super::grid::OccupancyGridSnapshot;
use super::pose::Pose2D;

/// Dead-reckoned pose sample from the drive odometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdometryPose {
    /// Sample time in microseconds
    pub timestamp_us: u64,
    /// X position in meters, odometry frame
    pub x: f32,
    /// Y position in meters, odometry frame
    pub y: f32,
    /// Heading in radians
    pub theta: f32,
}

impl OdometryPose {
    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.theta)
    }
}

/// Operator-supplied pose seed used to (re)initialize the filter.
///
/// The covariance is carried for interface compatibility but does not
/// influence sampling; the jitter windows are fixed by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialPoseEstimate {
    pub pose: Pose2D,
    /// Row-major 3x3 covariance over (x, y, theta). Unused.
    pub covariance: [f32; 9],
}

impl InitialPoseEstimate {
    pub fn new(pose: Pose2D) -> Self {
        Self {
            pose,
            covariance: [0.0; 9],
        }
    }
}

/// One full revolution of range readings, bucketed per degree.
///
/// `ranges[i]` is the distance in meters at bearing `i` degrees in the
/// sensor frame; 0.0 means no return in that bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeScan {
    /// Scan time in microseconds
    pub timestamp_us: u64,
    /// One reading per degree, 360 entries
    pub ranges: Vec<f32>,
}

impl RangeScan {
    pub const BUCKETS: usize = 360;

    pub fn new(timestamp_us: u64, ranges: Vec<f32>) -> Self {
        Self {
            timestamp_us,
            ranges,
        }
    }
}

/// Corrected pose published after each completed filter cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseCorrection {
    /// Completion time of the cycle in microseconds
    pub timestamp_us: u64,
    pub pose: Pose2D,
}

/// Subsample of the particle population for visualization.
///
/// At most [`ParticleCloud::MAX_POSES`] poses, ordered by ascending weight
/// of the particles they were drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleCloud {
    pub timestamp_us: u64,
    pub poses: Vec<Pose2D>,
}

impl ParticleCloud {
    pub const MAX_POSES: usize = 30;
}

/// A timestamped input event, as carried over channels and in bag files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorEvent {
    InitialPose(InitialPoseEstimate),
    Odometry(OdometryPose),
    Scan(RangeScan),
    Grid(OccupancyGridSnapshot),
}

impl SensorEvent {
    /// Event timestamp in microseconds, where the event carries one.
    pub fn timestamp_us(&self) -> Option<u64> {
        match self {
            SensorEvent::Odometry(o) => Some(o.timestamp_us),
            SensorEvent::Scan(s) => Some(s.timestamp_us),
            SensorEvent::InitialPose(_) | SensorEvent::Grid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn test_odometry_pose_wraps_theta() {
        let o = OdometryPose {
            timestamp_us: 1,
            x: 1.0,
            y: 2.0,
            theta: 3.0 * PI,
        };
        assert_relative_eq!(o.pose().theta, PI, epsilon = 1e-6);
    }

    #[test]
    fn test_event_timestamp() {
        let scan = SensorEvent::Scan(RangeScan::new(42, vec![0.0; RangeScan::BUCKETS]));
        assert_eq!(scan.timestamp_us(), Some(42));
        let seed = SensorEvent::InitialPose(InitialPoseEstimate::new(Pose2D::identity()));
        assert_eq!(seed.timestamp_us(), None);
    }
}
