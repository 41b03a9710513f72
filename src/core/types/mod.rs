//! Core data types shared across all layers.

pub mod grid;
pub mod messages;
pub mod pose;

pub use grid::OccupancyGridSnapshot;
pub use messages::{
    InitialPoseEstimate, OdometryPose, ParticleCloud, PoseCorrection, RangeScan, SensorEvent,
};
pub use pose::{Point2D, Pose2D};
