//! Pose and point types for 2D localization.

use serde::{Deserialize, Serialize};

/// A 2D point in meters, map frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters
    pub y: f32,
}

impl Point2D {
    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Polar form of this point relative to the origin: (range, bearing).
    #[inline]
    pub fn to_polar(&self) -> (f32, f32) {
        ((self.x * self.x + self.y * self.y).sqrt(), self.y.atan2(self.x))
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

/// Robot pose in 2D space.
///
/// Position (x, y) in meters and heading (theta) in radians, normalized
/// to (-π, π].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters
    pub x: f32,
    /// Y position in meters
    pub y: f32,
    /// Heading in radians, normalized to (-π, π]
    pub theta: f32,
}

impl Pose2D {
    /// Create a new pose with theta normalized to (-π, π].
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: crate::core::math::normalize_angle(theta),
        }
    }

    /// Identity pose at origin with zero heading.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Translation magnitude to another pose.
    #[inline]
    pub fn distance(&self, other: &Pose2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}
