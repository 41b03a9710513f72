//! Obstacle extraction from an occupancy grid snapshot.
//!
//! The filter never touches the grid directly; it works against the flat
//! list of occupied-cell coordinates produced here, built once at startup.

use crate::core::types::{OccupancyGridSnapshot, Point2D};

/// Map-frame coordinates of every occupied cell of a static grid.
#[derive(Debug, Clone)]
pub struct ObstacleMap {
    points: Vec<Point2D>,
    resolution: f32,
}

impl ObstacleMap {
    /// Build the obstacle set from a grid snapshot.
    ///
    /// A cell at column c, row r with occupancy > 0 contributes the point
    /// `(c * resolution + origin_x, r * resolution + origin_y)`. Free and
    /// unknown cells contribute nothing. A rotated grid origin is not
    /// compensated for; it degrades accuracy and is logged once.
    pub fn from_snapshot(grid: &OccupancyGridSnapshot) -> Self {
        if grid.origin_theta != 0.0 {
            log::warn!(
                "Map origin has non-zero rotation {:.4} rad; obstacle coordinates will be skewed",
                grid.origin_theta
            );
        }

        let mut points = Vec::new();
        for row in 0..grid.height {
            for col in 0..grid.width {
                let idx = (col + row * grid.width) as usize;
                if grid.cells[idx] > 0 {
                    points.push(Point2D::new(
                        col as f32 * grid.resolution + grid.origin_x,
                        row as f32 * grid.resolution + grid.origin_y,
                    ));
                }
            }
        }

        log::info!(
            "Obstacle map: {} occupied of {} cells ({}x{} @ {:.3} m)",
            points.len(),
            grid.cells.len(),
            grid.width,
            grid.height,
            grid.resolution
        );

        Self {
            points,
            resolution: grid.resolution,
        }
    }

    /// Occupied-cell coordinates in the map frame.
    #[inline]
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Grid resolution the map was built from, in meters.
    #[inline]
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }
}
