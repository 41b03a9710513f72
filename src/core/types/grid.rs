//! Occupancy grid snapshot as delivered by the map service.

use serde::{Deserialize, Serialize};

/// A static occupancy grid received from the map provider.
///
/// Cells are row-major (`col + row * width`). Values follow the usual
/// occupancy convention: > 0 occupied, 0 free, < 0 unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyGridSnapshot {
    /// Grid width in cells
    pub width: u32,
    /// Grid height in cells
    pub height: u32,
    /// Cell edge length in meters
    pub resolution: f32,
    /// Map-frame X of the grid origin (cell 0,0) in meters
    pub origin_x: f32,
    /// Map-frame Y of the grid origin in meters
    pub origin_y: f32,
    /// Rotation of the grid relative to the map frame, radians
    pub origin_theta: f32,
    /// Row-major occupancy values, one per cell
    pub cells: Vec<i8>,
}

impl OccupancyGridSnapshot {
    /// Occupancy value at (col, row), or None if out of bounds.
    pub fn cell(&self, col: u32, row: u32) -> Option<i8> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells.get((col + row * self.width) as usize).copied()
    }
}
