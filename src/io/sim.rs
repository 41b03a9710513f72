//! Synthetic scenario generation for offline runs.
//!
//! Builds a walled rectangular room and a straight drive through it,
//! synthesizing scans with the same expected-range routine the filter
//! weights against. The daemon falls back to this when no bag is given.

use crate::algorithms::localization::{RangeComparisonModel, SensorModelConfig};
use crate::algorithms::mapping::ObstacleMap;
use crate::core::types::{
    InitialPoseEstimate, OccupancyGridSnapshot, OdometryPose, Pose2D, RangeScan, SensorEvent,
};

/// Configuration for the built-in scenario.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Room width in meters
    pub room_width: f32,
    /// Room height in meters
    pub room_height: f32,
    /// Grid resolution in meters per cell
    pub resolution: f32,
    /// Distance driven between odometry samples, meters
    pub step: f32,
    /// Number of drive steps
    pub steps: usize,
    /// Time between odometry samples, microseconds
    pub period_us: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            room_width: 4.0,
            room_height: 4.0,
            resolution: 0.1,
            step: 0.05,
            steps: 30,
            period_us: 100_000,
        }
    }
}

/// A walled room plus a drive through it.
pub struct Scenario {
    config: ScenarioConfig,
    grid: OccupancyGridSnapshot,
    model: RangeComparisonModel,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> Self {
        let grid = build_room(&config);
        let map = ObstacleMap::from_snapshot(&grid);
        let model = RangeComparisonModel::new(map, SensorModelConfig::default());
        Self {
            config,
            grid,
            model,
        }
    }

    pub fn grid(&self) -> &OccupancyGridSnapshot {
        &self.grid
    }

    /// The full event stream: grid, initial pose at the room center, then
    /// a scan and an odometry sample per drive step. Scans are the
    /// noise-free expected ranges from the true pose, so a converged
    /// filter scores the true pose highest.
    pub fn events(&self) -> Vec<SensorEvent> {
        let start = Pose2D::new(
            self.config.room_width / 2.0,
            self.config.room_height / 2.0,
            0.0,
        );
        // Stop short of the far wall regardless of step count.
        let max_travel = self.config.room_width / 2.0 - 2.0 * self.config.resolution;

        let mut events = vec![
            SensorEvent::Grid(self.grid.clone()),
            SensorEvent::InitialPose(InitialPoseEstimate::new(start)),
        ];

        let mut timestamp_us = self.config.period_us;
        for i in 0..=self.config.steps {
            let travel = (i as f32 * self.config.step).min(max_travel);
            let pose = Pose2D::new(start.x + travel, start.y, start.theta);

            events.push(SensorEvent::Scan(RangeScan::new(
                timestamp_us,
                self.model.expected_ranges(&pose),
            )));
            events.push(SensorEvent::Odometry(OdometryPose {
                timestamp_us,
                x: pose.x,
                y: pose.y,
                theta: pose.theta,
            }));
            timestamp_us += self.config.period_us;
        }
        events
    }
}

fn build_room(config: &ScenarioConfig) -> OccupancyGridSnapshot {
    let width = (config.room_width / config.resolution).round() as u32;
    let height = (config.room_height / config.resolution).round() as u32;
    let mut cells = vec![0i8; (width * height) as usize];
    for row in 0..height {
        for col in 0..width {
            if row == 0 || row == height - 1 || col == 0 || col == width - 1 {
                cells[(col + row * width) as usize] = 100;
            }
        }
    }
    OccupancyGridSnapshot {
        width,
        height,
        resolution: config.resolution,
        origin_x: 0.0,
        origin_y: 0.0,
        origin_theta: 0.0,
        cells,
    }
}
