//! Filter cycle orchestration and input guards.

use std::time::Instant;

use rand::rngs::SmallRng;

use crate::algorithms::localization::{
    FilterConfig, MotionModel, MotionModelConfig, OdometryDelta, ParticleSet,
    RangeComparisonModel, SensorModel, SensorModelConfig,
};
use crate::algorithms::mapping::ObstacleMap;
use crate::core::types::{
    InitialPoseEstimate, OdometryPose, ParticleCloud, PoseCorrection, RangeScan,
};

/// Configuration for the localization engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub filter: FilterConfig,
    pub motion: MotionModelConfig,
    pub sensor: SensorModelConfig,
    /// Minimum translation in meters before a cycle runs
    pub min_translation: f32,
    /// Minimum |rotation| in radians before a cycle runs
    pub min_rotation: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            motion: MotionModelConfig::default(),
            sensor: SensorModelConfig::default(),
            min_translation: 0.01,
            min_rotation: 0.05,
        }
    }
}

/// Outputs of one completed filter cycle.
#[derive(Debug, Clone)]
pub struct CycleOutput {
    pub correction: PoseCorrection,
    pub cloud: ParticleCloud,
}

/// Owns the particle population and runs one filter cycle per accepted
/// odometry sample.
///
/// The engine is single-owner: exactly one thread drives it. The
/// reentrancy flag and stale-stamp guard exist so that odometry arriving
/// mid-cycle (through a reentrant callback) or out of order is dropped,
/// never queued.
pub struct LocalizationEngine {
    config: EngineConfig,
    motion_model: MotionModel,
    sensor_model: RangeComparisonModel,
    rng: SmallRng,
    set: Option<ParticleSet>,
    last_odometry: Option<OdometryPose>,
    latest_scan: Option<RangeScan>,
    last_cycle_us: u64,
    is_updating: bool,
    cycles_completed: u64,
    odometry_dropped: u64,
}

impl LocalizationEngine {
    pub fn new(map: ObstacleMap, config: EngineConfig, rng: SmallRng) -> Self {
        let motion_model = MotionModel::new(config.motion.clone());
        let sensor_model = RangeComparisonModel::new(map, config.sensor.clone());
        Self {
            config,
            motion_model,
            sensor_model,
            rng,
            set: None,
            last_odometry: None,
            latest_scan: None,
            last_cycle_us: 0,
            is_updating: false,
            cycles_completed: 0,
            odometry_dropped: 0,
        }
    }

    /// (Re)seed the population around an operator-supplied pose.
    ///
    /// Discards the current population. The covariance on the estimate is
    /// ignored; spread comes from the configured jitter.
    pub fn handle_initial_pose(&mut self, estimate: &InitialPoseEstimate) {
        log::info!(
            "Initializing {} particles around ({:.2}, {:.2}, {:.2})",
            self.config.filter.particle_count,
            estimate.pose.x,
            estimate.pose.y,
            estimate.pose.theta
        );
        self.set = Some(ParticleSet::from_seed(
            estimate.pose,
            &self.config.filter,
            &mut self.rng,
        ));
        self.last_odometry = None;
    }

    /// Record the latest scan. Last one wins; scans never trigger a cycle.
    pub fn set_scan(&mut self, scan: RangeScan) {
        self.latest_scan = Some(scan);
    }

    /// Process one odometry sample, running a full filter cycle if it
    /// passes the guards.
    ///
    /// Returns `None` when the sample is dropped (mid-cycle arrival,
    /// stale stamp, no population yet, first baseline sample) or skipped
    /// for insufficient motion. On a skip the previous sample is kept as
    /// the delta baseline, so small motions accumulate until they cross a
    /// threshold.
    pub fn handle_odometry(&mut self, odometry: &OdometryPose) -> Option<CycleOutput> {
        if self.is_updating {
            log::debug!("Cycle in flight; dropping odometry at {}", odometry.timestamp_us);
            self.odometry_dropped += 1;
            return None;
        }
        if odometry.timestamp_us < self.last_cycle_us {
            log::debug!(
                "Stale odometry at {} (last cycle at {}); dropping",
                odometry.timestamp_us,
                self.last_cycle_us
            );
            self.odometry_dropped += 1;
            return None;
        }
        if self.set.is_none() {
            self.last_odometry = Some(*odometry);
            return None;
        }
        let previous = match self.last_odometry {
            Some(p) => p,
            None => {
                self.last_odometry = Some(*odometry);
                return None;
            }
        };

        let delta = OdometryDelta::between(&previous.pose(), &odometry.pose());
        if delta.translation() < self.config.min_translation
            && delta.dtheta.abs() < self.config.min_rotation
        {
            return None;
        }
        let previous_set = match self.set.take() {
            Some(s) => s,
            None => return None,
        };

        self.is_updating = true;
        let started = Instant::now();
        let output = self.run_cycle(previous_set, &delta, odometry.timestamp_us);
        self.last_odometry = Some(*odometry);
        self.last_cycle_us = odometry.timestamp_us;
        self.cycles_completed += 1;
        self.is_updating = false;

        log::debug!(
            "Cycle {} done in {:.1} ms (delta {:.3} m / {:.3} rad)",
            self.cycles_completed,
            started.elapsed().as_secs_f64() * 1000.0,
            delta.translation(),
            delta.dtheta
        );
        Some(output)
    }

    fn run_cycle(&mut self, previous: ParticleSet, delta: &OdometryDelta, timestamp_us: u64) -> CycleOutput {
        let resampled =
            previous.resample(self.config.filter.particle_count, &self.config.filter, &mut self.rng);
        let moved = self.motion_model.apply(&resampled, delta, &mut self.rng);
        let mut weighted = moved;
        self.sensor_model
            .weigh(&mut weighted, self.latest_scan.as_ref());
        weighted.normalize();

        let correction = PoseCorrection {
            timestamp_us,
            pose: weighted.estimate(),
        };
        let cloud = ParticleCloud {
            timestamp_us,
            poses: weighted.cloud_subsample(&self.config.filter, &mut self.rng),
        };

        self.set = Some(weighted);
        CycleOutput { correction, cloud }
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn odometry_dropped(&self) -> u64 {
        self.odometry_dropped
    }

    pub fn has_population(&self) -> bool {
        self.set.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::localization::sampling::create_rng;
    use crate::core::types::{OccupancyGridSnapshot, Pose2D};
    use approx::assert_relative_eq;

    fn test_engine() -> LocalizationEngine {
        let grid = OccupancyGridSnapshot {
            width: 3,
            height: 1,
            resolution: 1.0,
            origin_x: 2.0,
            origin_y: 0.0,
            origin_theta: 0.0,
            cells: vec![100, 0, 100],
        };
        let map = ObstacleMap::from_snapshot(&grid);
        LocalizationEngine::new(map, EngineConfig::default(), create_rng(42))
    }

    fn odom(timestamp_us: u64, x: f32, y: f32, theta: f32) -> OdometryPose {
        OdometryPose {
            timestamp_us,
            x,
            y,
            theta,
        }
    }

    #[test]
    fn test_odometry_before_init_is_dropped() {
        let mut engine = test_engine();
        assert!(!engine.has_population());
        assert!(engine.handle_odometry(&odom(1, 0.0, 0.0, 0.0)).is_none());
        assert!(engine.handle_odometry(&odom(2, 1.0, 0.0, 0.0)).is_none());
        assert_eq!(engine.cycles_completed(), 0);
    }

    #[test]
    fn test_first_sample_is_baseline_only() {
        let mut engine = test_engine();
        engine.handle_initial_pose(&InitialPoseEstimate::new(Pose2D::identity()));
        assert!(engine.handle_odometry(&odom(1, 0.0, 0.0, 0.0)).is_none());
        let out = engine.handle_odometry(&odom(2, 0.5, 0.0, 0.0));
        assert!(out.is_some());
        assert_eq!(engine.cycles_completed(), 1);
    }

    #[test]
    fn test_small_motion_accumulates() {
        let mut engine = test_engine();
        engine.handle_initial_pose(&InitialPoseEstimate::new(Pose2D::identity()));
        engine.handle_odometry(&odom(1, 0.0, 0.0, 0.0));
        // Each step is below threshold but the baseline does not advance,
        // so the third sample crosses it.
        assert!(engine.handle_odometry(&odom(2, 0.005, 0.0, 0.0)).is_none());
        assert!(engine.handle_odometry(&odom(3, 0.009, 0.0, 0.0)).is_none());
        assert!(engine.handle_odometry(&odom(4, 0.02, 0.0, 0.0)).is_some());
    }

    #[test]
    fn test_rotation_alone_triggers_cycle() {
        let mut engine = test_engine();
        engine.handle_initial_pose(&InitialPoseEstimate::new(Pose2D::identity()));
        engine.handle_odometry(&odom(1, 0.0, 0.0, 0.0));
        assert!(engine.handle_odometry(&odom(2, 0.0, 0.0, -0.1)).is_some());
    }

    #[test]
    fn test_stale_odometry_dropped() {
        let mut engine = test_engine();
        engine.handle_initial_pose(&InitialPoseEstimate::new(Pose2D::identity()));
        engine.handle_odometry(&odom(100, 0.0, 0.0, 0.0));
        assert!(engine.handle_odometry(&odom(200, 0.5, 0.0, 0.0)).is_some());
        assert!(engine.handle_odometry(&odom(150, 1.0, 0.0, 0.0)).is_none());
        assert_eq!(engine.odometry_dropped(), 1);
    }

    #[test]
    fn test_cycle_without_scan_keeps_uniform_weights() {
        let mut engine = test_engine();
        engine.handle_initial_pose(&InitialPoseEstimate::new(Pose2D::identity()));
        engine.handle_odometry(&odom(1, 0.0, 0.0, 0.0));
        let out = engine.handle_odometry(&odom(2, 0.5, 0.0, 0.0));
        assert!(out.is_some());
        let set = engine.set.as_ref().expect("population exists");
        let uniform = 1.0 / set.len() as f64;
        for p in set.particles() {
            assert_relative_eq!(p.weight, uniform, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_scan_does_not_trigger_cycle() {
        let mut engine = test_engine();
        engine.handle_initial_pose(&InitialPoseEstimate::new(Pose2D::identity()));
        engine.set_scan(RangeScan::new(1, vec![0.0; RangeScan::BUCKETS]));
        assert_eq!(engine.cycles_completed(), 0);
    }

    #[test]
    fn test_output_shapes() {
        let mut engine = test_engine();
        engine.handle_initial_pose(&InitialPoseEstimate::new(Pose2D::identity()));
        engine.handle_odometry(&odom(1, 0.0, 0.0, 0.0));
        let out = engine
            .handle_odometry(&odom(2, 0.5, 0.0, 0.0))
            .expect("cycle runs");
        assert_eq!(out.correction.timestamp_us, 2);
        assert_eq!(out.cloud.poses.len(), ParticleCloud::MAX_POSES);
    }
}
