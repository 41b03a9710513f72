//! Range-scan likelihood weighting.

use crate::algorithms::localization::particle_filter::ParticleSet;
use crate::algorithms::mapping::ObstacleMap;
use crate::core::math::bearing_to_bucket;
use crate::core::types::{Point2D, Pose2D, RangeScan};

/// Assigns importance weights to a population given the latest scan.
pub trait SensorModel {
    /// Overwrite every particle's weight in place. A `None` scan means no
    /// reading has ever arrived; every weight becomes the neutral 1.0.
    /// Weights are not normalized here.
    fn weigh(&self, set: &mut ParticleSet, scan: Option<&RangeScan>);
}

/// Configuration for expected-vs-actual range comparison.
#[derive(Debug, Clone)]
pub struct SensorModelConfig {
    /// Ranges beyond this many meters are treated as "no return" (0.0)
    pub cutoff: f32,
}

impl Default for SensorModelConfig {
    fn default() -> Self {
        Self { cutoff: 3.0 }
    }
}

/// Weights particles by comparing the scan against the ranges the map
/// predicts from each particle's pose.
#[derive(Debug, Clone)]
pub struct RangeComparisonModel {
    map: ObstacleMap,
    config: SensorModelConfig,
}

impl RangeComparisonModel {
    pub fn new(map: ObstacleMap, config: SensorModelConfig) -> Self {
        Self { map, config }
    }

    /// Ranges the sensor should report from `pose`, one per degree.
    ///
    /// Each obstacle is shifted to be relative to the pose, converted to
    /// polar, its bearing taken relative to the heading, and binned into
    /// its one-degree bucket. Ranges beyond the cutoff collapse to 0.0
    /// before the per-bucket minimum, so a distant obstacle can shadow a
    /// nearer one in the same bucket. Buckets with no obstacle are 0.0.
    pub fn expected_ranges(&self, pose: &Pose2D) -> Vec<f32> {
        let mut expected = vec![f32::NAN; RangeScan::BUCKETS];
        for point in self.map.points() {
            let relative = Point2D::new(point.x - pose.x, point.y - pose.y);
            let (mut rho, phi) = relative.to_polar();
            let bucket = bearing_to_bucket(phi - pose.theta);
            if rho > self.config.cutoff {
                rho = 0.0;
            }
            if expected[bucket].is_nan() || rho < expected[bucket] {
                expected[bucket] = rho;
            }
        }
        for e in &mut expected {
            if e.is_nan() {
                *e = 0.0;
            }
        }
        expected
    }

    /// Likelihood score of one pose against the scan.
    ///
    /// Sum of inverse-cubed absolute range differences over every bucket
    /// where the sensor actually returned something and the difference is
    /// non-zero. Accumulated in f64; a few near-exact buckets overflow
    /// f32. A pose matching the scan in no bucket scores 0.0 (the score
    /// is discontinuous at exact matches, which drop out of the sum).
    pub fn score(&self, pose: &Pose2D, scan: &RangeScan) -> f64 {
        let expected = self.expected_ranges(pose);
        let mut weight = 0.0_f64;
        for (bucket, &actual) in scan.ranges.iter().take(RangeScan::BUCKETS).enumerate() {
            if actual <= 0.0 {
                continue;
            }
            let diff = (actual - expected[bucket]).abs() as f64;
            if diff > 0.0 {
                weight += (1.0 / diff).powi(3);
            }
        }
        weight
    }
}

impl SensorModel for RangeComparisonModel {
    fn weigh(&self, set: &mut ParticleSet, scan: Option<&RangeScan>) {
        match scan {
            Some(scan) => {
                for p in set.particles_mut() {
                    p.weight = self.score(&p.pose, scan);
                }
            }
            None => {
                for p in set.particles_mut() {
                    p.weight = 1.0;
                }
            }
        }
    }
}
