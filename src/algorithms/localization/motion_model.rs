//! Odometry-driven motion prediction.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::particle_filter::ParticleSet;
use super::sampling::sample_error;
use crate::core::math::normalize_angle;
use crate::core::types::Pose2D;

/// Dead-reckoned displacement between two consecutive odometry poses,
/// expressed in the agent's local frame.
///
/// Computed as previous minus current; the heading update in
/// [`MotionModel::apply`] compensates by decrementing theta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdometryDelta {
    pub dx: f32,
    pub dy: f32,
    pub dtheta: f32,
}

impl OdometryDelta {
    /// Delta between two odometry poses, previous minus current.
    pub fn between(previous: &Pose2D, current: &Pose2D) -> Self {
        Self {
            dx: previous.x - current.x,
            dy: previous.y - current.y,
            dtheta: normalize_angle(previous.theta - current.theta),
        }
    }

    /// Translation magnitude in meters.
    #[inline]
    pub fn translation(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }
}

/// Configuration for motion noise.
#[derive(Debug, Clone)]
pub struct MotionModelConfig {
    /// Gaussian sigma applied to each displacement component
    pub sigma: f32,
}

impl Default for MotionModelConfig {
    fn default() -> Self {
        Self { sigma: 0.15 }
    }
}

/// Applies a noisy odometry displacement to the whole population.
#[derive(Debug, Clone, Default)]
pub struct MotionModel {
    config: MotionModelConfig,
}

impl MotionModel {
    pub fn new(config: MotionModelConfig) -> Self {
        Self { config }
    }

    /// Shift every particle by one shared noisy sample of `delta`.
    ///
    /// The noise is drawn once per cycle, not once per particle; the
    /// per-particle diversity comes from resampling jitter instead. The
    /// perturbed local displacement is rotated into the world frame by the
    /// perturbed rotation and added to every pose, and every heading is
    /// decremented by the perturbed rotation. Weights are unchanged.
    pub fn apply<R: Rng>(&self, set: &ParticleSet, delta: &OdometryDelta, rng: &mut R) -> ParticleSet {
        let dx = sample_error(rng, delta.dx, self.config.sigma);
        let dy = sample_error(rng, delta.dy, self.config.sigma);
        let dtheta = sample_error(rng, delta.dtheta, self.config.sigma);

        let (sin, cos) = dtheta.sin_cos();
        let world_dx = cos * dx - sin * dy;
        let world_dy = sin * dx + cos * dy;

        let mut out = set.clone();
        for p in out.particles_mut() {
            p.pose.x += world_dx;
            p.pose.y += world_dy;
            let theta = p.pose.theta - dtheta;
            p.pose.theta = if theta > std::f32::consts::PI || theta <= -std::f32::consts::PI {
                normalize_angle(theta)
            } else {
                theta
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::localization::particle_filter::FilterConfig;
    use approx::assert_relative_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn seeded_set(rng: &mut SmallRng) -> ParticleSet {
        ParticleSet::from_seed(Pose2D::new(1.0, -1.0, 0.3), &FilterConfig::default(), rng)
    }

    #[test]
    fn test_delta_between() {
        let prev = Pose2D::new(1.0, 2.0, 0.5);
        let curr = Pose2D::new(1.5, 1.0, 0.2);
        let d = OdometryDelta::between(&prev, &curr);
        assert_relative_eq!(d.dx, -0.5);
        assert_relative_eq!(d.dy, 1.0);
        assert_relative_eq!(d.dtheta, 0.3);
    }

    #[test]
    fn test_delta_theta_wraps() {
        let prev = Pose2D::new(0.0, 0.0, PI - 0.1);
        let curr = Pose2D::new(0.0, 0.0, -PI + 0.1);
        let d = OdometryDelta::between(&prev, &curr);
        assert_relative_eq!(d.dtheta, -0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_delta_zero_sigma_is_identity() {
        let mut rng = SmallRng::seed_from_u64(21);
        let set = seeded_set(&mut rng);
        let model = MotionModel::new(MotionModelConfig { sigma: 0.0 });
        let delta = OdometryDelta {
            dx: 0.0,
            dy: 0.0,
            dtheta: 0.0,
        };
        let out = model.apply(&set, &delta, &mut rng);
        for (a, b) in set.particles().iter().zip(out.particles()) {
            assert_eq!(a.pose.x.to_bits(), b.pose.x.to_bits());
            assert_eq!(a.pose.y.to_bits(), b.pose.y.to_bits());
            assert_eq!(a.pose.theta.to_bits(), b.pose.theta.to_bits());
        }
    }

    #[test]
    fn test_shared_draw_moves_population_identically() {
        let mut rng = SmallRng::seed_from_u64(22);
        let set = seeded_set(&mut rng);
        let model = MotionModel::default();
        let delta = OdometryDelta {
            dx: 0.5,
            dy: 0.0,
            dtheta: 0.1,
        };
        let out = model.apply(&set, &delta, &mut rng);
        let shift_x = out.particles()[0].pose.x - set.particles()[0].pose.x;
        let shift_y = out.particles()[0].pose.y - set.particles()[0].pose.y;
        for (a, b) in set.particles().iter().zip(out.particles()) {
            assert_relative_eq!(b.pose.x - a.pose.x, shift_x, epsilon = 1e-5);
            assert_relative_eq!(b.pose.y - a.pose.y, shift_y, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_rotation_applied_to_displacement() {
        let mut rng = SmallRng::seed_from_u64(23);
        let set = ParticleSet::from_seed(
            Pose2D::identity(),
            &FilterConfig {
                particle_count: 1,
                xy_sigma: 0.0,
                xy_noise: 0.0,
                theta_sigma: 0.0,
                theta_noise: 0.0,
                ..FilterConfig::default()
            },
            &mut rng,
        );
        let model = MotionModel::new(MotionModelConfig { sigma: 0.0 });
        let delta = OdometryDelta {
            dx: 1.0,
            dy: 0.0,
            dtheta: FRAC_PI_2,
        };
        let out = model.apply(&set, &delta, &mut rng);
        let p = out.particles()[0].pose;
        // (1, 0) rotated by +90 degrees lands on (0, 1).
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.theta, -FRAC_PI_2, epsilon = 1e-6);
    }

    #[test]
    fn test_weights_unchanged() {
        let mut rng = SmallRng::seed_from_u64(24);
        let mut set = seeded_set(&mut rng);
        set.particles_mut()[5].weight = 7.5;
        let model = MotionModel::default();
        let delta = OdometryDelta {
            dx: 0.2,
            dy: 0.1,
            dtheta: 0.0,
        };
        let out = model.apply(&set, &delta, &mut rng);
        for (a, b) in set.particles().iter().zip(out.particles()) {
            assert_eq!(a.weight, b.weight);
        }
    }
}
