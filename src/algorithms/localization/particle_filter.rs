//! Particle population: seeding, resampling, normalization, and pose
//! extraction.

use std::cmp::Ordering;
use std::f32::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::sampling::{sample_bounded, sample_windowed};
use crate::core::types::Pose2D;

/// A single pose hypothesis with its importance weight.
///
/// Weights are kept in f64; the sensor model accumulates inverse-cubed
/// range differences which overflow f32 for near-exact matches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pose: Pose2D,
    pub weight: f64,
}

impl Particle {
    pub fn new(pose: Pose2D, weight: f64) -> Self {
        Self { pose, weight }
    }
}

/// Configuration for the particle population.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Number of particles maintained across cycles
    pub particle_count: usize,
    /// Gaussian sigma for position jitter in meters
    pub xy_sigma: f32,
    /// Probability of a uniform (instead of gaussian) position draw
    pub xy_noise: f32,
    /// Half-width of the position jitter window in meters
    pub xy_window: f32,
    /// Gaussian sigma for heading jitter in radians
    pub theta_sigma: f32,
    /// Probability of a uniform heading draw
    pub theta_noise: f32,
    /// Maximum poses in the published particle cloud
    pub cloud_size: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            particle_count: 300,
            xy_sigma: 0.25,
            xy_noise: 0.01,
            xy_window: 5.0,
            theta_sigma: 0.15 * PI,
            theta_noise: 0.0,
            cloud_size: 30,
        }
    }
}

/// The full hypothesis population for one filter.
///
/// The set is replaced wholesale each cycle; its size never changes after
/// construction.
#[derive(Debug, Clone)]
pub struct ParticleSet {
    particles: Vec<Particle>,
}

impl ParticleSet {
    /// Initialize the population by jittering a single seed pose.
    ///
    /// Seeding is a resample of one unit-weight particle at the seed, so
    /// the initial spread uses exactly the resampler's jitter model.
    pub fn from_seed<R: Rng>(seed: Pose2D, config: &FilterConfig, rng: &mut R) -> Self {
        let single = Self {
            particles: vec![Particle::new(seed, 1.0)],
        };
        single.resample(config.particle_count, config, rng)
    }

    /// Draw `k` particles multinomially (with replacement, probability
    /// proportional to weight) and jitter each through the mixed
    /// normal/uniform model. Drawn particles get weight 1.
    ///
    /// The caller must guarantee at least one positive weight; the
    /// preceding normalization step enforces that.
    pub fn resample<R: Rng>(&self, k: usize, config: &FilterConfig, rng: &mut R) -> Self {
        let total: f64 = self.particles.iter().map(|p| p.weight).sum();
        debug_assert!(total > 0.0, "resample requires a positive total weight");

        let mut particles = Vec::with_capacity(k);
        for _ in 0..k {
            let drawn = self.draw_multinomial(total, rng);
            let x = sample_windowed(rng, drawn.x, config.xy_sigma, config.xy_noise, config.xy_window);
            let y = sample_windowed(rng, drawn.y, config.xy_sigma, config.xy_noise, config.xy_window);
            let theta = sample_bounded(rng, drawn.theta, config.theta_sigma, config.theta_noise, -PI, PI);
            particles.push(Particle::new(Pose2D::new(x, y, theta), 1.0));
        }
        Self { particles }
    }

    fn draw_multinomial<R: Rng>(&self, total: f64, rng: &mut R) -> Pose2D {
        let target = rng.random::<f64>() * total;
        let mut cumulative = 0.0;
        for p in &self.particles {
            cumulative += p.weight;
            if target <= cumulative {
                return p.pose;
            }
        }
        // Rounding can leave target a hair above the final cumulative sum.
        self.particles[self.particles.len() - 1].pose
    }

    /// Scale weights to sum to 1.
    ///
    /// A non-positive total (every particle scored zero against the scan)
    /// resets the population to uniform weights so the next resample stays
    /// within contract.
    pub fn normalize(&mut self) {
        let total: f64 = self.particles.iter().map(|p| p.weight).sum();
        if total > 0.0 {
            for p in &mut self.particles {
                p.weight /= total;
            }
        } else {
            log::warn!(
                "All {} particle weights are zero; resetting to uniform",
                self.particles.len()
            );
            let uniform = 1.0 / self.particles.len() as f64;
            for p in &mut self.particles {
                p.weight = uniform;
            }
        }
    }

    /// Weighted-mean pose over normalized weights.
    ///
    /// Heading is averaged as a raw scalar, not a circular mean, so the
    /// estimate degrades when the population straddles the ±π boundary.
    pub fn estimate(&self) -> Pose2D {
        let mut x = 0.0_f64;
        let mut y = 0.0_f64;
        let mut theta = 0.0_f64;
        for p in &self.particles {
            x += p.pose.x as f64 * p.weight;
            y += p.pose.y as f64 * p.weight;
            theta += p.pose.theta as f64 * p.weight;
        }
        Pose2D::new(x as f32, y as f32, theta as f32)
    }

    /// Uniform subsample (with replacement) of up to `cloud_size` poses,
    /// ordered by ascending weight of the drawn particles.
    pub fn cloud_subsample<R: Rng>(&self, config: &FilterConfig, rng: &mut R) -> Vec<Pose2D> {
        let mut drawn: Vec<Particle> = (0..config.cloud_size)
            .map(|_| self.particles[rng.random_range(0..self.particles.len())])
            .collect();
        drawn.sort_by(|a, b| a.weight.partial_cmp(&b.weight).unwrap_or(Ordering::Equal));
        drawn.into_iter().map(|p| p.pose).collect()
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
