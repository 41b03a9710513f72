//! Randomized draws shared by the initial sampler, resampler, and motion
//! model.
//!
//! All randomness in the filter flows through one injected RNG so that a
//! fixed seed reproduces an entire run.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Bounded mixed draw around `center`.
///
/// With probability `noise` the value is drawn uniformly from
/// `[center - window, center + window)`; otherwise it is drawn from
/// `Normal(center, sigma)` and clamped into the window. `noise` of 0
/// makes this a clamped gaussian, `noise` of 1 a pure uniform.
pub fn sample_windowed<R: Rng>(
    rng: &mut R,
    center: f32,
    sigma: f32,
    noise: f32,
    window: f32,
) -> f32 {
    let low = center - window;
    let high = center + window;
    if noise > 0.0 && rng.random::<f32>() < noise {
        rng.random_range(low..high)
    } else {
        let draw: f32 = rng.sample(StandardNormal);
        (center + sigma * draw).clamp(low, high)
    }
}

/// Bounded mixed draw over an absolute interval `[low, high)`.
///
/// Same mixture as [`sample_windowed`] but the bounds do not move with
/// `center`. Used for heading jitter, whose interval is always (-π, π).
pub fn sample_bounded<R: Rng>(
    rng: &mut R,
    center: f32,
    sigma: f32,
    noise: f32,
    low: f32,
    high: f32,
) -> f32 {
    if noise > 0.0 && rng.random::<f32>() < noise {
        rng.random_range(low..high)
    } else {
        let draw: f32 = rng.sample(StandardNormal);
        (center + sigma * draw).clamp(low, high)
    }
}

/// Unbounded gaussian perturbation of `value`.
///
/// The motion model's error draw has no bounding window, so the uniform
/// branch of the mixture cannot apply and this reduces to a plain
/// `Normal(value, sigma)` sample.
pub fn sample_error<R: Rng>(rng: &mut R, value: f32, sigma: f32) -> f32 {
    let draw: f32 = rng.sample(StandardNormal);
    value + sigma * draw
}

/// Construct the filter RNG from a configured seed.
///
/// A seed of 0 selects a time-based seed, so repeated runs differ unless
/// a seed is pinned explicitly.
pub fn create_rng(seed: u64) -> SmallRng {
    let seed = if seed == 0 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        seed
    };
    SmallRng::seed_from_u64(seed)
}
