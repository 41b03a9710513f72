//! Monte Carlo localization core.
//!
//! One cycle per accepted odometry delta: resample the previous
//! population, shift it by the noisy motion, re-weight against the latest
//! scan, normalize, and extract the weighted-mean pose. Orchestration and
//! input guards live in the engine layer; this module is pure filter math.

pub mod motion_model;
pub mod particle_filter;
pub mod sampling;
pub mod sensor_model;

pub use motion_model::{MotionModel, MotionModelConfig, OdometryDelta};
pub use particle_filter::{FilterConfig, Particle, ParticleSet};
pub use sensor_model::{RangeComparisonModel, SensorModel, SensorModelConfig};
