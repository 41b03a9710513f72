//! Monte Carlo localization for indoor mobile robots.
//!
//! Estimates a robot's pose on a known static occupancy grid from noisy
//! odometry and 360-degree range scans, using a fixed-size particle
//! population. One filter cycle runs per accepted odometry sample:
//! resample the previous population, shift it by the noisy motion,
//! re-weight against the latest scan, normalize, and publish the
//! weighted-mean pose.
//!
//! # Architecture
//!
//! The crate is organized into 6 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   threads/                          │  ← Thread infrastructure
//! │         (localization, publisher)                   │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │              io/            state/                  │  ← Infrastructure
//! │     (map source, bag, sim)  (shared state)          │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │           (cycle driver, input guards)              │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  algorithms/                        │  ← Core algorithms
//! │            (mapping, localization)                  │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │                 (types, math)                       │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod algorithms;
pub mod core;
pub mod engine;
pub mod io;
pub mod state;
pub mod threads;

pub use algorithms::localization::{FilterConfig, Particle, ParticleSet};
pub use algorithms::mapping::ObstacleMap;
pub use core::types::{Pose2D, PoseCorrection, RangeScan, SensorEvent};
pub use engine::{EngineConfig, LocalizationEngine};
