//! Engine layer: owns the filter state and applies the input guards.

pub mod localizer;

pub use localizer::{CycleOutput, EngineConfig, LocalizationEngine};
