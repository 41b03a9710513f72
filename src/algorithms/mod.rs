//! Algorithm layer: map preprocessing and the localization filter.

pub mod localization;
pub mod mapping;
