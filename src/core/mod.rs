//! Foundation layer: data types and math utilities.
//!
//! Nothing in this module depends on any other layer of the crate.

pub mod math;
pub mod types;
