//! Thread management for the localization daemon.
//!
//! Two threads:
//! - `LocalizationThread`: blocks for the map, then runs filter cycles
//!   from the sensor event channel
//! - `PublisherThread`: forwards the latest outputs to subscribers at a
//!   fixed rate

mod localization_thread;
mod publisher_thread;

pub use localization_thread::{LocalizationThread, LocalizationThreadConfig};
pub use publisher_thread::{PublisherThread, PublisherThreadConfig, Update};
