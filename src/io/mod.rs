//! I/O layer: map acquisition, bag files, and the built-in scenario.

pub mod bag;
pub mod map_source;
pub mod sim;

pub use bag::{BagError, BagPlayer, BagRecorder};
pub use map_source::{ChannelMapSource, MapSource, MapSourceError};
pub use sim::{Scenario, ScenarioConfig};
