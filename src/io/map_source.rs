//! Map acquisition at the crate boundary.

use crossbeam_channel::Receiver;
use thiserror::Error;

use crate::core::types::OccupancyGridSnapshot;

#[derive(Debug, Error)]
pub enum MapSourceError {
    #[error("map source disconnected before delivering a map")]
    Disconnected,
}

/// Provides the static map the filter localizes against.
///
/// `fetch` blocks until a map is available, with no timeout. Startup
/// hangs forever if the provider never answers; that matches the
/// map-service semantics this daemon integrates with and is accepted as
/// a liveness risk rather than papered over with a retry loop.
pub trait MapSource {
    fn fetch(&mut self) -> Result<OccupancyGridSnapshot, MapSourceError>;
}

/// Map source backed by a channel, fed by playback or simulation.
pub struct ChannelMapSource {
    receiver: Receiver<OccupancyGridSnapshot>,
}

impl ChannelMapSource {
    pub fn new(receiver: Receiver<OccupancyGridSnapshot>) -> Self {
        Self { receiver }
    }
}

impl MapSource for ChannelMapSource {
    fn fetch(&mut self) -> Result<OccupancyGridSnapshot, MapSourceError> {
        log::info!("Waiting for static map");
        self.receiver.recv().map_err(|_| MapSourceError::Disconnected)
    }
}
