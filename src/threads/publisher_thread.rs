//! Publisher thread.
//!
//! Polls shared state at a fixed rate and forwards new filter outputs to
//! the subscriber channel. Only the latest estimate is ever forwarded;
//! a slow subscriber sees fewer updates, never stale ones.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

use crate::core::types::{ParticleCloud, PoseCorrection};
use crate::state::SharedStateHandle;

/// An output forwarded to subscribers.
#[derive(Debug, Clone)]
pub enum Update {
    Correction(PoseCorrection),
    Cloud(ParticleCloud),
}

/// Configuration for the publisher thread.
#[derive(Debug, Clone)]
pub struct PublisherThreadConfig {
    /// Poll/publish rate in Hz
    pub rate_hz: f32,
    /// Seconds between status log lines
    pub status_interval_secs: u64,
}

impl Default for PublisherThreadConfig {
    fn default() -> Self {
        Self {
            rate_hz: 10.0,
            status_interval_secs: 10,
        }
    }
}

/// Publisher thread handle.
pub struct PublisherThread {
    handle: JoinHandle<()>,
}

impl PublisherThread {
    /// Spawn the publisher thread.
    pub fn spawn(
        config: PublisherThreadConfig,
        shared_state: SharedStateHandle,
        updates: Sender<Update>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("publisher".into())
            .spawn(move || {
                run_loop(config, shared_state, updates, running);
            })
            .expect("Failed to spawn publisher thread");

        Self { handle }
    }

    /// Wait for the thread to finish.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

fn run_loop(
    config: PublisherThreadConfig,
    shared_state: SharedStateHandle,
    updates: Sender<Update>,
    running: Arc<AtomicBool>,
) {
    log::info!("Publisher thread starting at {} Hz", config.rate_hz);
    let period = Duration::from_secs_f32(1.0 / config.rate_hz.max(0.1));
    let status_interval = Duration::from_secs(config.status_interval_secs.max(1));

    let mut last_sent_us = 0u64;
    let mut last_status = Instant::now();

    while running.load(Ordering::Relaxed) {
        thread::sleep(period);

        let (correction, cloud, cycles, dropped) = match shared_state.read() {
            Ok(state) => (
                state.latest_correction(),
                state.latest_cloud(),
                state.cycles_completed(),
                state.odometry_dropped(),
            ),
            Err(_) => break,
        };

        if let Some(correction) = correction {
            if correction.timestamp_us > last_sent_us {
                last_sent_us = correction.timestamp_us;
                if updates.send(Update::Correction(correction)).is_err() {
                    log::info!("Subscriber disconnected; publisher thread exiting");
                    return;
                }
                if let Some(cloud) = cloud {
                    if updates.send(Update::Cloud(cloud)).is_err() {
                        log::info!("Subscriber disconnected; publisher thread exiting");
                        return;
                    }
                }
            }
        }

        if last_status.elapsed() >= status_interval {
            last_status = Instant::now();
            log::info!("Status: {} cycles completed, {} odometry dropped", cycles, dropped);
        }
    }

    log::info!("Publisher thread stopped");
}
