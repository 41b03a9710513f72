//! Localization thread.
//!
//! Blocks for the static map, then drives the engine from the sensor
//! event channel. Every guard decision (mid-cycle drop, stale stamp,
//! insufficient motion) happens inside the engine; this thread only moves
//! data and mirrors cycle outputs into shared state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, Receiver};

use crate::algorithms::localization::sampling::create_rng;
use crate::algorithms::mapping::ObstacleMap;
use crate::core::types::SensorEvent;
use crate::engine::{EngineConfig, LocalizationEngine};
use crate::io::MapSource;
use crate::state::SharedStateHandle;

/// Configuration for the localization thread.
#[derive(Debug, Clone)]
pub struct LocalizationThreadConfig {
    pub engine: EngineConfig,
    /// RNG seed; 0 selects a time-based seed
    pub seed: u64,
}

impl Default for LocalizationThreadConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            seed: 0,
        }
    }
}

/// Localization thread handle.
pub struct LocalizationThread {
    handle: JoinHandle<()>,
}

impl LocalizationThread {
    /// Spawn the localization thread.
    pub fn spawn(
        config: LocalizationThreadConfig,
        map_source: Box<dyn MapSource + Send>,
        events: Receiver<SensorEvent>,
        shared_state: SharedStateHandle,
        running: Arc<AtomicBool>,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("localization".into())
            .spawn(move || {
                run_loop(config, map_source, events, shared_state, running);
            })
            .expect("Failed to spawn localization thread");

        Self { handle }
    }

    /// Wait for the thread to finish.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

fn run_loop(
    config: LocalizationThreadConfig,
    mut map_source: Box<dyn MapSource + Send>,
    events: Receiver<SensorEvent>,
    shared_state: SharedStateHandle,
    running: Arc<AtomicBool>,
) {
    log::info!("Localization thread starting");

    // Startup blocks here until the map provider answers.
    let grid = match map_source.fetch() {
        Ok(grid) => grid,
        Err(e) => {
            log::error!("Map acquisition failed: {}", e);
            return;
        }
    };
    let map = ObstacleMap::from_snapshot(&grid);
    let mut engine = LocalizationEngine::new(map, config.engine, create_rng(config.seed));

    while running.load(Ordering::Relaxed) {
        select! {
            recv(events) -> event => match event {
                Ok(event) => handle_event(&mut engine, event, &shared_state),
                Err(_) => {
                    log::info!("Event channel closed; localization thread exiting");
                    break;
                }
            },
            default(Duration::from_millis(100)) => {}
        }
    }

    log::info!(
        "Localization thread stopped after {} cycles ({} odometry samples dropped)",
        engine.cycles_completed(),
        engine.odometry_dropped()
    );
}

fn handle_event(
    engine: &mut LocalizationEngine,
    event: SensorEvent,
    shared_state: &SharedStateHandle,
) {
    match event {
        SensorEvent::InitialPose(estimate) => engine.handle_initial_pose(&estimate),
        SensorEvent::Scan(scan) => engine.set_scan(scan),
        SensorEvent::Odometry(odometry) => {
            let dropped_before = engine.odometry_dropped();
            if let Some(output) = engine.handle_odometry(&odometry) {
                if let Ok(mut state) = shared_state.write() {
                    state.record_cycle(&output);
                }
            } else if engine.odometry_dropped() > dropped_before {
                if let Ok(mut state) = shared_state.write() {
                    state.record_dropped_odometry();
                }
            }
        }
        // The map is static; later grids on the event stream are ignored.
        SensorEvent::Grid(_) => log::debug!("Ignoring grid event after startup"),
    }
}
