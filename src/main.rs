//! disha-loc - Monte Carlo localization daemon for indoor mobile robots.
//!
//! Runs the particle filter against a known static map, fed either from a
//! recorded bag file or from the built-in simulated scenario.
//!
//! # Usage
//!
//! ```bash
//! # Simulated scenario with default config
//! cargo run --release
//!
//! # Replay a recorded run
//! cargo run --release -- --config disha-loc.toml
//! ```

use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use serde::Deserialize;

use disha_loc::core::types::{OccupancyGridSnapshot, SensorEvent};
use disha_loc::io::{BagPlayer, BagRecorder, ChannelMapSource, Scenario, ScenarioConfig};
use disha_loc::state::create_shared_state;
use disha_loc::threads::{
    LocalizationThread, LocalizationThreadConfig, PublisherThread, PublisherThreadConfig, Update,
};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Deserialize, Default)]
struct Config {
    #[serde(default)]
    source: SourceConfig,
    #[serde(default)]
    filter: FilterCfg,
    #[serde(default)]
    output: OutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SourceConfig {
    /// Bag file to replay; the simulated scenario runs when unset.
    bag: Option<String>,
    /// Replay with original inter-event timing.
    realtime: bool,
    /// Record the input stream to this bag file.
    record: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            bag: None,
            realtime: true,
            record: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FilterCfg {
    /// RNG seed; 0 selects a time-based seed.
    seed: u64,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { seed: 0 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct OutputConfig {
    /// Publish rate (Hz).
    rate_hz: f32,
    /// Seconds between status log lines.
    status_interval_secs: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            rate_hz: 10.0,
            status_interval_secs: 10,
        }
    }
}

// ============================================================================
// CLI Arguments
// ============================================================================

struct Args {
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args { config_path: None };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    result.config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    result
}

fn print_help() {
    println!("disha-loc - Monte Carlo localization daemon");
    println!();
    println!("USAGE:");
    println!("    disha-loc [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>     Configuration file (default: disha-loc.toml)");
    println!("    -h, --help              Print help information");
    println!();
    println!("CONFIGURATION:");
    println!("    All settings are configured via the TOML config file:");
    println!("    - [source] bag, realtime, record: input selection");
    println!("    - [filter] seed: RNG seed (0 = time-based)");
    println!("    - [output] rate_hz: publish rate");
    println!();
    println!("THREADS:");
    println!("    The daemon runs with 2 fixed threads:");
    println!("    - Localization Thread: filter cycles per odometry sample");
    println!("    - Publisher Thread: forwards the latest pose estimate");
}

fn load_config(args: &Args) -> Config {
    match &args.config_path {
        Some(path) => match fs::read_to_string(path) {
            Ok(contents) => match basic_toml::from_str(&contents) {
                Ok(cfg) => {
                    log::info!("Loaded config from {}", path);
                    cfg
                }
                Err(e) => {
                    log::warn!("Failed to parse config {}: {}", path, e);
                    Config::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read config {}: {}", path, e);
                Config::default()
            }
        },
        None => {
            for path in &["disha-loc.toml", "/etc/disha-loc.toml"] {
                if let Ok(contents) = fs::read_to_string(path) {
                    if let Ok(cfg) = basic_toml::from_str(&contents) {
                        log::info!("Loaded config from {}", path);
                        return cfg;
                    }
                }
            }
            Config::default()
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = parse_args();
    let config = load_config(&args);

    log::info!("disha-loc starting");
    match config.source.bag {
        Some(ref bag) => log::info!("  Input: bag file {}", bag),
        None => log::info!("  Input: simulated scenario"),
    }
    if let Some(ref record) = config.source.record {
        log::info!("  Recording input to {}", record);
    }
    log::info!("  Publish rate: {} Hz", config.output.rate_hz);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .expect("Error setting Ctrl-C handler");

    if let Err(e) = run_threaded_mode(&config, running) {
        log::error!("Daemon error: {}", e);
    }

    log::info!("disha-loc shutdown complete");
}

// ============================================================================
// Multi-Threaded Daemon
// ============================================================================

fn run_threaded_mode(
    config: &Config,
    running: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Initializing localization daemon...");

    // 1. Create shared state
    let shared_state = create_shared_state();
    log::info!("  Shared state initialized");

    // 2. Create channels
    let (map_tx, map_rx) = bounded(1);
    let (event_tx, event_rx) = unbounded();
    let (update_tx, update_rx) = unbounded();
    log::info!("  Channels created");

    // 3. Spawn localization thread
    let localization = LocalizationThread::spawn(
        LocalizationThreadConfig {
            seed: config.filter.seed,
            ..LocalizationThreadConfig::default()
        },
        Box::new(ChannelMapSource::new(map_rx)),
        event_rx,
        Arc::clone(&shared_state),
        Arc::clone(&running),
    );
    log::info!("  Localization thread spawned");

    // 4. Spawn publisher thread
    let publisher = PublisherThread::spawn(
        PublisherThreadConfig {
            rate_hz: config.output.rate_hz,
            status_interval_secs: config.output.status_interval_secs,
        },
        Arc::clone(&shared_state),
        update_tx,
        Arc::clone(&running),
    );
    log::info!("  Publisher thread spawned");

    // 5. Feed the input stream on this thread
    feed_events(config, &map_tx, &event_tx, &update_rx, &running)?;

    // 6. Close the input; the localization thread drains and exits
    drop(event_tx);
    drop(map_tx);
    localization.join().map_err(|_| "localization thread panicked")?;
    running.store(false, Ordering::Relaxed);

    // 7. Drain any remaining updates, then stop the publisher
    while let Ok(update) = update_rx.try_recv() {
        log_update(&update);
    }
    publisher.join().map_err(|_| "publisher thread panicked")?;

    Ok(())
}

/// Pump events from the bag or the simulated scenario into the daemon,
/// logging published estimates as they appear.
fn feed_events(
    config: &Config,
    map_tx: &Sender<OccupancyGridSnapshot>,
    event_tx: &Sender<SensorEvent>,
    update_rx: &Receiver<Update>,
    running: &Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut recorder = match &config.source.record {
        Some(path) => Some(BagRecorder::create(path)?),
        None => None,
    };

    let events: Vec<SensorEvent> = match &config.source.bag {
        Some(path) => {
            let mut player = BagPlayer::open(path)?;
            log::info!(
                "  Bag: {} events over {:.1} s",
                player.header().event_count,
                player.header().duration_us() as f64 / 1e6
            );
            let mut events = Vec::new();
            while let Some(event) = player.next_event()? {
                events.push(event);
            }
            events
        }
        None => Scenario::new(ScenarioConfig::default()).events(),
    };

    let mut last_timestamp_us: Option<u64> = None;
    for event in events {
        if !running.load(Ordering::Relaxed) {
            break;
        }

        if let Some(rec) = recorder.as_mut() {
            rec.record(&event)?;
        }

        if config.source.realtime {
            if let Some(timestamp) = event.timestamp_us() {
                if let Some(last) = last_timestamp_us {
                    let gap_us = timestamp.saturating_sub(last).min(1_000_000);
                    std::thread::sleep(Duration::from_micros(gap_us));
                }
                last_timestamp_us = Some(timestamp);
            }
        }

        match event {
            SensorEvent::Grid(grid) => {
                // Only the first grid matters; the map is static.
                let _ = map_tx.try_send(grid);
            }
            other => {
                if event_tx.send(other).is_err() {
                    break;
                }
            }
        }

        while let Ok(update) = update_rx.try_recv() {
            log_update(&update);
        }
    }

    if let Some(rec) = recorder {
        let header = rec.finish()?;
        log::info!("  Recorded {} events", header.event_count);
    }
    Ok(())
}

fn log_update(update: &Update) {
    match update {
        Update::Correction(c) => log::info!(
            "Pose: ({:.3}, {:.3}, {:.3}) at {} us",
            c.pose.x,
            c.pose.y,
            c.pose.theta,
            c.timestamp_us
        ),
        Update::Cloud(cloud) => {
            log::debug!("Cloud: {} poses at {} us", cloud.poses.len(), cloud.timestamp_us)
        }
    }
}
