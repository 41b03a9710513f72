//! State shared between the localization thread and the publisher.

use std::sync::{Arc, RwLock};

use crate::core::types::{ParticleCloud, PoseCorrection};
use crate::engine::CycleOutput;

/// Latest filter outputs plus run counters.
///
/// Written by the localization thread after each completed cycle, read by
/// the publisher thread at its own rate. Only the latest values are kept.
#[derive(Debug, Default)]
pub struct SharedState {
    latest_correction: Option<PoseCorrection>,
    latest_cloud: Option<ParticleCloud>,
    cycles_completed: u64,
    odometry_dropped: u64,
}

impl SharedState {
    pub fn record_cycle(&mut self, output: &CycleOutput) {
        self.latest_correction = Some(output.correction);
        self.latest_cloud = Some(output.cloud.clone());
        self.cycles_completed += 1;
    }

    pub fn record_dropped_odometry(&mut self) {
        self.odometry_dropped += 1;
    }

    pub fn latest_correction(&self) -> Option<PoseCorrection> {
        self.latest_correction
    }

    pub fn latest_cloud(&self) -> Option<ParticleCloud> {
        self.latest_cloud.clone()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn odometry_dropped(&self) -> u64 {
        self.odometry_dropped
    }
}

/// Shared handle used by all threads.
pub type SharedStateHandle = Arc<RwLock<SharedState>>;

pub fn create_shared_state() -> SharedStateHandle {
    Arc::new(RwLock::new(SharedState::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Pose2D;

    #[test]
    fn test_record_cycle_replaces_latest() {
        let mut state = SharedState::default();
        assert!(state.latest_correction().is_none());

        let output = CycleOutput {
            correction: PoseCorrection {
                timestamp_us: 10,
                pose: Pose2D::new(1.0, 0.0, 0.0),
            },
            cloud: ParticleCloud {
                timestamp_us: 10,
                poses: vec![Pose2D::identity()],
            },
        };
        state.record_cycle(&output);
        let output2 = CycleOutput {
            correction: PoseCorrection {
                timestamp_us: 20,
                pose: Pose2D::new(2.0, 0.0, 0.0),
            },
            cloud: ParticleCloud {
                timestamp_us: 20,
                poses: vec![],
            },
        };
        state.record_cycle(&output2);

        let latest = state.latest_correction().expect("correction recorded");
        assert_eq!(latest.timestamp_us, 20);
        assert_eq!(state.cycles_completed(), 2);
    }

    #[test]
    fn test_handle_is_shareable() {
        let handle = create_shared_state();
        let clone = Arc::clone(&handle);
        clone
            .write()
            .expect("lock poisoned")
            .record_dropped_odometry();
        assert_eq!(handle.read().expect("lock poisoned").odometry_dropped(), 1);
    }
}
