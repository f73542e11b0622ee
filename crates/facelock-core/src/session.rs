use serde::Serialize;

use crate::error::FaceLockError;
use crate::landmark::{Frame, LandmarkSet};
use crate::lock::{LockState, LockStateMachine, Transition};
use crate::registration::{RegisteredProfile, RegistrationStore};
use crate::scoring::{AnchorRelativeScorer, Scorer, ScoringConfig};

/// Frame counters since the session started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub frames_processed: u64,
    /// Frames dropped because their capture timestamp had not advanced.
    pub frames_skipped: u64,
}

/// Single-owner face lock session, driven once per rendered frame.
///
/// Owns the registered profile and the lock state. Not shared across
/// threads; the daemon keeps it on a dedicated engine thread.
pub struct FaceLock {
    config: ScoringConfig,
    scorer: Box<dyn Scorer>,
    store: RegistrationStore,
    machine: LockStateMachine,
    last_timestamp_ms: Option<f64>,
    last_faces: Vec<LandmarkSet>,
    last_percentage: u8,
    stats: FrameStats,
}

impl FaceLock {
    pub fn new(config: ScoringConfig) -> Self {
        let scorer = Box::new(AnchorRelativeScorer::from_config(&config));
        Self::with_scorer(config, scorer)
    }

    pub fn with_scorer(config: ScoringConfig, scorer: Box<dyn Scorer>) -> Self {
        Self {
            config,
            scorer,
            store: RegistrationStore::new(),
            machine: LockStateMachine::new(),
            last_timestamp_ms: None,
            last_faces: Vec::new(),
            last_percentage: 0,
            stats: FrameStats::default(),
        }
    }

    /// Evaluate one landmark source result.
    ///
    /// Returns `None` without touching any state when the frame's capture
    /// timestamp has not advanced past the last processed frame.
    pub fn process_frame(&mut self, frame: &Frame) -> Option<Transition> {
        let stale = match self.last_timestamp_ms {
            _ if !frame.timestamp_ms.is_finite() => true,
            Some(last) => frame.timestamp_ms <= last,
            None => false,
        };
        if stale {
            self.stats.frames_skipped += 1;
            tracing::trace!(timestamp_ms = frame.timestamp_ms, "frame skipped");
            return None;
        }

        self.last_timestamp_ms = Some(frame.timestamp_ms);
        self.stats.frames_processed += 1;

        let transition = self.machine.step(
            self.scorer.as_ref(),
            self.config.auth_threshold,
            self.store.current(),
            frame.primary_face(),
        );
        self.last_faces.clone_from(&frame.faces);
        self.last_percentage = transition.percentage;

        tracing::trace!(
            timestamp_ms = frame.timestamp_ms,
            faces = frame.faces.len(),
            state = %transition.current,
            percentage = transition.percentage,
            "frame evaluated"
        );
        Some(transition)
    }

    /// Register the first face in `faces` and drop back to `Locked`.
    pub fn register(&mut self, faces: &[LandmarkSet]) -> Result<Transition, FaceLockError> {
        self.store
            .register(faces, &self.config.key_points, self.config.anchor)?;
        self.last_percentage = 0;
        Ok(self.machine.reset())
    }

    /// Register the first face of the most recently processed frame.
    pub fn register_current(&mut self) -> Result<Transition, FaceLockError> {
        let faces = std::mem::take(&mut self.last_faces);
        let result = self.register(&faces);
        self.last_faces = faces;
        result
    }

    /// Drop the registered profile. Always succeeds.
    pub fn clear(&mut self) -> Transition {
        self.store.clear();
        self.last_percentage = 0;
        self.machine.reset()
    }

    pub fn state(&self) -> LockState {
        self.machine.state()
    }

    /// Similarity percentage behind the current state. Zero after a
    /// registration or clear until the next evaluated frame.
    pub fn last_percentage(&self) -> u8 {
        self.last_percentage
    }

    pub fn profile(&self) -> Option<&RegisteredProfile> {
        self.store.profile()
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

impl Default for FaceLock {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}
