//! facelock-core: landmark similarity scoring and lock state engine.
//!
//! Compares the facial landmarks of each incoming frame against a single
//! registered reference face and derives a lock state from the result.
//! Landmark detection and rendering live outside this crate; everything here
//! is synchronous and allocation-light so it can run inside a per-frame
//! callback.

pub mod error;
pub mod landmark;
pub mod lock;
pub mod registration;
pub mod scoring;
pub mod session;

pub use error::FaceLockError;
pub use landmark::{Frame, LandmarkPoint, LandmarkSet};
pub use lock::{LockState, LockStateMachine, Transition};
pub use registration::{RegisteredProfile, RegistrationStore};
pub use scoring::{
    score, AnchorRelativeScorer, ScoreResult, Scorer, ScoringConfig, ANCHOR_INDEX,
    AUTH_THRESHOLD, KEY_POINT_INDICES, SCORE_SCALE,
};
pub use session::{FaceLock, FrameStats};

/// Deterministic face meshes for tests, shared with the daemon and CLI crates
/// through the `test-support` feature.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use crate::landmark::{LandmarkPoint, LandmarkSet};
    use crate::scoring::{ANCHOR_INDEX, KEY_POINT_INDICES};

    /// Number of points in a full face mesh.
    pub const MESH_POINTS: usize = 478;

    /// Deterministic full-mesh face with distinct coordinates per index.
    pub fn face() -> LandmarkSet {
        (0..MESH_POINTS)
            .map(|i| {
                LandmarkPoint::new(
                    0.3 + (i % 17) as f32 * 0.02,
                    0.2 + (i % 23) as f32 * 0.025,
                )
            })
            .collect()
    }

    /// [`face`] with every key point except the anchor moved by `(dx, dy)`.
    pub fn face_with_key_offset(dx: f32, dy: f32) -> LandmarkSet {
        let base = face();
        base.points()
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i != ANCHOR_INDEX && KEY_POINT_INDICES.contains(&i) {
                    LandmarkPoint::new(p.x + dx, p.y + dy)
                } else {
                    *p
                }
            })
            .collect()
    }
}
