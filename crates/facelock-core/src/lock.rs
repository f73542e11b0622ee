//! Per-frame lock state derivation.
//!
//! The decision is a pure function of the registered profile and the current
//! face. [`LockStateMachine`] only remembers the previous state so callers can
//! tell a state change apart from a repeat and avoid re-raising alerts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::landmark::LandmarkSet;
use crate::scoring::{ScoreResult, Scorer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    /// No profile registered, or no usable face in frame.
    #[default]
    Locked,
    /// Current face matches the registered profile.
    Unlocked,
    /// A face is present but does not match the registered profile.
    Unauthorized,
}

impl LockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockState::Locked => "locked",
            LockState::Unlocked => "unlocked",
            LockState::Unauthorized => "unauthorized",
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    pub previous: LockState,
    pub current: LockState,
    /// Match percentage, or 0 when no score was computed.
    pub percentage: u8,
    pub score: Option<ScoreResult>,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }

    /// True only on the evaluation that enters `Unauthorized`.
    pub fn raises_alarm(&self) -> bool {
        self.changed() && self.current == LockState::Unauthorized
    }
}

/// Decide the lock state for one frame.
///
/// An empty `face` counts as no face. An indeterminate score falls back to
/// `Locked` rather than `Unauthorized`.
pub fn decide<S: Scorer + ?Sized>(
    scorer: &S,
    auth_threshold: f32,
    profile: Option<&LandmarkSet>,
    face: Option<&LandmarkSet>,
) -> (LockState, Option<ScoreResult>) {
    let Some(profile) = profile else {
        return (LockState::Locked, None);
    };
    let Some(face) = face.filter(|f| !f.is_empty()) else {
        return (LockState::Locked, None);
    };

    let result = scorer.score(profile, face);
    if result.is_indeterminate() {
        return (LockState::Locked, Some(result));
    }

    let state = if result.distance < auth_threshold {
        LockState::Unlocked
    } else {
        LockState::Unauthorized
    };
    (state, Some(result))
}

/// Tracks the live lock state across frames.
#[derive(Debug, Clone, Default)]
pub struct LockStateMachine {
    state: LockState,
}

impl LockStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    /// Evaluate one frame and move to the resulting state.
    pub fn step<S: Scorer + ?Sized>(
        &mut self,
        scorer: &S,
        auth_threshold: f32,
        profile: Option<&LandmarkSet>,
        face: Option<&LandmarkSet>,
    ) -> Transition {
        let (next, score) = decide(scorer, auth_threshold, profile, face);
        self.apply(next, score)
    }

    /// Force `Locked`, e.g. after the registered profile changes.
    pub fn reset(&mut self) -> Transition {
        self.apply(LockState::Locked, None)
    }

    fn apply(&mut self, next: LockState, score: Option<ScoreResult>) -> Transition {
        let transition = Transition {
            previous: self.state,
            current: next,
            percentage: score.map(|s| s.percentage).unwrap_or(0),
            score,
        };
        self.state = next;

        if transition.changed() {
            tracing::debug!(
                from = %transition.previous,
                to = %transition.current,
                percentage = transition.percentage,
                "lock state transition"
            );
        }
        transition
    }
}
