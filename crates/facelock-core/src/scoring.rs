//! Anchor-relative landmark similarity.
//!
//! Every key point is expressed as a displacement from the anchor (nose tip)
//! in its own set, and the two displacement fields are compared point by
//! point. This cancels the face's absolute position in the frame.
//!
//! # Known limitations
//!
//! - **Translation:** invariant.
//! - **Scale:** not invariant. Moving closer to or farther from the camera
//!   changes every displacement proportionally and lowers the score.
//! - **Rotation:** not invariant. Head roll or yaw moves key points relative
//!   to the anchor.
//!
//! The calibration constants are empirical. [`SCORE_SCALE`] maps an average
//! relative distance of 0 to 100% and 0.125 to 0%.

use serde::{Deserialize, Serialize};

use crate::landmark::LandmarkSet;

/// Average relative distance below which a face is authorized.
pub const AUTH_THRESHOLD: f32 = 0.08;

/// Multiplier mapping average relative distance onto a percentage drop.
pub const SCORE_SCALE: f32 = 800.0;

/// Landmark indices compared by the scorer: nose tip, outer eye corners,
/// mouth corners, lower lip, forehead, chin.
pub const KEY_POINT_INDICES: [usize; 8] = [1, 33, 263, 61, 291, 199, 10, 152];

/// Landmark used as the translation origin (nose tip).
pub const ANCHOR_INDEX: usize = 1;

/// Tunable scoring parameters. Defaults are the named constants above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub auth_threshold: f32,
    pub score_scale: f32,
    pub key_points: Vec<usize>,
    pub anchor: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            auth_threshold: AUTH_THRESHOLD,
            score_scale: SCORE_SCALE,
            key_points: KEY_POINT_INDICES.to_vec(),
            anchor: ANCHOR_INDEX,
        }
    }
}

/// Outcome of comparing two landmark sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    /// Mean Euclidean distance between anchor-relative key points.
    pub distance: f32,
    /// `clamp(0, 100, round(100 - distance * scale))`.
    pub percentage: u8,
    /// Number of key points present in both sets, anchor included.
    pub compared: usize,
}

impl ScoreResult {
    /// Sentinel for comparisons with no usable key point besides the anchor.
    pub const fn indeterminate() -> Self {
        Self {
            distance: f32::INFINITY,
            percentage: 0,
            compared: 0,
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        self.compared == 0
    }
}

/// Compares a reference face against the current one.
pub trait Scorer: Send + Sync {
    fn score(&self, reference: &LandmarkSet, current: &LandmarkSet) -> ScoreResult;
}

/// Euclidean comparison of key points after subtracting each set's anchor.
#[derive(Debug, Clone)]
pub struct AnchorRelativeScorer {
    key_points: Vec<usize>,
    anchor: usize,
    scale: f32,
}

impl AnchorRelativeScorer {
    pub fn new(key_points: Vec<usize>, anchor: usize, scale: f32) -> Self {
        Self {
            key_points,
            anchor,
            scale,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.key_points.clone(), config.anchor, config.score_scale)
    }
}

impl Default for AnchorRelativeScorer {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl Scorer for AnchorRelativeScorer {
    fn score(&self, reference: &LandmarkSet, current: &LandmarkSet) -> ScoreResult {
        let (Some(ref_anchor), Some(cur_anchor)) =
            (reference.get(self.anchor), current.get(self.anchor))
        else {
            return ScoreResult::indeterminate();
        };

        let mut total = 0.0f32;
        let mut compared = 0usize;
        // The anchor always matches itself; it cannot carry a comparison alone.
        let mut informative = 0usize;

        for &index in &self.key_points {
            // A key point missing on either side is skipped, not fatal.
            let (Some(ref_point), Some(cur_point)) = (reference.get(index), current.get(index))
            else {
                continue;
            };
            if index != self.anchor {
                informative += 1;
            }

            let (ref_dx, ref_dy) = ref_point.relative_to(ref_anchor);
            let (cur_dx, cur_dy) = cur_point.relative_to(cur_anchor);
            let dx = cur_dx - ref_dx;
            let dy = cur_dy - ref_dy;
            total += (dx * dx + dy * dy).sqrt();
            compared += 1;
        }

        if informative == 0 {
            return ScoreResult::indeterminate();
        }

        let distance = total / compared as f32;
        if !distance.is_finite() {
            return ScoreResult::indeterminate();
        }

        ScoreResult {
            distance,
            percentage: percentage_for(distance, self.scale),
            compared,
        }
    }
}

/// Score two sets with the default key points, anchor and scale.
pub fn score(reference: &LandmarkSet, current: &LandmarkSet) -> ScoreResult {
    AnchorRelativeScorer::default().score(reference, current)
}

fn percentage_for(distance: f32, scale: f32) -> u8 {
    (100.0 - distance * scale).round().clamp(0.0, 100.0) as u8
}
