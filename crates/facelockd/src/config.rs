use facelock_core::{ScoringConfig, AUTH_THRESHOLD, SCORE_SCALE};

/// Well-known bus name claimed by the daemon.
pub const BUS_NAME: &str = "org.facelock.FaceLock1";
/// Object path the service is served at.
pub const OBJECT_PATH: &str = "/org/facelock/FaceLock1";

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Mean anchor-relative distance below which a face is authorized.
    pub auth_threshold: f32,
    /// Multiplier mapping distance onto the match percentage.
    pub score_scale: f32,
    /// Capacity of the engine request queue.
    pub frame_queue: usize,
    /// Whether the daemon is running on the session bus (development mode).
    pub session_bus: bool,
}

impl Config {
    /// Load configuration from `FACELOCK_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            auth_threshold: env_f32("FACELOCK_AUTH_THRESHOLD", AUTH_THRESHOLD),
            score_scale: env_f32("FACELOCK_SCORE_SCALE", SCORE_SCALE),
            frame_queue: env_usize("FACELOCK_FRAME_QUEUE", 8).max(1),
            session_bus: std::env::var("FACELOCK_SESSION_BUS").is_ok(),
        }
    }

    /// Scoring parameters for the engine; key points and anchor are fixed.
    pub fn scoring(&self) -> ScoringConfig {
        ScoringConfig {
            auth_threshold: self.auth_threshold,
            score_scale: self.score_scale,
            ..ScoringConfig::default()
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_keeps_fixed_key_points() {
        let config = Config {
            auth_threshold: 0.1,
            score_scale: 500.0,
            frame_queue: 4,
            session_bus: true,
        };
        let scoring = config.scoring();
        assert_eq!(scoring.auth_threshold, 0.1);
        assert_eq!(scoring.score_scale, 500.0);
        assert_eq!(scoring.key_points, ScoringConfig::default().key_points);
        assert_eq!(scoring.anchor, ScoringConfig::default().anchor);
    }

    #[test]
    fn test_env_f32_rejects_garbage() {
        assert_eq!(env_f32("FACELOCK_TEST_UNSET_VARIABLE", 0.08), 0.08);
        std::env::set_var("FACELOCK_TEST_NEGATIVE_THRESHOLD", "-1");
        assert_eq!(env_f32("FACELOCK_TEST_NEGATIVE_THRESHOLD", 0.08), 0.08);
        std::env::set_var("FACELOCK_TEST_VALID_THRESHOLD", "0.12");
        assert_eq!(env_f32("FACELOCK_TEST_VALID_THRESHOLD", 0.08), 0.12);
    }
}
