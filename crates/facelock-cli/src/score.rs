//! `facelock score`: compare two landmark sets stored as JSON.

use anyhow::{Context, Result};
use facelock_core::{AnchorRelativeScorer, LandmarkSet, ScoreResult, Scorer, ScoringConfig};
use std::fs;
use std::path::Path;

fn load_landmarks(path: &Path) -> Result<LandmarkSet> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of landmark points", path.display()))
}

fn verdict(result: &ScoreResult, threshold: f32) -> &'static str {
    if result.is_indeterminate() {
        "indeterminate (anchor or key points missing)"
    } else if result.distance < threshold {
        "match"
    } else {
        "no match"
    }
}

pub fn run(reference: &Path, current: &Path, scale: Option<f32>) -> Result<()> {
    let defaults = ScoringConfig::default();
    let config = ScoringConfig {
        score_scale: scale.unwrap_or(defaults.score_scale),
        ..defaults
    };

    let reference = load_landmarks(reference)?;
    let current = load_landmarks(current)?;
    let result = AnchorRelativeScorer::from_config(&config).score(&reference, &current);

    println!("distance:   {:.5}", result.distance);
    println!("percentage: {}%", result.percentage);
    println!("compared:   {}/{}", result.compared, config.key_points.len());
    println!(
        "verdict:    {} (threshold {})",
        verdict(&result, config.auth_threshold),
        config.auth_threshold
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict() {
        let close = ScoreResult {
            distance: 0.01,
            percentage: 92,
            compared: 8,
        };
        let far = ScoreResult {
            distance: 0.2,
            percentage: 0,
            compared: 8,
        };
        assert_eq!(verdict(&close, 0.08), "match");
        assert_eq!(verdict(&far, 0.08), "no match");
        assert!(verdict(&ScoreResult::indeterminate(), 0.08).starts_with("indeterminate"));
    }

    #[test]
    fn test_load_landmarks_reads_point_arrays() {
        let dir = std::env::temp_dir().join(format!(
            "facelock-score-test-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("face.json");
        fs::write(&path, "[[0.5, 0.5], [0.4, 0.45, 0.01]]").unwrap();

        let set = load_landmarks(&path).unwrap();
        assert_eq!(set.len(), 2);

        fs::write(&path, "{\"not\": \"a set\"}").unwrap();
        assert!(load_landmarks(&path).is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
