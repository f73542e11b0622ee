//! `facelock replay`: run a recorded landmark stream through the engine offline.
//!
//! Input is JSON Lines, one event per line:
//!
//! ```text
//! {"type":"frame","timestamp_ms":33.4,"faces":[[[0.51,0.42,0.0], ...]]}
//! {"type":"register"}
//! {"type":"clear"}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. `register` uses the
//! faces of the last processed frame, like the UI's Register button.

use anyhow::{Context, Result};
use facelock_core::{FaceLock, Frame, FrameStats, LockState, ScoringConfig};
use serde::Deserialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ReplayEvent {
    Frame(Frame),
    Register,
    Clear,
}

/// A state change observed during replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayChange {
    pub line: usize,
    pub from: LockState,
    pub to: LockState,
    pub percentage: u8,
    pub alarm: bool,
}

#[derive(Debug, Default)]
pub struct ReplaySummary {
    pub state: LockState,
    pub stats: FrameStats,
    pub changes: Vec<ReplayChange>,
    pub registrations: usize,
    pub rejected_registrations: usize,
}

impl ReplaySummary {
    pub fn alarms(&self) -> usize {
        self.changes.iter().filter(|c| c.alarm).count()
    }
}

/// Replay every event from `reader` through a fresh engine.
pub fn replay<R: BufRead>(reader: R, config: ScoringConfig) -> Result<ReplaySummary> {
    let mut lock = FaceLock::new(config);
    let mut summary = ReplaySummary::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let event: ReplayEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid replay event on line {line_no}"))?;

        let transition = match event {
            ReplayEvent::Frame(frame) => lock.process_frame(&frame),
            ReplayEvent::Register => match lock.register_current() {
                Ok(t) => {
                    summary.registrations += 1;
                    Some(t)
                }
                Err(e) => {
                    tracing::warn!(line = line_no, error = %e, "register rejected");
                    summary.rejected_registrations += 1;
                    None
                }
            },
            ReplayEvent::Clear => Some(lock.clear()),
        };

        if let Some(t) = transition.filter(|t| t.changed()) {
            summary.changes.push(ReplayChange {
                line: line_no,
                from: t.previous,
                to: t.current,
                percentage: t.percentage,
                alarm: t.raises_alarm(),
            });
        }
    }

    summary.state = lock.state();
    summary.stats = lock.stats();
    Ok(summary)
}

/// Run the replay command and print state changes plus a summary.
pub fn run(path: &Path, threshold: Option<f32>, scale: Option<f32>) -> Result<()> {
    let defaults = ScoringConfig::default();
    let config = ScoringConfig {
        auth_threshold: threshold.unwrap_or(defaults.auth_threshold),
        score_scale: scale.unwrap_or(defaults.score_scale),
        ..defaults
    };

    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let summary = replay(BufReader::new(file), config)?;

    for change in &summary.changes {
        let marker = if change.alarm { "  ALARM" } else { "" };
        println!(
            "  line {:>5}: {} -> {} ({}%){marker}",
            change.line, change.from, change.to, change.percentage
        );
    }

    println!();
    println!(
        "Replay complete: {} frame(s) processed, {} skipped, {} state change(s), {} alarm(s).",
        summary.stats.frames_processed,
        summary.stats.frames_skipped,
        summary.changes.len(),
        summary.alarms()
    );
    if summary.rejected_registrations > 0 {
        println!(
            "{} registration(s) rejected: no usable face in frame.",
            summary.rejected_registrations
        );
    }
    println!("Final state: {}", summary.state);

    Ok(())
}
