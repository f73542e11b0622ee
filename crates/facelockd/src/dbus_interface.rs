use facelock_core::{Frame, LandmarkPoint, LandmarkSet, LockState, Transition};
use tokio::sync::Mutex;
use zbus::interface;
use zbus::object_server::SignalEmitter;

use crate::config::Config;
use crate::engine::EngineHandle;

/// D-Bus interface for the FaceLock daemon.
///
/// Bus name: org.facelock.FaceLock1
/// Object path: /org/facelock/FaceLock1
pub struct FaceLockService {
    config: Config,
    engine: EngineHandle,
    /// Held from the engine request until its signals are out, so listeners
    /// see transitions in the order the engine applied them.
    ordered: Mutex<()>,
}

/// Outbound notification derived from one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    StateChanged { state: LockState, percentage: u32 },
    Alarm { percentage: u32 },
}

/// Signals owed for `transition`; nothing when the state did not change.
fn signals_for(transition: &Transition) -> Vec<Signal> {
    if !transition.changed() {
        return Vec::new();
    }
    let percentage = u32::from(transition.percentage);
    let mut signals = vec![Signal::StateChanged {
        state: transition.current,
        percentage,
    }];
    if transition.raises_alarm() {
        signals.push(Signal::Alarm { percentage });
    }
    signals
}

/// Convert wire landmarks into a frame; an empty array means no face.
fn frame_from_wire(timestamp_ms: f64, landmarks: &[(f64, f64, f64)]) -> Frame {
    if landmarks.is_empty() {
        return Frame::empty(timestamp_ms);
    }
    let face: LandmarkSet = landmarks
        .iter()
        .map(|&(x, y, z)| LandmarkPoint::with_z(x as f32, y as f32, z as f32))
        .collect();
    Frame::new(timestamp_ms, vec![face])
}

impl FaceLockService {
    pub fn new(config: Config, engine: EngineHandle) -> Self {
        Self {
            config,
            engine,
            ordered: Mutex::new(()),
        }
    }

    /// Notify listeners of a state change; alarms fire only on entering `Unauthorized`.
    async fn announce(emitter: &SignalEmitter<'_>, transition: &Transition) {
        for signal in signals_for(transition) {
            match signal {
                Signal::StateChanged { state, percentage } => {
                    tracing::info!(
                        from = %transition.previous,
                        to = %state,
                        percentage,
                        "state changed"
                    );
                    if let Err(e) = Self::state_changed(emitter, state.as_str(), percentage).await
                    {
                        tracing::error!(error = %e, "failed to emit StateChanged");
                    }
                }
                Signal::Alarm { percentage } => {
                    tracing::warn!(percentage, "unauthorized face detected");
                    if let Err(e) = Self::alarm(emitter, percentage).await {
                        tracing::error!(error = %e, "failed to emit Alarm");
                    }
                }
            }
        }
    }
}

#[interface(name = "org.facelock.FaceLock1")]
impl FaceLockService {
    /// Submit the landmarks of one processed video frame.
    ///
    /// Returns the live state, the match percentage behind it (0 when nothing
    /// was scored) and whether the frame was skipped as stale.
    async fn submit_frame(
        &self,
        timestamp_ms: f64,
        landmarks: Vec<(f64, f64, f64)>,
        #[zbus(signal_emitter)] emitter: SignalEmitter<'_>,
    ) -> zbus::fdo::Result<(String, u32, bool)> {
        let frame = frame_from_wire(timestamp_ms, &landmarks);
        let _ordered = self.ordered.lock().await;
        let outcome = self.engine.submit_frame(frame).await.map_err(|e| {
            tracing::error!(error = %e, "submit_frame failed");
            zbus::fdo::Error::Failed(e.to_string())
        })?;

        let Some(transition) = outcome.transition else {
            return Ok((outcome.state.to_string(), u32::from(outcome.percentage), true));
        };

        Self::announce(&emitter, &transition).await;
        Ok((
            transition.current.to_string(),
            u32::from(transition.percentage),
            false,
        ))
    }

    /// Register the face currently in frame as the reference profile.
    ///
    /// Returns the UUID of the new profile.
    async fn register(
        &self,
        #[zbus(signal_emitter)] emitter: SignalEmitter<'_>,
    ) -> zbus::fdo::Result<String> {
        tracing::info!("register requested");
        let _ordered = self.ordered.lock().await;
        let outcome = self.engine.register().await.map_err(|e| {
            tracing::warn!(error = %e, "register failed");
            zbus::fdo::Error::Failed(e.to_string())
        })?;

        Self::announce(&emitter, &outcome.transition).await;
        tracing::info!(profile_id = %outcome.profile_id, "registered successfully");
        Ok(outcome.profile_id)
    }

    /// Drop the registered profile. Always succeeds while the engine runs.
    async fn clear_profile(
        &self,
        #[zbus(signal_emitter)] emitter: SignalEmitter<'_>,
    ) -> zbus::fdo::Result<()> {
        tracing::info!("clear_profile requested");
        let _ordered = self.ordered.lock().await;
        let transition = self.engine.clear().await.map_err(|e| {
            tracing::error!(error = %e, "clear_profile failed");
            zbus::fdo::Error::Failed(e.to_string())
        })?;
        Self::announce(&emitter, &transition).await;
        Ok(())
    }

    /// Return daemon status information as JSON.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let status = self
            .engine
            .status()
            .await
            .map_err(|e| zbus::fdo::Error::Failed(e.to_string()))?;

        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "state": status.state,
            "registered": status.registered,
            "profile_id": status.profile_id,
            "registered_at": status.registered_at,
            "frames_processed": status.stats.frames_processed,
            "frames_skipped": status.stats.frames_skipped,
            "auth_threshold": self.config.auth_threshold,
            "score_scale": self.config.score_scale,
        })
        .to_string())
    }

    #[zbus(signal)]
    async fn state_changed(
        emitter: &SignalEmitter<'_>,
        state: &str,
        percentage: u32,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn alarm(emitter: &SignalEmitter<'_>, percentage: u32) -> zbus::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_wire_landmarks_mean_no_face() {
        let frame = frame_from_wire(12.5, &[]);
        assert_eq!(frame.timestamp_ms, 12.5);
        assert!(frame.primary_face().is_none());
    }

    #[test]
    fn test_wire_landmarks_become_single_face() {
        let frame = frame_from_wire(1.0, &[(0.25, 0.5, -0.1), (0.75, 0.5, 0.0)]);
        assert_eq!(frame.faces.len(), 1);
        let face = frame.primary_face().unwrap();
        assert_eq!(face.len(), 2);
        assert_eq!(face.get(0), Some(&LandmarkPoint::with_z(0.25, 0.5, -0.1)));
    }

    fn transition(previous: LockState, current: LockState, percentage: u8) -> Transition {
        Transition {
            previous,
            current,
            percentage,
            score: None,
        }
    }

    #[test]
    fn test_unchanged_state_emits_nothing() {
        for state in [LockState::Locked, LockState::Unlocked, LockState::Unauthorized] {
            assert!(signals_for(&transition(state, state, 42)).is_empty());
        }
    }

    #[test]
    fn test_entering_unauthorized_emits_state_then_alarm() {
        let signals = signals_for(&transition(LockState::Unlocked, LockState::Unauthorized, 12));
        assert_eq!(
            signals,
            vec![
                Signal::StateChanged {
                    state: LockState::Unauthorized,
                    percentage: 12,
                },
                Signal::Alarm { percentage: 12 },
            ]
        );
    }

    #[test]
    fn test_unlock_emits_state_only() {
        let signals = signals_for(&transition(LockState::Locked, LockState::Unlocked, 97));
        assert_eq!(
            signals,
            vec![Signal::StateChanged {
                state: LockState::Unlocked,
                percentage: 97,
            }]
        );
    }
}
