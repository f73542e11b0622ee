use chrono::{DateTime, Utc};
use facelock_core::{
    FaceLock, FaceLockError, Frame, FrameStats, LockState, ScoringConfig, Transition,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    FaceLock(#[from] FaceLockError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Result of submitting a frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameOutcome {
    /// `None` when the frame was skipped (capture timestamp did not advance).
    pub transition: Option<Transition>,
    /// Live lock state after the frame.
    pub state: LockState,
    /// Percentage of the evaluation behind `state`; carried over unchanged
    /// when the frame was skipped.
    pub percentage: u8,
}

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    pub profile_id: String,
    pub transition: Transition,
}

/// Snapshot of engine state for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub state: LockState,
    pub registered: bool,
    pub profile_id: Option<String>,
    pub registered_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub stats: FrameStats,
}

/// Messages sent from D-Bus handlers to the engine thread.
enum EngineRequest {
    SubmitFrame {
        frame: Frame,
        reply: oneshot::Sender<FrameOutcome>,
    },
    Register {
        reply: oneshot::Sender<Result<RegisterOutcome, EngineError>>,
    },
    Clear {
        reply: oneshot::Sender<Transition>,
    },
    Status {
        reply: oneshot::Sender<EngineStatus>,
    },
}

/// Clone-safe handle to the engine thread.
///
/// The engine thread exits once every handle has been dropped.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Feed one landmark source result into the engine.
    pub async fn submit_frame(&self, frame: Frame) -> Result<FrameOutcome, EngineError> {
        self.request(|reply| EngineRequest::SubmitFrame { frame, reply })
            .await
    }

    /// Register the face from the most recently processed frame.
    pub async fn register(&self) -> Result<RegisterOutcome, EngineError> {
        self.request(|reply| EngineRequest::Register { reply })
            .await?
    }

    /// Drop the registered profile.
    pub async fn clear(&self) -> Result<Transition, EngineError> {
        self.request(|reply| EngineRequest::Clear { reply }).await
    }

    pub async fn status(&self) -> Result<EngineStatus, EngineError> {
        self.request(|reply| EngineRequest::Status { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }
}

/// Engine-thread state: the session plus the identity of the live profile.
struct Engine {
    lock: FaceLock,
    profile_id: Option<String>,
}

impl Engine {
    fn handle(&mut self, req: EngineRequest) {
        match req {
            EngineRequest::SubmitFrame { frame, reply } => {
                let transition = self.lock.process_frame(&frame);
                let _ = reply.send(FrameOutcome {
                    transition,
                    state: self.lock.state(),
                    percentage: self.lock.last_percentage(),
                });
            }
            EngineRequest::Register { reply } => {
                let result = self
                    .lock
                    .register_current()
                    .map(|transition| {
                        let profile_id = uuid::Uuid::new_v4().to_string();
                        self.profile_id = Some(profile_id.clone());
                        RegisterOutcome {
                            profile_id,
                            transition,
                        }
                    })
                    .map_err(EngineError::from);
                let _ = reply.send(result);
            }
            EngineRequest::Clear { reply } => {
                self.profile_id = None;
                let _ = reply.send(self.lock.clear());
            }
            EngineRequest::Status { reply } => {
                let profile = self.lock.profile();
                let _ = reply.send(EngineStatus {
                    state: self.lock.state(),
                    registered: profile.is_some(),
                    profile_id: self.profile_id.clone(),
                    registered_at: profile.map(|p| p.registered_at),
                    stats: self.lock.stats(),
                });
            }
        }
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// All scoring and state transitions run on that thread, one request at a
/// time, so the session needs no locking.
pub fn spawn_engine(config: ScoringConfig, queue: usize) -> Result<EngineHandle, EngineError> {
    tracing::info!(
        auth_threshold = config.auth_threshold,
        score_scale = config.score_scale,
        key_points = ?config.key_points,
        anchor = config.anchor,
        "scoring configured"
    );

    let (tx, mut rx) = mpsc::channel::<EngineRequest>(queue.max(1));
    let mut engine = Engine {
        lock: FaceLock::new(config),
        profile_id: None,
    };

    std::thread::Builder::new()
        .name("facelock-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                engine.handle(req);
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}
