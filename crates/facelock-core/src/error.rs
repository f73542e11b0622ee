use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaceLockError {
    #[error("no face detected")]
    NoFaceDetected,
    #[error("malformed landmark set: anchor {anchor} or every other key point missing ({len} points)")]
    MalformedLandmarkSet { anchor: usize, len: usize },
}
