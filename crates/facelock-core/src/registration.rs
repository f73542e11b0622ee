use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::FaceLockError;
use crate::landmark::LandmarkSet;

/// The reference face every frame is compared against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisteredProfile {
    pub landmarks: LandmarkSet,
    pub registered_at: DateTime<Utc>,
}

/// Holds at most one registered profile. Nothing else mutates it.
#[derive(Debug, Clone, Default)]
pub struct RegistrationStore {
    profile: Option<RegisteredProfile>,
}

impl RegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the first detected face, replacing any existing profile.
    ///
    /// Fails with [`FaceLockError::NoFaceDetected`] when `faces` is empty or
    /// the first detection has no points, and with
    /// [`FaceLockError::MalformedLandmarkSet`] when the first face lacks the
    /// anchor landmark or every other key point. The store is unchanged on
    /// failure.
    pub fn register(
        &mut self,
        faces: &[LandmarkSet],
        key_points: &[usize],
        anchor: usize,
    ) -> Result<&RegisteredProfile, FaceLockError> {
        let face = faces
            .first()
            .filter(|f| !f.is_empty())
            .ok_or(FaceLockError::NoFaceDetected)?;

        let has_key_point = key_points
            .iter()
            .any(|&index| index != anchor && face.get(index).is_some());
        if face.get(anchor).is_none() || !has_key_point {
            return Err(FaceLockError::MalformedLandmarkSet {
                anchor,
                len: face.len(),
            });
        }

        tracing::info!(points = face.len(), "face profile registered");
        Ok(&*self.profile.insert(RegisteredProfile {
            landmarks: face.clone(),
            registered_at: Utc::now(),
        }))
    }

    pub fn clear(&mut self) {
        if self.profile.take().is_some() {
            tracing::info!("face profile cleared");
        }
    }

    pub fn current(&self) -> Option<&LandmarkSet> {
        self.profile.as_ref().map(|p| &p.landmarks)
    }

    pub fn profile(&self) -> Option<&RegisteredProfile> {
        self.profile.as_ref()
    }

    pub fn is_registered(&self) -> bool {
        self.profile.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::LandmarkPoint;
    use crate::scoring::{ANCHOR_INDEX, KEY_POINT_INDICES};
    use crate::test_support::{face, face_with_key_offset};

    #[test]
    fn test_register_stores_first_face() {
        let mut store = RegistrationStore::new();
        let first = face();
        let second = face_with_key_offset(0.1, 0.1);
        store
            .register(&[first.clone(), second], &KEY_POINT_INDICES, ANCHOR_INDEX)
            .unwrap();
        assert_eq!(store.current(), Some(&first));
    }

    #[test]
    fn test_register_replaces_previous_profile() {
        let mut store = RegistrationStore::new();
        store.register(&[face()], &KEY_POINT_INDICES, ANCHOR_INDEX).unwrap();
        let replacement = face_with_key_offset(0.05, 0.0);
        store
            .register(std::slice::from_ref(&replacement), &KEY_POINT_INDICES, ANCHOR_INDEX)
            .unwrap();
        assert_eq!(store.current(), Some(&replacement));
    }

    #[test]
    fn test_register_without_face_leaves_store_unchanged() {
        let mut store = RegistrationStore::new();
        assert_eq!(
            store.register(&[], &KEY_POINT_INDICES, ANCHOR_INDEX).unwrap_err(),
            FaceLockError::NoFaceDetected
        );
        assert!(!store.is_registered());

        let existing = face();
        store
            .register(std::slice::from_ref(&existing), &KEY_POINT_INDICES, ANCHOR_INDEX)
            .unwrap();
        assert_eq!(
            store
                .register(&[LandmarkSet::default()], &KEY_POINT_INDICES, ANCHOR_INDEX)
                .unwrap_err(),
            FaceLockError::NoFaceDetected
        );
        assert_eq!(store.current(), Some(&existing));
    }

    #[test]
    fn test_register_rejects_face_without_anchor() {
        let mut store = RegistrationStore::new();
        let stub = LandmarkSet::new(vec![LandmarkPoint::new(0.5, 0.5)]);
        let err = store.register(&[stub], &KEY_POINT_INDICES, ANCHOR_INDEX).unwrap_err();
        assert!(matches!(err, FaceLockError::MalformedLandmarkSet { len: 1, .. }));
        assert!(store.current().is_none());
    }

    #[test]
    fn test_register_rejects_face_with_only_anchor() {
        let mut store = RegistrationStore::new();
        let truncated = LandmarkSet::new(face().points()[..2].to_vec());
        let err = store
            .register(&[truncated], &KEY_POINT_INDICES, ANCHOR_INDEX)
            .unwrap_err();
        assert!(matches!(err, FaceLockError::MalformedLandmarkSet { len: 2, .. }));
        assert!(!store.is_registered());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store = RegistrationStore::new();
        store.register(&[face()], &KEY_POINT_INDICES, ANCHOR_INDEX).unwrap();
        store.clear();
        assert!(store.current().is_none());
        store.clear();
        assert!(store.current().is_none());
    }
}
