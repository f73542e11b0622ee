//! Strongly typed facial landmarks as produced by the landmark source.
//!
//! Coordinates are normalized to the frame: `x` and `y` lie in `[0, 1]`
//! relative to frame width and height. `z` is carried through but never read
//! by the scorer.

use serde::{Deserialize, Serialize};

/// A single normalized landmark coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "PointRepr")]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Accepted wire shapes: `{"x":..,"y":..}`, `[x, y, z]` or `[x, y]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PointRepr {
    Object {
        x: f32,
        y: f32,
        #[serde(default)]
        z: f32,
    },
    Xyz([f32; 3]),
    Xy([f32; 2]),
}

impl From<PointRepr> for LandmarkPoint {
    fn from(repr: PointRepr) -> Self {
        match repr {
            PointRepr::Object { x, y, z } => Self { x, y, z },
            PointRepr::Xyz([x, y, z]) => Self { x, y, z },
            PointRepr::Xy([x, y]) => Self { x, y, z: 0.0 },
        }
    }
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub const fn with_z(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// 2D displacement of this point from `origin`.
    pub fn relative_to(&self, origin: &LandmarkPoint) -> (f32, f32) {
        (self.x - origin.x, self.y - origin.y)
    }
}

/// Ordered landmarks for one face in one frame.
///
/// Index `i` always denotes the same anatomical point across frames
/// (index 1 is the nose tip); the scorer relies on that stability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet(Vec<LandmarkPoint>);

impl LandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self(points)
    }

    pub fn get(&self, index: usize) -> Option<&LandmarkPoint> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.0
    }

    /// Copy of this set shifted by `(dx, dy)` in normalized frame units.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        self.0
            .iter()
            .map(|p| LandmarkPoint::with_z(p.x + dx, p.y + dy, p.z))
            .collect()
    }
}

impl From<Vec<LandmarkPoint>> for LandmarkSet {
    fn from(points: Vec<LandmarkPoint>) -> Self {
        Self(points)
    }
}

impl FromIterator<LandmarkPoint> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = LandmarkPoint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One landmark source result: every face detected in a single video frame.
///
/// `timestamp_ms` is the capture timestamp of the underlying video frame, not
/// the time the result was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub timestamp_ms: f64,
    #[serde(default)]
    pub faces: Vec<LandmarkSet>,
}

impl Frame {
    pub fn new(timestamp_ms: f64, faces: Vec<LandmarkSet>) -> Self {
        Self {
            timestamp_ms,
            faces,
        }
    }

    /// A frame in which no face was detected.
    pub fn empty(timestamp_ms: f64) -> Self {
        Self::new(timestamp_ms, Vec::new())
    }

    /// The face the engine consumes: the first detection, if it is non-empty.
    pub fn primary_face(&self) -> Option<&LandmarkSet> {
        self.faces.first().filter(|face| !face.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_accepts_object_and_array_forms() {
        let json = r#"[{"x":0.5,"y":0.25},[0.1,0.2,0.3],[0.4,0.6]]"#;
        let set: LandmarkSet = serde_json::from_str(json).unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.get(0), Some(&LandmarkPoint::new(0.5, 0.25)));
        assert_eq!(set.get(1), Some(&LandmarkPoint::with_z(0.1, 0.2, 0.3)));
        assert_eq!(set.get(2), Some(&LandmarkPoint::new(0.4, 0.6)));
        assert!(set.get(3).is_none());
    }

    #[test]
    fn test_translated_shifts_xy_only() {
        let set = LandmarkSet::new(vec![LandmarkPoint::with_z(0.1, 0.2, 0.7)]);
        let moved = set.translated(0.05, -0.1);
        let p = moved.get(0).unwrap();
        assert!((p.x - 0.15).abs() < 1e-6);
        assert!((p.y - 0.1).abs() < 1e-6);
        assert_eq!(p.z, 0.7);
    }

    #[test]
    fn test_primary_face_is_first_detection_only() {
        let frame = Frame::new(10.0, vec![LandmarkSet::default()]);
        assert!(frame.primary_face().is_none());
        assert!(Frame::empty(11.0).primary_face().is_none());

        let face = LandmarkSet::new(vec![LandmarkPoint::new(0.5, 0.5)]);
        let frame = Frame::new(12.0, vec![face.clone(), LandmarkSet::default()]);
        assert_eq!(frame.primary_face(), Some(&face));

        // A later detection never stands in for an empty first one.
        let frame = Frame::new(13.0, vec![LandmarkSet::default(), face]);
        assert!(frame.primary_face().is_none());
    }

    #[test]
    fn test_frame_without_faces_field_deserializes() {
        let frame: Frame = serde_json::from_str(r#"{"timestamp_ms": 33.3}"#).unwrap();
        assert!(frame.faces.is_empty());
    }
}
