use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Number of landmarks in the BlazePose topology.
pub const NUM_LANDMARKS: usize = 33;

pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;

// BlazePose landmark indices for reference:
// 0: nose, 11: left_shoulder, 12: right_shoulder, 13: left_elbow, 14: right_elbow,
// 15: left_wrist, 16: right_wrist, 23: left_hip, 24: right_hip,
// 25: left_knee, 26: right_knee, 27: left_ankle, 28: right_ankle

/// Skeleton edges drawn on the preview (pairs of landmark indices).
pub const POSE_CONNECTIONS: [(usize, usize); 14] = [
    (11, 12), // shoulders
    (11, 23), // left_shoulder -> left_hip
    (12, 24), // right_shoulder -> right_hip
    (23, 24), // hips
    (11, 13), // left_shoulder -> left_elbow
    (13, 15), // left_elbow -> left_wrist
    (12, 14), // right_shoulder -> right_elbow
    (14, 16), // right_elbow -> right_wrist
    (23, 25), // left_hip -> left_knee
    (25, 27), // left_knee -> left_ankle
    (24, 26), // right_hip -> right_knee
    (26, 28), // right_knee -> right_ankle
    (0, 11),  // nose -> left_shoulder (neck proxy)
    (0, 12),  // nose -> right_shoulder (neck proxy)
];

/// Joints drawn as dots on the preview.
pub const PREVIEW_LANDMARKS: [usize; 13] = [0, 11, 12, 13, 14, 15, 16, 23, 24, 25, 26, 27, 28];

/// A point in the estimator coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn midpoint(&self, other: &Point3D) -> Point3D {
        (*self + *other) * 0.5
    }

    /// Euclidean distance in 3D.
    pub fn distance(&self, other: &Point3D) -> f64 {
        let d = *self - *other;
        (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
    }

    /// Euclidean distance on the x/y plane, z is ignored.
    pub fn planar_distance(&self, other: &Point3D) -> f64 {
        let d = *self - *other;
        (d.x * d.x + d.y * d.y).sqrt()
    }
}

impl Add for Point3D {
    type Output = Point3D;

    fn add(self, rhs: Point3D) -> Point3D {
        Point3D::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3D {
    type Output = Point3D;

    fn sub(self, rhs: Point3D) -> Point3D {
        Point3D::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3D {
    type Output = Point3D;

    fn mul(self, rhs: f64) -> Point3D {
        Point3D::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// A single estimated body joint with the estimator confidence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct Landmark {
    pub position: Point3D,
    pub visibility: f32,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, z: f64, visibility: f32) -> Self {
        Self {
            position: Point3D::new(x, y, z),
            visibility,
        }
    }

    /// Maps a normalized landmark onto a `width` x `height` image.
    /// Coordinates outside of [0, 1] are clamped to the image border.
    pub fn to_pixel(&self, width: u32, height: u32) -> (u32, u32) {
        let x = self.position.x.clamp(0.0, 1.0) * width as f64;
        let y = self.position.y.clamp(0.0, 1.0) * height as f64;
        (x as u32, y as u32)
    }
}

/// One detected person.
/// `world` is metric and feeds the classification, `normalized` is image space and only used for drawing.
#[derive(Debug, Clone, Default, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct PoseLandmarks {
    pub world: Vec<Landmark>,
    #[serde(default)]
    pub normalized: Vec<Landmark>,
}

impl PoseLandmarks {
    pub fn new(world: Vec<Landmark>, normalized: Vec<Landmark>) -> Self {
        Self { world, normalized }
    }

    pub fn world_point(&self, index: usize) -> Option<Point3D> {
        self.world.get(index).map(|l| l.position)
    }

    pub fn len(&self) -> usize {
        self.world.len()
    }

    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_midpoint() {
        let a = Point3D::new(-0.2, 0.4, 1.0);
        let b = Point3D::new(0.2, 0.0, -1.0);
        assert_eq!(a.midpoint(&b), Point3D::new(0.0, 0.2, 0.0));
    }

    #[test]
    fn test_distances() {
        let a = Point3D::new(0.0, 0.0, 0.0);
        let b = Point3D::new(3.0, 4.0, 12.0);
        assert_relative_eq!(a.distance(&b), 13.0);
        assert_relative_eq!(a.planar_distance(&b), 5.0);
        assert_relative_eq!(b.distance(&b), 0.0);
    }

    #[test]
    fn test_to_pixel_clamps() {
        let inside = Landmark::new(0.5, 0.25, 0.0, 1.0);
        assert_eq!(inside.to_pixel(300, 300), (150, 75));
        let outside = Landmark::new(-0.3, 1.7, 0.0, 1.0);
        assert_eq!(outside.to_pixel(300, 200), (0, 200));
    }

    #[test]
    fn test_connections_stay_in_topology() {
        for (a, b) in POSE_CONNECTIONS {
            assert!(a < NUM_LANDMARKS && b < NUM_LANDMARKS);
        }
        assert!(PREVIEW_LANDMARKS.iter().all(|i| *i < NUM_LANDMARKS));
    }
}
