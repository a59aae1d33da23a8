use cu_posture_payloads::{FeatureSet, Point3D, PoseLandmarks, LEFT_SHOULDER, NOSE, RIGHT_SHOULDER};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("Landmark {index} missing from a snapshot of {available} landmarks")]
    MissingLandmark { index: usize, available: usize },
}

fn required(landmarks: &PoseLandmarks, index: usize) -> Result<Point3D, FeatureError> {
    landmarks
        .world_point(index)
        .ok_or(FeatureError::MissingLandmark {
            index,
            available: landmarks.len(),
        })
}

/// Computes the three posture features from the world landmarks of a snapshot.
pub fn extract_features(landmarks: &PoseLandmarks) -> Result<FeatureSet, FeatureError> {
    let nose = required(landmarks, NOSE)?;
    let left = required(landmarks, LEFT_SHOULDER)?;
    let right = required(landmarks, RIGHT_SHOULDER)?;

    let midpoint = left.midpoint(&right);
    Ok(FeatureSet {
        neck_dist_3d: nose.distance(&midpoint),
        neck_dist_vertical_2d: nose.planar_distance(&midpoint),
        shoulder_width_3d: left.distance(&right),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cu_posture_payloads::{Landmark, NUM_LANDMARKS};

    fn snapshot(nose: (f64, f64, f64), left: (f64, f64, f64), right: (f64, f64, f64)) -> PoseLandmarks {
        let mut world = vec![Landmark::default(); NUM_LANDMARKS];
        world[NOSE] = Landmark::new(nose.0, nose.1, nose.2, 0.99);
        world[LEFT_SHOULDER] = Landmark::new(left.0, left.1, left.2, 0.99);
        world[RIGHT_SHOULDER] = Landmark::new(right.0, right.1, right.2, 0.99);
        PoseLandmarks::new(world, Vec::new())
    }

    #[test]
    fn test_upright_geometry() {
        let features = extract_features(&snapshot(
            (0.0, -0.6, -0.1),
            (0.2, -0.3, 0.0),
            (-0.2, -0.3, 0.0),
        ))
        .unwrap();
        // midpoint is (0, -0.3, 0)
        assert_relative_eq!(features.neck_dist_vertical_2d, 0.3, epsilon = 1e-12);
        assert_relative_eq!(features.neck_dist_3d, (0.09f64 + 0.01).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(features.shoulder_width_3d, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_coincident_shoulders_have_no_width() {
        let features = extract_features(&snapshot(
            (0.1, 0.5, 0.3),
            (0.25, -0.1, 0.7),
            (0.25, -0.1, 0.7),
        ))
        .unwrap();
        assert_eq!(features.shoulder_width_3d, 0.0);
    }

    #[test]
    fn test_depth_only_offset_is_invisible_in_2d() {
        let features = extract_features(&snapshot(
            (0.0, 0.0, -0.5),
            (0.1, 0.0, 0.0),
            (-0.1, 0.0, 0.0),
        ))
        .unwrap();
        assert_relative_eq!(features.neck_dist_3d, 0.5, epsilon = 1e-12);
        assert_eq!(features.neck_dist_vertical_2d, 0.0);
    }

    #[test]
    fn test_missing_shoulder() {
        let mut landmarks = snapshot((0.0, 0.0, 0.0), (0.1, 0.0, 0.0), (-0.1, 0.0, 0.0));
        landmarks.world.truncate(RIGHT_SHOULDER);
        assert_eq!(
            extract_features(&landmarks),
            Err(FeatureError::MissingLandmark {
                index: RIGHT_SHOULDER,
                available: RIGHT_SHOULDER
            })
        );
        assert!(extract_features(&PoseLandmarks::default()).is_err());
    }
}
