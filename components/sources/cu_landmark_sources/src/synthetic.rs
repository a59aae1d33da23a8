//! A deterministic seated person, for demos and tests without a camera.
//!
//! World coordinates follow the estimator convention: meters, origin between the hips, y pointing down and
//! z pointing away from the camera.

use crate::recording::Recording;
use cu29_clock::CuDuration;
use cu_posture_payloads::{FrameResult, Landmark, Point3D, PoseLandmarks, StatusLabel, NUM_LANDMARKS};
use log::warn;
use std::time::Duration;

const DEFAULT_FPS: f64 = 30.0;

const SHOULDER_HEIGHT: f64 = -0.45;
const UPRIGHT_NOSE: Point3D = Point3D::new(0.0, -0.62, -0.05);
const UPRIGHT_HALF_WIDTH: f64 = 0.18;
const SLUMPED_NOSE: Point3D = Point3D::new(0.0, -0.55, -0.12);
const ROUNDED_HALF_WIDTH: f64 = 0.15;
const LEANING_NOSE: Point3D = Point3D::new(0.0, -0.585, -0.16);

// Visibility of the points under the desk.
const HIDDEN: f32 = 0.3;
const VISIBLE: f32 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosturePhase {
    Upright,
    HeadDrop,
    RoundedShoulders,
    FullSlouch,
    /// Face pushed toward the screen, the neck keeps its length.
    LeaningForward,
    /// Nobody in front of the camera.
    Away,
    /// The camera delivers nothing.
    Dropped,
}

impl PosturePhase {
    /// What the classifier reports for this phase once calibrated on [`PosturePhase::Upright`].
    pub fn expected_label(&self) -> Option<StatusLabel> {
        match self {
            PosturePhase::Upright => Some(StatusLabel::Good),
            PosturePhase::HeadDrop => Some(StatusLabel::HeadDrop),
            PosturePhase::RoundedShoulders => Some(StatusLabel::RoundedShoulders),
            PosturePhase::FullSlouch => Some(StatusLabel::FullSlouch),
            PosturePhase::LeaningForward => Some(StatusLabel::PostureOffOther),
            PosturePhase::Away => Some(StatusLabel::NoPoseDetected),
            PosturePhase::Dropped => None,
        }
    }

    fn geometry(&self) -> Option<(Point3D, f64)> {
        match self {
            PosturePhase::Upright => Some((UPRIGHT_NOSE, UPRIGHT_HALF_WIDTH)),
            PosturePhase::HeadDrop => Some((SLUMPED_NOSE, UPRIGHT_HALF_WIDTH)),
            PosturePhase::RoundedShoulders => Some((UPRIGHT_NOSE, ROUNDED_HALF_WIDTH)),
            PosturePhase::FullSlouch => Some((SLUMPED_NOSE, ROUNDED_HALF_WIDTH)),
            PosturePhase::LeaningForward => Some((LEANING_NOSE, UPRIGHT_HALF_WIDTH)),
            PosturePhase::Away | PosturePhase::Dropped => None,
        }
    }

    /// The full 33 point skeleton in this phase, if someone is visible.
    pub fn landmarks(&self) -> Option<PoseLandmarks> {
        self.geometry()
            .map(|(nose, half_width)| seated_person(nose, half_width))
    }

    pub fn frame(&self, timestamp: CuDuration) -> FrameResult {
        match (self, self.landmarks()) {
            (PosturePhase::Dropped, _) => FrameResult::NoFrame,
            (_, Some(landmarks)) => FrameResult::FramePose {
                timestamp,
                landmarks,
            },
            (_, None) => FrameResult::FrameNoPose { timestamp },
        }
    }
}

fn seated_person(nose: Point3D, half_width: f64) -> PoseLandmarks {
    let mut points = [(Point3D::default(), VISIBLE); NUM_LANDMARKS];
    let p = Point3D::new;
    points[0].0 = nose;
    for side in [1.0, -1.0] {
        // left points sit on +x and come first in each pair
        let (l, r) = if side > 0.0 { (0, 0) } else { (3, 1) };
        points[1 + l].0 = nose + p(0.02 * side, -0.03, 0.02);
        points[2 + l].0 = nose + p(0.035 * side, -0.03, 0.02);
        points[3 + l].0 = nose + p(0.05 * side, -0.03, 0.025);
        points[7 + r].0 = nose + p(0.07 * side, -0.02, 0.08);
        points[9 + r].0 = nose + p(0.025 * side, 0.03, 0.01);

        let shoulder = p(half_width * side, SHOULDER_HEIGHT, 0.0);
        let wrist = p((half_width - 0.02) * side, -0.05, -0.25);
        points[11 + r].0 = shoulder;
        points[13 + r].0 = p((half_width + 0.04) * side, -0.2, -0.02);
        points[15 + r].0 = wrist;
        points[17 + r].0 = wrist + p(0.01 * side, 0.02, -0.05);
        points[19 + r].0 = wrist + p(-0.01 * side, 0.02, -0.07);
        points[21 + r].0 = wrist + p(-0.02 * side, 0.0, -0.04);

        points[23 + r].0 = p(0.1 * side, 0.0, 0.0);
        points[25 + r] = (p(0.1 * side, 0.02, -0.42), HIDDEN);
        points[27 + r] = (p(0.1 * side, 0.45, -0.45), HIDDEN);
        points[29 + r] = (p(0.1 * side, 0.5, -0.4), HIDDEN);
        points[31 + r] = (p(0.1 * side, 0.5, -0.55), HIDDEN);
    }

    let world = points
        .iter()
        .map(|(point, visibility)| Landmark {
            position: *point,
            visibility: *visibility,
        })
        .collect();
    // a camera slightly above the desk, the person filling most of the frame
    let normalized = points
        .iter()
        .map(|(point, visibility)| {
            Landmark::new(0.5 + point.x * 0.8, 0.75 + point.y * 0.8, point.z, *visibility)
        })
        .collect();
    PoseLandmarks::new(world, normalized)
}

/// A scripted sequence of posture phases sampled at a fixed frame rate.
#[derive(Debug, Clone)]
pub struct SyntheticSession {
    fps: f64,
    phases: Vec<(PosturePhase, Duration)>,
}

impl SyntheticSession {
    pub fn new(fps: f64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            warn!("Invalid frame rate {fps}, using {DEFAULT_FPS}.");
            DEFAULT_FPS
        };
        Self {
            fps,
            phases: Vec::new(),
        }
    }

    /// The demo script: sit straight, then go through every bad posture, leave and come back.
    pub fn demo(fps: f64) -> Self {
        let secs = Duration::from_secs;
        Self::new(fps)
            .phase(PosturePhase::Upright, secs(4))
            .phase(PosturePhase::HeadDrop, secs(3))
            .phase(PosturePhase::Upright, secs(2))
            .phase(PosturePhase::RoundedShoulders, secs(3))
            .phase(PosturePhase::FullSlouch, secs(3))
            .phase(PosturePhase::LeaningForward, secs(3))
            .phase(PosturePhase::Away, secs(2))
            .phase(PosturePhase::Dropped, secs(1))
            .phase(PosturePhase::Upright, secs(3))
    }

    pub fn phase(mut self, phase: PosturePhase, duration: Duration) -> Self {
        self.phases.push((phase, duration));
        self
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frame_period(&self) -> CuDuration {
        CuDuration(((1e9 / self.fps) as u64).max(1))
    }

    /// Renders the script, one frame per period, `NoFrame` for dropped frames.
    pub fn recording(&self) -> Recording {
        let period = self.frame_period();
        let mut recording = Recording::default();
        let mut index = 0u64;
        for (phase, duration) in &self.phases {
            let frames = (duration.as_secs_f64() * self.fps).round() as u64;
            for _ in 0..frames {
                recording.push(phase.frame(CuDuration(index * period.0)));
                index += 1;
            }
        }
        recording
    }
}

impl Default for SyntheticSession {
    fn default() -> Self {
        Self::demo(DEFAULT_FPS)
    }
}
