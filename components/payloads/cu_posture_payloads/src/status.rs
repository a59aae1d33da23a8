use bincode::{Decode, Encode};
use cu29_clock::CuTime;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The three geometric features measured on every frame.
/// Distances are in the estimator world unit (meters for BlazePose world landmarks).
#[derive(Debug, Clone, Copy, Default, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Nose to shoulder midpoint, in 3D.
    pub neck_dist_3d: f64,
    /// Nose to shoulder midpoint, projected on the x/y plane.
    pub neck_dist_vertical_2d: f64,
    /// Left to right shoulder, in 3D.
    pub shoulder_width_3d: f64,
}

impl FeatureSet {
    pub const fn new(neck_dist_3d: f64, neck_dist_vertical_2d: f64, shoulder_width_3d: f64) -> Self {
        Self {
            neck_dist_3d,
            neck_dist_vertical_2d,
            shoulder_width_3d,
        }
    }
}

impl Display for FeatureSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "neck3d={:.4} neck2d={:.4} shoulders={:.4}",
            self.neck_dist_3d, self.neck_dist_vertical_2d, self.shoulder_width_3d
        )
    }
}

/// Opaque color hint for status surfaces, 0xRRGGBB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct DisplayColor(pub u32);

impl DisplayColor {
    pub const NEUTRAL: DisplayColor = DisplayColor(0x7f8c8d);
    pub const ACCENT: DisplayColor = DisplayColor(0x3498db);
    pub const DANGER: DisplayColor = DisplayColor(0xe74c3c);
    pub const SUCCESS: DisplayColor = DisplayColor(0x2ecc71);

    pub fn rgb(&self) -> (u8, u8, u8) {
        let DisplayColor(c) = *self;
        ((c >> 16) as u8, (c >> 8) as u8, c as u8)
    }
}

impl Display for DisplayColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:06x}", self.0 & 0xffffff)
    }
}

/// Discrete posture status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
pub enum StatusLabel {
    Uncalibrated,
    NoPoseDetected,
    Good,
    HeadDrop,
    RoundedShoulders,
    FullSlouch,
    PostureOffOther,
}

impl StatusLabel {
    /// True for the labels that dim the surfaces.
    pub fn is_bad(&self) -> bool {
        matches!(
            self,
            StatusLabel::HeadDrop
                | StatusLabel::RoundedShoulders
                | StatusLabel::FullSlouch
                | StatusLabel::PostureOffOther
        )
    }

    pub fn message(&self) -> &'static str {
        match self {
            StatusLabel::Uncalibrated => "Please Calibrate",
            StatusLabel::NoPoseDetected => "No pose detected",
            StatusLabel::Good => "GOOD POSTURE",
            StatusLabel::HeadDrop => "HEAD DROP",
            StatusLabel::RoundedShoulders => "ROUNDED SHOULDERS",
            StatusLabel::FullSlouch => "FULL SLOUCH",
            StatusLabel::PostureOffOther => "POSTURE OFF",
        }
    }

    pub fn color_hint(&self) -> DisplayColor {
        match self {
            StatusLabel::Uncalibrated => DisplayColor::ACCENT,
            StatusLabel::NoPoseDetected => DisplayColor::NEUTRAL,
            StatusLabel::Good => DisplayColor::SUCCESS,
            _ => DisplayColor::DANGER,
        }
    }
}

impl Display for StatusLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of one classification cycle.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Dimming strength in [0, 1].
    pub severity: f64,
    pub label: StatusLabel,
}

impl ClassificationResult {
    pub fn new(severity: f64, label: StatusLabel) -> Self {
        Self {
            severity: severity.clamp(0.0, 1.0),
            label,
        }
    }

    pub fn uncalibrated() -> Self {
        Self::new(0.0, StatusLabel::Uncalibrated)
    }

    pub fn no_pose() -> Self {
        Self::new(0.0, StatusLabel::NoPoseDetected)
    }

    pub fn good() -> Self {
        Self::new(0.0, StatusLabel::Good)
    }
}

impl Display for ClassificationResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (severity {:.2})", self.label, self.severity)
    }
}

/// A single published update: the severity channel and the status channel come from the same result.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct PostureSignal {
    pub timestamp: CuTime,
    pub result: ClassificationResult,
}

impl PostureSignal {
    pub fn new(timestamp: CuTime, result: ClassificationResult) -> Self {
        Self { timestamp, result }
    }

    pub fn severity(&self) -> f64 {
        self.result.severity
    }

    pub fn label(&self) -> StatusLabel {
        self.result.label
    }

    pub fn color_hint(&self) -> DisplayColor {
        self.result.label.color_hint()
    }
}
