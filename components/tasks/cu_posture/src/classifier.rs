use cu_posture_payloads::{ClassificationResult, FeatureSet, StatusLabel};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Below this ratio of the baseline neck distance the head is considered dropped.
pub const NECK_LOW: f64 = 0.95;
/// Above this ratio of the baseline neck distance the neck is flagged too, with the same label.
pub const NECK_HIGH_MULTIPLIER: f64 = 1.0 + NECK_LOW;
pub const SHOULDER_LOW: f64 = 0.92;
pub const NECK_VERT_LOW: f64 = 0.85;
/// Severity published for every bad posture.
pub const BAD_OPACITY: f64 = 0.85;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid threshold {name}: {value} is outside of {range}")]
pub struct ThresholdError {
    pub name: &'static str,
    pub value: f64,
    pub range: &'static str,
}

/// Ratios against the baseline. The upper neck bound is always `1 + neck_low`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub neck_low: f64,
    pub shoulder_low: f64,
    pub neck_vert_low: f64,
    pub bad_severity: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            neck_low: NECK_LOW,
            shoulder_low: SHOULDER_LOW,
            neck_vert_low: NECK_VERT_LOW,
            bad_severity: BAD_OPACITY,
        }
    }
}

impl Thresholds {
    pub fn neck_high_multiplier(&self) -> f64 {
        1.0 + self.neck_low
    }

    pub fn validate(&self) -> Result<(), ThresholdError> {
        let ratios = [
            ("neck_low", self.neck_low),
            ("shoulder_low", self.shoulder_low),
            ("neck_vert_low", self.neck_vert_low),
        ];
        for (name, value) in ratios {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ThresholdError {
                    name,
                    value,
                    range: "(0, 1]",
                });
            }
        }
        if !(0.0..=1.0).contains(&self.bad_severity) {
            return Err(ThresholdError {
                name: "bad_severity",
                value: self.bad_severity,
                range: "[0, 1]",
            });
        }
        Ok(())
    }

    pub fn checks(&self, current: &FeatureSet, baseline: &FeatureSet) -> PostureChecks {
        let bad_neck = current.neck_dist_3d < baseline.neck_dist_3d * self.neck_low
            || current.neck_dist_3d > baseline.neck_dist_3d * self.neck_high_multiplier();
        let bad_shoulders = current.shoulder_width_3d < baseline.shoulder_width_3d * self.shoulder_low;
        let bad_neck_vert =
            current.neck_dist_vertical_2d < baseline.neck_dist_vertical_2d * self.neck_vert_low;
        PostureChecks {
            bad_neck,
            bad_shoulders,
            bad_neck_vert,
        }
    }

    pub fn classify(&self, current: &FeatureSet, baseline: Option<&FeatureSet>) -> ClassificationResult {
        let Some(baseline) = baseline else {
            return ClassificationResult::uncalibrated();
        };
        let label = self.checks(current, baseline).label();
        if label.is_bad() {
            ClassificationResult::new(self.bad_severity, label)
        } else {
            ClassificationResult::good()
        }
    }
}

/// The three boolean checks against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostureChecks {
    pub bad_neck: bool,
    pub bad_shoulders: bool,
    pub bad_neck_vert: bool,
}

impl PostureChecks {
    /// First match wins: full slouch, head drop, rounded shoulders, then the vertical neck check.
    pub fn label(&self) -> StatusLabel {
        match (self.bad_neck, self.bad_shoulders, self.bad_neck_vert) {
            (true, true, _) => StatusLabel::FullSlouch,
            (true, false, _) => StatusLabel::HeadDrop,
            (false, true, _) => StatusLabel::RoundedShoulders,
            (false, false, true) => StatusLabel::PostureOffOther,
            (false, false, false) => StatusLabel::Good,
        }
    }
}

/// Classifies with the default thresholds.
pub fn classify(current: &FeatureSet, baseline: Option<&FeatureSet>) -> ClassificationResult {
    Thresholds::default().classify(current, baseline)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASELINE: FeatureSet = FeatureSet::new(0.20, 0.15, 0.40);

    #[test]
    fn test_uncalibrated() {
        let result = classify(&FeatureSet::new(0.9, 0.1, 0.01), None);
        assert_eq!(result, ClassificationResult::new(0.0, StatusLabel::Uncalibrated));
    }

    #[test]
    fn test_identical_is_good() {
        let result = classify(&BASELINE, Some(&BASELINE));
        assert_eq!(result.label, StatusLabel::Good);
        assert_eq!(result.severity, 0.0);
    }

    #[test]
    fn test_longer_neck_within_bounds_is_good() {
        let result = classify(&FeatureSet::new(0.25, 0.15, 0.40), Some(&BASELINE));
        assert_eq!(result, ClassificationResult::good());
    }

    #[test]
    fn test_rounded_shoulders() {
        let result = classify(&FeatureSet::new(0.20, 0.15, 0.35), Some(&BASELINE));
        assert_eq!(result.label, StatusLabel::RoundedShoulders);
        assert_eq!(result.severity, BAD_OPACITY);
    }

    #[test]
    fn test_head_drop() {
        let result = classify(&FeatureSet::new(0.18, 0.15, 0.40), Some(&BASELINE));
        assert_eq!(result.label, StatusLabel::HeadDrop);
        assert_eq!(result.severity, 0.85);
    }

    #[test]
    fn test_abnormally_long_neck_reports_head_drop() {
        // 0.40 > 0.20 * 1.95, flagged through the same neck check
        let result = classify(&FeatureSet::new(0.40, 0.15, 0.40), Some(&BASELINE));
        assert_eq!(result.label, StatusLabel::HeadDrop);
        assert_eq!(result.severity, BAD_OPACITY);
    }

    #[test]
    fn test_full_slouch_wins_regardless_of_vertical() {
        for vertical in [0.15, 0.01] {
            let result = classify(&FeatureSet::new(0.10, vertical, 0.30), Some(&BASELINE));
            assert_eq!(result.label, StatusLabel::FullSlouch);
        }
    }

    #[test]
    fn test_vertical_only() {
        let result = classify(&FeatureSet::new(0.20, 0.10, 0.40), Some(&BASELINE));
        assert_eq!(result.label, StatusLabel::PostureOffOther);
        assert_eq!(result.severity, BAD_OPACITY);
    }

    #[test]
    fn test_bounds_are_strict() {
        let thresholds = Thresholds::default();
        let at_bounds = FeatureSet::new(
            BASELINE.neck_dist_3d * thresholds.neck_low,
            BASELINE.neck_dist_vertical_2d * thresholds.neck_vert_low,
            BASELINE.shoulder_width_3d * thresholds.shoulder_low,
        );
        assert_eq!(thresholds.checks(&at_bounds, &BASELINE), PostureChecks::default());
        let upper = FeatureSet::new(
            BASELINE.neck_dist_3d * thresholds.neck_high_multiplier(),
            BASELINE.neck_dist_vertical_2d,
            BASELINE.shoulder_width_3d,
        );
        assert_eq!(thresholds.classify(&upper, Some(&BASELINE)).label, StatusLabel::Good);
    }

    #[test]
    fn test_idempotent() {
        let current = FeatureSet::new(0.17, 0.12, 0.33);
        assert_eq!(classify(&current, Some(&BASELINE)), classify(&current, Some(&BASELINE)));
        assert_eq!(classify(&current, None), classify(&current, None));
    }

    #[test]
    fn test_zero_baseline_is_good() {
        let zero = FeatureSet::new(0.0, 0.0, 0.0);
        assert_eq!(classify(&zero, Some(&zero)).label, StatusLabel::Good);
    }

    #[test]
    fn test_label_table() {
        let label = |n, s, v| {
            PostureChecks {
                bad_neck: n,
                bad_shoulders: s,
                bad_neck_vert: v,
            }
            .label()
        };
        assert_eq!(label(true, true, true), StatusLabel::FullSlouch);
        assert_eq!(label(true, true, false), StatusLabel::FullSlouch);
        assert_eq!(label(true, false, true), StatusLabel::HeadDrop);
        assert_eq!(label(false, true, true), StatusLabel::RoundedShoulders);
        assert_eq!(label(false, false, true), StatusLabel::PostureOffOther);
        assert_eq!(label(false, false, false), StatusLabel::Good);
    }

    #[test]
    fn test_custom_thresholds() {
        let strict = Thresholds {
            shoulder_low: 0.99,
            bad_severity: 1.0,
            ..Thresholds::default()
        };
        let result = strict.classify(&FeatureSet::new(0.20, 0.15, 0.39), Some(&BASELINE));
        assert_eq!(result, ClassificationResult::new(1.0, StatusLabel::RoundedShoulders));
    }

    #[test]
    fn test_validate() {
        assert!(Thresholds::default().validate().is_ok());
        let bad = Thresholds {
            neck_low: 0.0,
            ..Thresholds::default()
        };
        assert_eq!(bad.validate().unwrap_err().name, "neck_low");
        let bad = Thresholds {
            bad_severity: 1.2,
            ..Thresholds::default()
        };
        assert_eq!(bad.validate().unwrap_err().name, "bad_severity");
        let bad = Thresholds {
            shoulder_low: f64::NAN,
            ..Thresholds::default()
        };
        assert!(bad.validate().is_err());
    }
}
