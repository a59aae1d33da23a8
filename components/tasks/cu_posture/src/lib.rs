//! Posture measurement and classification.
//!
//! [`extract_features`] turns a landmark snapshot into a [`FeatureSet`], the [`CalibrationStore`] keeps the
//! user baseline and [`Thresholds::classify`] compares both. [`PostureTask`] bundles them the way the
//! analysis worker drives them, one frame at a time.

mod calibration;
mod classifier;
mod features;

pub use calibration::CalibrationStore;
pub use classifier::{
    classify, PostureChecks, ThresholdError, Thresholds, BAD_OPACITY, NECK_HIGH_MULTIPLIER, NECK_LOW,
    NECK_VERT_LOW, SHOULDER_LOW,
};
pub use features::{extract_features, FeatureError};

use cu_posture_payloads::{ClassificationResult, FeatureSet, PoseLandmarks};
use log::debug;

/// Stateful classification unit: the baseline, the features of the last processed pose and the thresholds.
pub struct PostureTask {
    thresholds: Thresholds,
    store: CalibrationStore,
    current: Option<FeatureSet>,
}

impl PostureTask {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            store: CalibrationStore::new(),
            current: None,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Measures a pose, caches its features and classifies it against the baseline.
    pub fn process(&mut self, landmarks: &PoseLandmarks) -> Result<ClassificationResult, FeatureError> {
        let features = extract_features(landmarks)?;
        self.current = Some(features);
        let baseline = self.store.get_baseline();
        Ok(self.thresholds.classify(&features, baseline.as_ref()))
    }

    /// Uses the last measured features as the new baseline.
    /// Returns false and leaves the store untouched if no pose was ever measured.
    pub fn calibrate(&mut self) -> bool {
        match self.current {
            Some(features) => {
                debug!("New baseline: {features}");
                self.store.set_baseline(features);
                true
            }
            None => false,
        }
    }

    pub fn baseline(&self) -> Option<FeatureSet> {
        self.store.get_baseline()
    }

    pub fn is_calibrated(&self) -> bool {
        self.store.has_baseline()
    }

    pub fn current_features(&self) -> Option<FeatureSet> {
        self.current
    }
}

impl Default for PostureTask {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}
