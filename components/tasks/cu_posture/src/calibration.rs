use cu_posture_payloads::FeatureSet;

/// Holds the calibrated baseline. Only replaced as a whole, never partially updated.
#[derive(Debug, Clone, Default)]
pub struct CalibrationStore {
    baseline: Option<FeatureSet>,
}

impl CalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_baseline(&mut self, features: FeatureSet) {
        self.baseline = Some(features);
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn get_baseline(&self) -> Option<FeatureSet> {
        self.baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_uncalibrated() {
        let store = CalibrationStore::new();
        assert!(!store.has_baseline());
        assert_eq!(store.get_baseline(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = CalibrationStore::new();
        store.set_baseline(FeatureSet::new(0.2, 0.15, 0.4));
        assert!(store.has_baseline());
        store.set_baseline(FeatureSet::new(0.3, 0.25, 0.5));
        assert_eq!(store.get_baseline(), Some(FeatureSet::new(0.3, 0.25, 0.5)));
    }
}
