use crate::config::BatchOptions;

/// 置信度过滤：`confidence >= min_confidence`，或强制保留低置信度结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceFilter {
    pub min_confidence: f64,
    pub include_low_confidence: bool,
}

impl Default for ConfidenceFilter {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            include_low_confidence: false,
        }
    }
}

impl ConfidenceFilter {
    pub fn new(min_confidence: f64, include_low_confidence: bool) -> Self {
        Self {
            min_confidence,
            include_low_confidence,
        }
    }

    pub fn from_options(options: &BatchOptions) -> Self {
        Self::new(options.min_confidence, options.include_low_confidence)
    }

    pub fn accepts(&self, confidence: f32) -> bool {
        f64::from(confidence) >= self.min_confidence || self.include_low_confidence
    }
}
