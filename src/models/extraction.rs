use serde::{Deserialize, Serialize};

use super::lenient;

/// Confidence at or above which an extraction is shown as high confidence.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Medication fields read off a scanned label by the remote extractor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedData {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub dosage: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub frequency: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub instructions: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
}

impl ConfidenceTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High confidence - information extracted successfully",
            Self::Medium => "Medium confidence - please verify the information",
        }
    }
}

impl ExtractedData {
    /// Confidence clamped into [0, 1]; NaN reads as zero.
    pub fn clamped_confidence(&self) -> f64 {
        if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        }
    }

    pub fn confidence_tier(&self) -> ConfidenceTier {
        if self.clamped_confidence() >= HIGH_CONFIDENCE_THRESHOLD {
            ConfidenceTier::High
        } else {
            ConfidenceTier::Medium
        }
    }

    /// Rounded percentage for display.
    pub fn confidence_percent(&self) -> u8 {
        (self.clamped_confidence() * 100.0).round() as u8
    }
}
