use std::{fmt, str::FromStr};

use crate::error::VisionError;

/// The vision-inference tasks a request can select.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InferenceTask {
    Classification,
    Detection,
    Segmentation,
    ZeroShotClassification,
    ZeroShotDetection,
    Captioning,
}

impl InferenceTask {
    pub const ALL: [InferenceTask; 6] = [
        InferenceTask::Classification,
        InferenceTask::Detection,
        InferenceTask::Segmentation,
        InferenceTask::ZeroShotClassification,
        InferenceTask::ZeroShotDetection,
        InferenceTask::Captioning,
    ];

    /// Returns the task identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            InferenceTask::Classification => "classification",
            InferenceTask::Detection => "detection",
            InferenceTask::Segmentation => "segmentation",
            InferenceTask::ZeroShotClassification => "zero-shot-classification",
            InferenceTask::ZeroShotDetection => "zero-shot-detection",
            InferenceTask::Captioning => "captioning",
        }
    }

    /// Returns the hosted provider's pipeline tag for this task.
    pub fn pipeline_tag(&self) -> &'static str {
        match self {
            InferenceTask::Classification => "image-classification",
            InferenceTask::Detection => "object-detection",
            InferenceTask::Segmentation => "image-segmentation",
            InferenceTask::ZeroShotClassification => "zero-shot-image-classification",
            InferenceTask::ZeroShotDetection => "zero-shot-object-detection",
            InferenceTask::Captioning => "image-to-text",
        }
    }

    /// Whether the task needs a candidate label vocabulary.
    pub fn is_zero_shot(&self) -> bool {
        matches!(
            self,
            InferenceTask::ZeroShotClassification | InferenceTask::ZeroShotDetection
        )
    }
}

impl fmt::Display for InferenceTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InferenceTask {
    type Err = VisionError;

    /// Accepts both the short identifiers and the provider pipeline tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        InferenceTask::ALL
            .into_iter()
            .find(|task| task.as_str() == id || task.pipeline_tag() == id)
            .ok_or_else(|| VisionError::UnsupportedTask(s.to_string()))
    }
}
