use crate::{result::InferenceResult, task::InferenceTask};

/// A call to one of the hosted provider's vision operations.
#[derive(Clone, Debug, PartialEq)]
pub enum VisionOperation {
    ImageClassification {
        model: String,
        image: Vec<u8>,
    },
    ObjectDetection {
        model: String,
        image: Vec<u8>,
    },
    ImageSegmentation {
        model: String,
        image: Vec<u8>,
    },
    ZeroShotImageClassification {
        model: String,
        image: Vec<u8>,
        candidate_labels: Vec<String>,
    },
    ZeroShotObjectDetection {
        model: String,
        image: Vec<u8>,
        candidate_labels: Vec<String>,
    },
    ImageToText {
        model: String,
        image: Vec<u8>,
        /// Upper bound on generated tokens, left to the provider when unset.
        max_new_tokens: Option<u32>,
    },
}

impl VisionOperation {
    pub fn task(&self) -> InferenceTask {
        match self {
            VisionOperation::ImageClassification { .. } => InferenceTask::Classification,
            VisionOperation::ObjectDetection { .. } => InferenceTask::Detection,
            VisionOperation::ImageSegmentation { .. } => InferenceTask::Segmentation,
            VisionOperation::ZeroShotImageClassification { .. } => {
                InferenceTask::ZeroShotClassification
            }
            VisionOperation::ZeroShotObjectDetection { .. } => InferenceTask::ZeroShotDetection,
            VisionOperation::ImageToText { .. } => InferenceTask::Captioning,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            VisionOperation::ImageClassification { model, .. }
            | VisionOperation::ObjectDetection { model, .. }
            | VisionOperation::ImageSegmentation { model, .. }
            | VisionOperation::ZeroShotImageClassification { model, .. }
            | VisionOperation::ZeroShotObjectDetection { model, .. }
            | VisionOperation::ImageToText { model, .. } => model,
        }
    }

    pub fn image(&self) -> &[u8] {
        match self {
            VisionOperation::ImageClassification { image, .. }
            | VisionOperation::ObjectDetection { image, .. }
            | VisionOperation::ImageSegmentation { image, .. }
            | VisionOperation::ZeroShotImageClassification { image, .. }
            | VisionOperation::ZeroShotObjectDetection { image, .. }
            | VisionOperation::ImageToText { image, .. } => image,
        }
    }
}

/// The external service that runs the models.
///
/// Implementors receive exactly one [`VisionOperation`] per request and return the
/// task-shaped result, or their own error type for any failure.
pub trait InferenceBackend {
    /// The error type returned when the provider call fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs the operation against the provider.
    fn run(
        &self,
        operation: VisionOperation,
    ) -> impl Future<Output = Result<InferenceResult, Self::Error>> + Send;
}
