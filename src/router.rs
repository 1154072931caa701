use crate::{
    backend::{InferenceBackend, VisionOperation},
    config::{CandidateLabels, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_RESULTS},
    error::VisionError,
    result::InferenceResult,
    task::InferenceTask,
};

/// A classify request as the caller sent it, before any validation.
#[derive(Clone, Debug, Default)]
pub struct ClassifyRequest {
    pub image: Option<Vec<u8>>,
    pub model: String,
    pub task: String,
    pub confidence_threshold: Option<f64>,
    pub max_results: Option<usize>,
}

/// A validated request, ready to be dispatched.
#[derive(Clone, Debug, PartialEq)]
pub struct InferenceRequest {
    pub image: Vec<u8>,
    pub model: String,
    pub task: InferenceTask,
    pub confidence_threshold: f64,
    pub max_results: usize,
}

/// Turns requests into exactly one backend operation.
#[derive(Clone, Debug, Default)]
pub struct TaskRouter {
    candidate_labels: CandidateLabels,
}

impl TaskRouter {
    pub fn new(candidate_labels: CandidateLabels) -> Self {
        Self { candidate_labels }
    }

    pub fn candidate_labels(&self) -> &CandidateLabels {
        &self.candidate_labels
    }

    /// Validates a raw request: the image first, then the task, then the numbers.
    pub fn resolve(&self, request: ClassifyRequest) -> Result<InferenceRequest, VisionError> {
        let image = require_image(request.image)?;
        let task: InferenceTask = request.task.parse()?;
        let model = require_model(request.model)?;

        let confidence_threshold = request
            .confidence_threshold
            .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD);
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(VisionError::InvalidParameter {
                name: "confidenceThreshold",
                reason: format!("{confidence_threshold} is not within [0, 1]"),
            });
        }

        let max_results = request.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        if max_results == 0 {
            return Err(VisionError::InvalidParameter {
                name: "maxResults",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(InferenceRequest {
            image,
            model,
            task,
            confidence_threshold,
            max_results,
        })
    }

    /// Maps a validated request onto the provider operation for its task.
    pub fn route(&self, request: InferenceRequest) -> VisionOperation {
        let InferenceRequest {
            image, model, task, ..
        } = request;

        match task {
            InferenceTask::Classification => VisionOperation::ImageClassification { model, image },
            InferenceTask::Detection => VisionOperation::ObjectDetection { model, image },
            InferenceTask::Segmentation => VisionOperation::ImageSegmentation { model, image },
            InferenceTask::ZeroShotClassification => {
                VisionOperation::ZeroShotImageClassification {
                    model,
                    image,
                    candidate_labels: self.candidate_labels.to_vec(),
                }
            }
            InferenceTask::ZeroShotDetection => VisionOperation::ZeroShotObjectDetection {
                model,
                image,
                candidate_labels: self.candidate_labels.to_vec(),
            },
            InferenceTask::Captioning => VisionOperation::ImageToText {
                model,
                image,
                max_new_tokens: None,
            },
        }
    }

    /// Builds the captioning operation used by the describe flow.
    pub fn route_caption(
        &self,
        image: Option<Vec<u8>>,
        model: String,
        max_new_tokens: Option<u32>,
    ) -> Result<VisionOperation, VisionError> {
        let image = require_image(image)?;
        let model = require_model(model)?;
        if max_new_tokens == Some(0) {
            return Err(VisionError::InvalidParameter {
                name: "maxLength",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(VisionOperation::ImageToText {
            model,
            image,
            max_new_tokens,
        })
    }

    /// Sends one operation to the backend.
    pub async fn dispatch<B: InferenceBackend>(
        &self,
        backend: &B,
        operation: VisionOperation,
    ) -> Result<InferenceResult, VisionError> {
        let task = operation.task();
        log::debug!(
            "Dispatching {} to model {} ({} bytes)",
            task.pipeline_tag(),
            operation.model(),
            operation.image().len()
        );

        backend.run(operation).await.map_err(|e| {
            log::error!("Backend call for {task} failed: {e}");
            VisionError::backend(e)
        })
    }
}

fn require_image(image: Option<Vec<u8>>) -> Result<Vec<u8>, VisionError> {
    image
        .filter(|bytes| !bytes.is_empty())
        .ok_or(VisionError::MissingInput("image"))
}

fn require_model(model: String) -> Result<String, VisionError> {
    let trimmed = model.trim();
    if trimmed.is_empty() {
        return Err(VisionError::MissingInput("model"));
    }
    Ok(trimmed.to_string())
}
