use serde::Serialize;

use crate::task::InferenceTask;

/// A model offered to the user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "serialize_task")]
    pub task: InferenceTask,
}

fn serialize_task<S: serde::Serializer>(task: &InferenceTask, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(task.as_str())
}

const BUILTIN_MODELS: &[(&str, &str, InferenceTask)] = &[
    (
        "Salesforce/blip-image-captioning-large",
        "BLIP Large",
        InferenceTask::Captioning,
    ),
    (
        "microsoft/git-large-coco",
        "GIT Large COCO",
        InferenceTask::Captioning,
    ),
    (
        "nlpconnect/vit-gpt2-image-captioning",
        "ViT-GPT2",
        InferenceTask::Captioning,
    ),
    (
        "google/vit-base-patch16-224",
        "ViT Base",
        InferenceTask::Classification,
    ),
    (
        "facebook/detr-resnet-50",
        "DETR ResNet-50",
        InferenceTask::Detection,
    ),
    (
        "nvidia/segformer-b0-finetuned-ade-512-512",
        "SegFormer B0",
        InferenceTask::Segmentation,
    ),
    (
        "openai/clip-vit-large-patch14",
        "CLIP ViT-L/14",
        InferenceTask::ZeroShotClassification,
    ),
    (
        "google/owlv2-base-patch16-ensemble",
        "OWLv2 Base",
        InferenceTask::ZeroShotDetection,
    ),
];

/// Static lookup from model id to display name and task.
#[derive(Clone, Debug)]
pub struct ModelCatalog {
    entries: Vec<ModelEntry>,
}

impl ModelCatalog {
    pub fn new(entries: Vec<ModelEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Models serving the given task, in catalog order.
    pub fn for_task(&self, task: InferenceTask) -> impl Iterator<Item = &ModelEntry> {
        self.entries.iter().filter(move |entry| entry.task == task)
    }

    /// The first captioning model, used when describe is called without one.
    pub fn default_caption_model(&self) -> Option<&ModelEntry> {
        self.for_task(InferenceTask::Captioning).next()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new(
            BUILTIN_MODELS
                .iter()
                .map(|&(id, name, task)| ModelEntry {
                    id: id.to_string(),
                    name: name.to_string(),
                    task,
                })
                .collect(),
        )
    }
}
