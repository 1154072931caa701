use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pixel-space box attached to detection results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// A label with the provider's confidence in [0, 1].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredLabel {
    pub label: String,
    pub score: f64,
    #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl ScoredLabel {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
            bounding_box: None,
        }
    }
}

/// One unit of an inference result.
#[derive(Clone, Debug, PartialEq)]
pub enum InferenceItem {
    /// Classification, detection and zero-shot outputs.
    ScoredLabel(ScoredLabel),
    /// Captioning output.
    Text(String),
    /// Anything else, kept as the provider sent it.
    Opaque(Value),
}

impl InferenceItem {
    pub fn score(&self) -> Option<f64> {
        match self {
            InferenceItem::ScoredLabel(item) => Some(item.score),
            InferenceItem::Text(_) | InferenceItem::Opaque(_) => None,
        }
    }

    /// Classifies a single JSON value by the fields it exposes.
    pub fn from_value(value: Value) -> Self {
        let scored = value
            .get("label")
            .is_some_and(Value::is_string)
            .then(|| value.get("score").and_then(Value::as_f64))
            .flatten();
        match scored {
            Some(score) => {
                let label = value["label"].as_str().unwrap_or_default().to_string();
                let bounding_box = value
                    .get("box")
                    .cloned()
                    .and_then(|b| serde_json::from_value(b).ok());
                InferenceItem::ScoredLabel(ScoredLabel {
                    label,
                    score,
                    bounding_box,
                })
            }
            None => match text_field(&value) {
                Some(text) => InferenceItem::Text(text.to_string()),
                None => InferenceItem::Opaque(value),
            },
        }
    }
}

/// The raw, task-shaped answer of an inference operation.
#[derive(Clone, Debug, PartialEq)]
pub enum InferenceResult {
    /// Ranked items, in the provider's order.
    List(Vec<InferenceItem>),
    /// A single item, typically a caption.
    Single(InferenceItem),
    /// A structured payload with no list shape, e.g. segmentation masks.
    Structured(Value),
    /// The backend reported no content.
    Empty,
}

impl InferenceResult {
    /// Decodes a provider JSON payload.
    ///
    /// Arrays become [`InferenceResult::List`], objects exposing a text field become
    /// [`InferenceResult::Single`], anything else is kept as structured data.
    pub fn from_value(value: Value) -> Self {
        if value.is_object() && text_field(&value).is_some() {
            return InferenceResult::Single(InferenceItem::from_value(value));
        }
        match value {
            Value::Null => InferenceResult::Empty,
            Value::String(text) if text.is_empty() => InferenceResult::Empty,
            Value::Array(items) => {
                InferenceResult::List(items.into_iter().map(InferenceItem::from_value).collect())
            }
            other => InferenceResult::Structured(other),
        }
    }

    /// Decodes a captioning payload, unwrapping the one-element list some providers return.
    pub fn from_caption_value(value: Value) -> Self {
        match value {
            Value::Array(mut items) if items.len() == 1 && text_field(&items[0]).is_some() => {
                InferenceResult::Single(InferenceItem::from_value(items.remove(0)))
            }
            Value::String(text) if !text.is_empty() => {
                InferenceResult::Single(InferenceItem::Text(text))
            }
            other => InferenceResult::from_value(other),
        }
    }
}

fn text_field(value: &Value) -> Option<&str> {
    value
        .get("generated_text")
        .or_else(|| value.get("text"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classification_payload() {
        let result = InferenceResult::from_value(json!([
            {"label": "cat", "score": 0.92},
            {"label": "dog", "score": 0.4}
        ]));
        assert_eq!(
            result,
            InferenceResult::List(vec![
                InferenceItem::ScoredLabel(ScoredLabel::new("cat", 0.92)),
                InferenceItem::ScoredLabel(ScoredLabel::new("dog", 0.4)),
            ])
        );
    }

    #[test]
    fn test_detection_payload_keeps_box() {
        let result = InferenceResult::from_value(json!([
            {"label": "car", "score": 0.8, "box": {"xmin": 1, "ymin": 2, "xmax": 30, "ymax": 40}}
        ]));
        let InferenceResult::List(items) = result else {
            panic!("expected a list");
        };
        let InferenceItem::ScoredLabel(item) = &items[0] else {
            panic!("expected a scored label");
        };
        assert_eq!(
            item.bounding_box,
            Some(BoundingBox {
                xmin: 1.0,
                ymin: 2.0,
                xmax: 30.0,
                ymax: 40.0
            })
        );
    }

    #[test]
    fn test_segment_without_score_is_opaque() {
        let segment = json!({"label": "sky", "score": null, "mask": "iVBORw0KGgo="});
        assert_eq!(
            InferenceItem::from_value(segment.clone()),
            InferenceItem::Opaque(segment)
        );
    }

    #[test]
    fn test_caption_object_is_single_text() {
        let result = InferenceResult::from_value(json!({"generated_text": "a dog running on grass"}));
        assert_eq!(
            result,
            InferenceResult::Single(InferenceItem::Text("a dog running on grass".into()))
        );
    }

    #[test]
    fn test_caption_list_is_unwrapped() {
        let result = InferenceResult::from_caption_value(json!([{"generated_text": "a red bus"}]));
        assert_eq!(
            result,
            InferenceResult::Single(InferenceItem::Text("a red bus".into()))
        );
    }

    #[test]
    fn test_other_shapes() {
        assert_eq!(InferenceResult::from_value(Value::Null), InferenceResult::Empty);
        assert_eq!(InferenceResult::from_value(json!("")), InferenceResult::Empty);
        assert_eq!(InferenceResult::from_caption_value(json!("")), InferenceResult::Empty);
        let masks = json!({"masks": [[0, 1], [1, 0]]});
        assert_eq!(
            InferenceResult::from_value(masks.clone()),
            InferenceResult::Structured(masks)
        );
    }
}
