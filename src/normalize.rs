//! Reduces any [`InferenceResult`] to the text shown to the user.

use serde_json::Value;

use crate::{
    error::VisionError,
    result::{InferenceItem, InferenceResult, ScoredLabel},
};

/// Filtering and capping applied to list-shaped results.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizeOptions {
    /// Inclusive lower bound on item scores.
    pub confidence_threshold: f64,
    pub max_results: usize,
}

/// Renders a result as a description.
///
/// Lists are filtered on score, capped to `max_results` in provider order and joined
/// one line per item. An empty list after filtering yields an empty string.
pub fn normalize(
    result: &InferenceResult,
    options: NormalizeOptions,
) -> Result<String, VisionError> {
    match result {
        InferenceResult::List(items) => Ok(retain(items, options)
            .map(render_item)
            .collect::<Vec<_>>()
            .join("\n")),
        InferenceResult::Single(InferenceItem::Text(text)) if text.is_empty() => {
            Err(VisionError::EmptyResult)
        }
        InferenceResult::Single(item) => Ok(render_item(item)),
        InferenceResult::Structured(Value::String(text)) if text.is_empty() => {
            Err(VisionError::EmptyResult)
        }
        InferenceResult::Structured(Value::String(text)) => Ok(text.clone()),
        InferenceResult::Structured(value) => Ok(pretty(value)),
        InferenceResult::Empty => Err(VisionError::EmptyResult),
    }
}

/// Extracts the caption of a captioning result.
pub fn normalize_caption(result: &InferenceResult) -> Result<String, VisionError> {
    match result {
        InferenceResult::Single(InferenceItem::Text(text)) if !text.is_empty() => {
            Ok(text.clone())
        }
        other => {
            log::warn!("Captioning produced no text: {other:?}");
            Err(VisionError::EmptyResult)
        }
    }
}

/// Items passing the threshold, capped, in their original order.
pub fn retain(
    items: &[InferenceItem],
    options: NormalizeOptions,
) -> impl Iterator<Item = &InferenceItem> {
    items
        .iter()
        .filter(move |item| {
            item.score()
                .is_none_or(|score| score >= options.confidence_threshold)
        })
        .take(options.max_results)
}

fn render_item(item: &InferenceItem) -> String {
    match item {
        InferenceItem::ScoredLabel(scored) => render_scored(scored),
        InferenceItem::Text(text) => text.clone(),
        InferenceItem::Opaque(value) => pretty(value),
    }
}

fn render_scored(item: &ScoredLabel) -> String {
    format!("{} ({}% confidence)", item.label, percent(item.score))
}

/// Formats a score in [0, 1] as a percentage with two decimals, rounding half up.
pub fn percent(score: f64) -> String {
    let hundredths = (score * 10_000.0).round();
    format!("{:.2}", hundredths / 100.0)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
