//! Defaults shared by the router, the service and the demo server.

use std::fmt;

/// Candidate labels offered to zero-shot tasks unless the caller overrides them.
pub const DEFAULT_CANDIDATE_LABELS: [&str; 6] =
    ["animal", "human", "food", "vehicle", "nature", "building"];

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;
pub const DEFAULT_MAX_RESULTS: usize = 5;
/// Maximum number of tokens generated when describing an image.
pub const DEFAULT_MAX_LENGTH: u32 = 100;

/// Hosted inference endpoint used when no other URL is configured.
pub const DEFAULT_PROVIDER_URL: &str = "https://api-inference.huggingface.co";
/// Environment variable holding the provider access token.
pub const PROVIDER_TOKEN_ENV: &str = "HUGGINGFACE_API_KEY";

/// The vocabulary zero-shot tasks classify against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateLabels(Vec<String>);

impl CandidateLabels {
    /// Builds a vocabulary, dropping blank and duplicate labels.
    ///
    /// Returns `None` when nothing usable is left.
    pub fn new<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kept: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref().trim();
            if !label.is_empty() && !kept.iter().any(|l| l == label) {
                kept.push(label.to_string());
            }
        }
        (!kept.is_empty()).then_some(Self(kept))
    }

    /// Parses a comma separated list, e.g. `"cat,dog,bird"`.
    pub fn parse_list(list: &str) -> Option<Self> {
        Self::new(list.split(','))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.as_slice().to_vec()
    }
}

impl Default for CandidateLabels {
    fn default() -> Self {
        Self(
            DEFAULT_CANDIDATE_LABELS
                .iter()
                .map(|label| label.to_string())
                .collect(),
        )
    }
}

impl fmt::Display for CandidateLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}
