//! Task dispatch and result normalization for hosted vision inference.
//!
//! A caller hands over an image, a model and a task identifier. The [`TaskRouter`]
//! validates the request and turns it into exactly one [`VisionOperation`], an
//! [`InferenceBackend`] runs it, and [`normalize`] reduces whatever shape comes back
//! to a single description string.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod hf;
pub mod normalize;
pub mod result;
pub mod router;
pub mod service;
pub mod task;

pub use backend::{InferenceBackend, VisionOperation};
pub use catalog::{ModelCatalog, ModelEntry};
pub use config::CandidateLabels;
pub use error::VisionError;
pub use hf::{HfBackend, HfError};
pub use normalize::{NormalizeOptions, normalize, normalize_caption};
pub use result::{BoundingBox, InferenceItem, InferenceResult, ScoredLabel};
pub use router::{ClassifyRequest, InferenceRequest, TaskRouter};
pub use service::{DescribeRequest, VisionService};
pub use task::InferenceTask;
