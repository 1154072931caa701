use serde::{Deserialize, Serialize};

// multipart field names shared by the server and the client
pub const FIELD_IMAGE: &str = "image";
pub const FIELD_MODEL: &str = "model";
pub const FIELD_TASK: &str = "task";
pub const FIELD_CONFIDENCE_THRESHOLD: &str = "confidenceThreshold";
pub const FIELD_MAX_RESULTS: &str = "maxResults";
pub const FIELD_MAX_LENGTH: &str = "maxLength";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescriptionResponse {
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}
