/// Errors surfaced to callers of the classify and describe operations.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    /// A required input (the image, or the model identifier) was not supplied.
    #[error("no {0} provided")]
    MissingInput(&'static str),

    /// The task identifier does not name a supported task.
    #[error("unsupported task: {0}")]
    UnsupportedTask(String),

    /// A numeric parameter is out of range or could not be parsed.
    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The inference backend failed for any reason.
    #[error("inference backend failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// The backend answered but produced nothing that can be described.
    #[error("inference produced no usable content")]
    EmptyResult,
}

impl VisionError {
    /// Wraps a backend-specific failure.
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        VisionError::Backend(Box::new(error))
    }

    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            VisionError::MissingInput(_) => "missing_input",
            VisionError::UnsupportedTask(_) => "unsupported_task",
            VisionError::InvalidParameter { .. } => "invalid_parameter",
            VisionError::Backend(_) => "backend_error",
            VisionError::EmptyResult => "empty_result",
        }
    }

    /// HTTP-style status: 400 for caller mistakes, 500 for backend or processing failures.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() { 400 } else { 500 }
    }

    /// Whether the caller sent a bad request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VisionError::MissingInput(_)
                | VisionError::UnsupportedTask(_)
                | VisionError::InvalidParameter { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("quota exceeded")]
    struct QuotaExceeded;

    #[test]
    fn test_status_classes() {
        assert_eq!(VisionError::MissingInput("image").status_code(), 400);
        assert_eq!(VisionError::UnsupportedTask("x".into()).status_code(), 400);
        let invalid = VisionError::InvalidParameter {
            name: "maxResults",
            reason: "must be at least 1".into(),
        };
        assert_eq!(invalid.status_code(), 400);
        assert_eq!(VisionError::backend(QuotaExceeded).status_code(), 500);
        assert_eq!(VisionError::EmptyResult.status_code(), 500);
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let err = VisionError::backend(QuotaExceeded);
        assert_eq!(err.kind(), "backend_error");
        assert_eq!(err.to_string(), "inference backend failed: quota exceeded");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            VisionError::MissingInput("image").to_string(),
            "no image provided"
        );
        assert_eq!(
            VisionError::UnsupportedTask("unknown-task".into()).to_string(),
            "unsupported task: unknown-task"
        );
    }
}
