use std::time::Instant;

use crate::{
    backend::InferenceBackend,
    catalog::ModelCatalog,
    config::DEFAULT_MAX_LENGTH,
    error::VisionError,
    normalize::{NormalizeOptions, normalize, normalize_caption},
    router::{ClassifyRequest, TaskRouter},
};

/// A describe request as the caller sent it.
#[derive(Clone, Debug, Default)]
pub struct DescribeRequest {
    pub image: Option<Vec<u8>>,
    /// Falls back to the catalog's first captioning model when empty.
    pub model: String,
    /// Falls back to `DEFAULT_MAX_LENGTH` when unset.
    pub max_length: Option<u32>,
}

/// The classify and describe operations on top of one backend.
///
/// Every call is independent: one request, one backend round trip, one description.
pub struct VisionService<B: InferenceBackend> {
    backend: B,
    router: TaskRouter,
    catalog: ModelCatalog,
}

impl<B: InferenceBackend> VisionService<B> {
    pub fn new(backend: B, router: TaskRouter, catalog: ModelCatalog) -> Self {
        Self {
            backend,
            router,
            catalog,
        }
    }

    pub fn with_backend(backend: B) -> Self {
        Self::new(backend, TaskRouter::default(), ModelCatalog::default())
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn router(&self) -> &TaskRouter {
        &self.router
    }

    pub fn models(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Runs the requested task and describes its result.
    pub async fn classify(&self, request: ClassifyRequest) -> Result<String, VisionError> {
        let request = self.router.resolve(request)?;
        let options = NormalizeOptions {
            confidence_threshold: request.confidence_threshold,
            max_results: request.max_results,
        };
        let task = request.task;

        let start_time = Instant::now();
        let operation = self.router.route(request);
        let result = self.router.dispatch(&self.backend, operation).await?;
        let description = normalize(&result, options)?;

        log::info!(
            "Classified with {} in {:?} ({} lines)",
            task,
            start_time.elapsed(),
            description.lines().count()
        );
        Ok(description)
    }

    /// Captions an image.
    pub async fn describe(&self, request: DescribeRequest) -> Result<String, VisionError> {
        let model = if request.model.trim().is_empty() {
            self.catalog
                .default_caption_model()
                .map(|entry| entry.id.clone())
                .unwrap_or_default()
        } else {
            request.model
        };

        let operation = self
            .router
            .route_caption(
                request.image,
                model,
                request.max_length.or(Some(DEFAULT_MAX_LENGTH)),
            )?;

        let start_time = Instant::now();
        let result = self.router.dispatch(&self.backend, operation).await?;
        let description = normalize_caption(&result)?;

        log::info!("Described image in {:?}", start_time.elapsed());
        Ok(description)
    }
}
