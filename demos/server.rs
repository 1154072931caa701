use argh::FromArgs;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use std::{str::FromStr, sync::Arc};
use vision_describe::{
    CandidateLabels, ClassifyRequest, DescribeRequest, HfBackend, ModelCatalog, TaskRouter,
    VisionError, VisionService,
    config::{DEFAULT_PROVIDER_URL, PROVIDER_TOKEN_ENV},
};

mod messages;

// defaults for the server
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

type Service = Arc<VisionService<HfBackend>>;

#[derive(FromArgs)]
/// Describes uploaded images with hosted vision models.
struct ServerArgs {
    /// the host to run the server on
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to run the server on
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// the inference provider base url
    #[argh(option, default = "DEFAULT_PROVIDER_URL.to_string()")]
    provider_url: String,

    /// comma separated candidate labels for zero-shot tasks
    #[argh(option, short = 'l')]
    labels: Option<String>,
}

/// The multipart fields of an upload, before validation.
#[derive(Default)]
struct UploadForm {
    image: Option<Vec<u8>>,
    model: String,
    task: String,
    confidence_threshold: Option<String>,
    max_results: Option<String>,
    max_length: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, (StatusCode, Json<serde_json::Value>)> {
        let mut form = UploadForm::default();
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => return Err(error_body(StatusCode::BAD_REQUEST, "invalid_form", e)),
            };
            let name = field.name().unwrap_or_default().to_string();
            if name == messages::FIELD_IMAGE {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| error_body(StatusCode::BAD_REQUEST, "invalid_form", e))?;
                form.image = Some(bytes.to_vec());
                continue;
            }
            let value = field
                .text()
                .await
                .map_err(|e| error_body(StatusCode::BAD_REQUEST, "invalid_form", e))?;
            match name.as_str() {
                messages::FIELD_MODEL => form.model = value,
                messages::FIELD_TASK => form.task = value,
                messages::FIELD_CONFIDENCE_THRESHOLD => form.confidence_threshold = Some(value),
                messages::FIELD_MAX_RESULTS => form.max_results = Some(value),
                messages::FIELD_MAX_LENGTH => form.max_length = Some(value),
                other => log::debug!("Ignoring form field {other}"),
            }
        }
        Ok(form)
    }
}

fn parse_field<T: FromStr>(name: &'static str, value: Option<String>) -> Result<Option<T>, VisionError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            v.trim().parse::<T>().map_err(|_| VisionError::InvalidParameter {
                name,
                reason: format!("'{v}' is not a number"),
            })
        })
        .transpose()
}

fn error_body(
    status: StatusCode,
    kind: &str,
    error: impl std::fmt::Display,
) -> (StatusCode, Json<serde_json::Value>) {
    let body = messages::ErrorResponse {
        error: error.to_string(),
        kind: kind.to_string(),
    };
    (status, Json(json!(body)))
}

fn vision_error(err: VisionError) -> (StatusCode, Json<serde_json::Value>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if err.is_client_error() {
        log::debug!("Rejected request: {err}");
    } else {
        log::error!("Failed to process image: {err}");
    }
    error_body(status, err.kind(), &err)
}

fn description(description: String) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!(messages::DescriptionResponse { description })),
    )
}

async fn post_classify(State(service): State<Service>, multipart: Multipart) -> impl IntoResponse {
    let form = match UploadForm::read(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let request = match (
        parse_field(messages::FIELD_CONFIDENCE_THRESHOLD, form.confidence_threshold),
        parse_field(messages::FIELD_MAX_RESULTS, form.max_results),
    ) {
        (Ok(confidence_threshold), Ok(max_results)) => ClassifyRequest {
            image: form.image,
            model: form.model,
            task: form.task,
            confidence_threshold,
            max_results,
        },
        (Err(e), _) | (_, Err(e)) => return vision_error(e),
    };

    match service.classify(request).await {
        Ok(text) => description(text),
        Err(e) => vision_error(e),
    }
}

async fn post_describe(State(service): State<Service>, multipart: Multipart) -> impl IntoResponse {
    let form = match UploadForm::read(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let max_length = match parse_field(messages::FIELD_MAX_LENGTH, form.max_length) {
        Ok(max_length) => max_length,
        Err(e) => return vision_error(e),
    };

    let request = DescribeRequest {
        image: form.image,
        model: form.model,
        max_length,
    };

    match service.describe(request).await {
        Ok(text) => description(text),
        Err(e) => vision_error(e),
    }
}

async fn get_models(State(service): State<Service>) -> impl IntoResponse {
    Json(json!({ "models": service.models().entries() }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: ServerArgs = argh::from_env();

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    let labels = match args.labels.as_deref() {
        Some(list) => CandidateLabels::parse_list(list).ok_or("no usable candidate labels")?,
        None => CandidateLabels::default(),
    };
    let token = std::env::var(PROVIDER_TOKEN_ENV).ok();
    if token.is_none() {
        log::warn!("{PROVIDER_TOKEN_ENV} is not set, calling the provider anonymously");
    }

    let backend = HfBackend::new(&args.provider_url, token)?;
    let service = Arc::new(VisionService::new(
        backend,
        TaskRouter::new(labels),
        ModelCatalog::default(),
    ));
    log::info!(
        "Zero-shot candidate labels: {}",
        service.router().candidate_labels()
    );

    let app = Router::new()
        .route("/", get(|| async { "Vision describe server" }))
        .route("/api/classify", post(post_classify))
        .route("/api/describe", post(post_describe))
        .route("/models", get(get_models))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service);

    log::info!("Starting the server");
    log::info!("Listening on: {}", addr);
    log::info!("Press Ctrl+C to stop the server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
