//! Backend for the Hugging Face serverless inference API.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{Client, header};
use serde::Serialize;
use serde_json::Value;

use crate::{
    backend::{InferenceBackend, VisionOperation},
    config::DEFAULT_PROVIDER_URL,
    result::InferenceResult,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, thiserror::Error)]
pub enum HfError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// JSON body used when an operation carries parameters besides the image.
#[derive(Debug, Serialize)]
struct JsonInputs<P: Serialize> {
    inputs: String,
    parameters: P,
}

#[derive(Debug, Serialize)]
struct CandidateParameters<'a> {
    candidate_labels: &'a [String],
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
}

/// Calls `POST {base_url}/models/{model}` for each operation.
#[derive(Clone, Debug)]
pub struct HfBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HfBackend {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, HfError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let token = token.filter(|t| !t.is_empty());
        log::info!(
            "Inference provider configured: {} ({})",
            base_url,
            if token.is_some() { "authenticated" } else { "anonymous" }
        );
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Uses the public endpoint.
    pub fn hosted(token: Option<String>) -> Result<Self, HfError> {
        Self::new(DEFAULT_PROVIDER_URL, token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    async fn post_bytes(&self, model: &str, image: Vec<u8>) -> Result<Option<Value>, HfError> {
        let request = self
            .client
            .post(self.model_url(model))
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(image);
        self.send(request).await
    }

    async fn post_json<P: Serialize>(
        &self,
        model: &str,
        image: &[u8],
        parameters: P,
    ) -> Result<Option<Value>, HfError> {
        let body = JsonInputs {
            inputs: STANDARD.encode(image),
            parameters,
        };
        let request = self.client.post(self.model_url(model)).json(&body);
        self.send(request).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Option<Value>, HfError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            log::warn!("Provider answered {status}: {body}");
            return Err(HfError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

impl InferenceBackend for HfBackend {
    type Error = HfError;

    async fn run(&self, operation: VisionOperation) -> Result<InferenceResult, Self::Error> {
        let captioning = matches!(operation, VisionOperation::ImageToText { .. });

        let payload = match operation {
            VisionOperation::ImageClassification { model, image }
            | VisionOperation::ObjectDetection { model, image }
            | VisionOperation::ImageSegmentation { model, image }
            | VisionOperation::ImageToText {
                model,
                image,
                max_new_tokens: None,
            } => self.post_bytes(&model, image).await?,
            VisionOperation::ZeroShotImageClassification {
                model,
                image,
                candidate_labels,
            }
            | VisionOperation::ZeroShotObjectDetection {
                model,
                image,
                candidate_labels,
            } => {
                let parameters = CandidateParameters {
                    candidate_labels: &candidate_labels,
                };
                self.post_json(&model, &image, parameters).await?
            }
            VisionOperation::ImageToText {
                model,
                image,
                max_new_tokens: Some(max_new_tokens),
            } => {
                self.post_json(&model, &image, GenerationParameters { max_new_tokens })
                    .await?
            }
        };

        let Some(payload) = payload else {
            log::debug!("Provider returned an empty body");
            return Ok(InferenceResult::Empty);
        };

        Ok(if captioning {
            InferenceResult::from_caption_value(payload)
        } else {
            InferenceResult::from_value(payload)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::InferenceItem;
    use axum::{
        Router,
        body::Bytes,
        http::{HeaderMap, StatusCode, Uri},
        routing::post,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// What the provider stub saw for one call.
    #[derive(Clone, Debug)]
    struct Received {
        path: String,
        content_type: Option<String>,
        authorization: Option<String>,
        body: Vec<u8>,
    }

    type Log = Arc<Mutex<Vec<Received>>>;

    /// Starts a provider stub answering every model call with `status` and `reply`.
    async fn provider_stub(status: StatusCode, reply: &'static str) -> (String, Log) {
        let log: Log = Arc::default();
        let app = Router::new().route(
            "/models/{*model}",
            post({
                let log = log.clone();
                move |uri: Uri, headers: HeaderMap, body: Bytes| {
                    let log = log.clone();
                    async move {
                        let header_value = |name: header::HeaderName| {
                            headers
                                .get(name)
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string)
                        };
                        log.lock().unwrap().push(Received {
                            path: uri.path().to_string(),
                            content_type: header_value(header::CONTENT_TYPE),
                            authorization: header_value(header::AUTHORIZATION),
                            body: body.to_vec(),
                        });
                        (status, reply)
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        (format!("http://{addr}"), log)
    }

    fn received(log: &Log) -> Vec<Received> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_plain_task_posts_raw_bytes_with_token() {
        let (url, log) =
            provider_stub(StatusCode::OK, r#"[{"label": "cat", "score": 0.9}]"#).await;
        let backend = HfBackend::new(&url, Some("secret".to_string())).unwrap();

        let result = backend
            .run(VisionOperation::ImageClassification {
                model: "google/vit-base-patch16-224".to_string(),
                image: vec![0xff, 0xd8, 0xff],
            })
            .await
            .unwrap();

        assert_eq!(
            result,
            InferenceResult::List(vec![InferenceItem::ScoredLabel(
                crate::result::ScoredLabel::new("cat", 0.9)
            )])
        );
        let calls = received(&log);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/models/google/vit-base-patch16-224");
        assert_eq!(
            calls[0].content_type.as_deref(),
            Some("application/octet-stream")
        );
        assert_eq!(calls[0].authorization.as_deref(), Some("Bearer secret"));
        assert_eq!(calls[0].body, vec![0xff, 0xd8, 0xff]);
    }

    #[tokio::test]
    async fn test_zero_shot_posts_json_with_labels() {
        let (url, log) =
            provider_stub(StatusCode::OK, r#"[{"label": "animal", "score": 0.7}]"#).await;
        let backend = HfBackend::new(&url, None).unwrap();

        backend
            .run(VisionOperation::ZeroShotImageClassification {
                model: "openai/clip-vit-large-patch14".to_string(),
                image: vec![1, 2, 3],
                candidate_labels: vec!["animal".to_string(), "food".to_string()],
            })
            .await
            .unwrap();

        let calls = received(&log);
        assert_eq!(calls[0].content_type.as_deref(), Some("application/json"));
        assert_eq!(calls[0].authorization, None);
        let body: Value = serde_json::from_slice(&calls[0].body).unwrap();
        assert_eq!(
            body,
            json!({"inputs": "AQID", "parameters": {"candidate_labels": ["animal", "food"]}})
        );
    }

    #[tokio::test]
    async fn test_limited_caption_posts_json_and_unwraps_reply() {
        let (url, log) =
            provider_stub(StatusCode::OK, r#"[{"generated_text": "a red bus"}]"#).await;
        let backend = HfBackend::new(&url, None).unwrap();

        let result = backend
            .run(VisionOperation::ImageToText {
                model: "microsoft/git-large-coco".to_string(),
                image: b"img".to_vec(),
                max_new_tokens: Some(100),
            })
            .await
            .unwrap();

        assert_eq!(
            result,
            InferenceResult::Single(InferenceItem::Text("a red bus".to_string()))
        );
        let calls = received(&log);
        assert_eq!(calls[0].content_type.as_deref(), Some("application/json"));
        let body: Value = serde_json::from_slice(&calls[0].body).unwrap();
        assert_eq!(body["parameters"]["max_new_tokens"], 100);
    }

    #[tokio::test]
    async fn test_unlimited_caption_posts_raw_bytes() {
        let (url, log) =
            provider_stub(StatusCode::OK, r#"[{"generated_text": "a cat"}]"#).await;
        let backend = HfBackend::new(&url, None).unwrap();

        backend
            .run(VisionOperation::ImageToText {
                model: "nlpconnect/vit-gpt2-image-captioning".to_string(),
                image: vec![7, 7],
                max_new_tokens: None,
            })
            .await
            .unwrap();

        let calls = received(&log);
        assert_eq!(
            calls[0].content_type.as_deref(),
            Some("application/octet-stream")
        );
        assert_eq!(calls[0].body, vec![7, 7]);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (url, _log) =
            provider_stub(StatusCode::SERVICE_UNAVAILABLE, "model is loading").await;
        let backend = HfBackend::new(&url, None).unwrap();

        let err = backend
            .run(VisionOperation::ObjectDetection {
                model: "facebook/detr-resnet-50".to_string(),
                image: vec![1],
            })
            .await
            .unwrap_err();

        match err {
            HfError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model is loading");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_body_is_empty_result() {
        let (url, _log) = provider_stub(StatusCode::OK, "  \n").await;
        let backend = HfBackend::new(&url, None).unwrap();

        let result = backend
            .run(VisionOperation::ImageSegmentation {
                model: "nvidia/segformer-b0-finetuned-ade-512-512".to_string(),
                image: vec![1],
            })
            .await
            .unwrap();

        assert_eq!(result, InferenceResult::Empty);
    }

    #[test]
    fn test_model_url_trims_trailing_slash() {
        let backend = HfBackend::new("http://localhost:8080/", None).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8080");
        assert_eq!(
            backend.model_url("google/vit-base-patch16-224"),
            "http://localhost:8080/models/google/vit-base-patch16-224"
        );
    }

    #[test]
    fn test_blank_token_is_dropped() {
        let backend = HfBackend::new("http://localhost", Some(String::new())).unwrap();
        assert!(backend.token.is_none());
    }

    #[test]
    fn test_zero_shot_body() {
        let labels = vec!["cat".to_string(), "dog".to_string()];
        let body = JsonInputs {
            inputs: STANDARD.encode([1u8, 2, 3]),
            parameters: CandidateParameters {
                candidate_labels: &labels,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"inputs": "AQID", "parameters": {"candidate_labels": ["cat", "dog"]}})
        );
    }

    #[test]
    fn test_generation_body() {
        let body = JsonInputs {
            inputs: STANDARD.encode(b"img"),
            parameters: GenerationParameters { max_new_tokens: 100 },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"inputs": "aW1n", "parameters": {"max_new_tokens": 100}})
        );
    }
}
