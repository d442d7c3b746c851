use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use url::Url;

use crate::types::TemplateList;
use crate::{CompileError, FailureKind, RenderRequest, RenderResponse};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub base_url: String,
    pub render_path: String,
    pub templates_path: String,
    /// Per-job intermediate source; `{job_id}` is substituted.
    pub source_path_template: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Local deadline for a render; `None` waits for the backend indefinitely.
    pub render_deadline: Option<Duration>,
    /// Debounce delay for durable saves; zero writes on every edit.
    pub save_delay: Duration,
    pub max_artifact_bytes: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            render_path: "/api/render".to_string(),
            templates_path: "/api/templates".to_string(),
            source_path_template: "/build/{job_id}/document.tex".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            render_deadline: None,
            save_delay: Duration::from_millis(1000),
            max_artifact_bytes: 50 * 1024 * 1024,
        }
    }
}

/// The remote compile backend, as seen by the engine.
#[async_trait::async_trait]
pub trait CompileService: Send + Sync {
    async fn submit(&self, request: &RenderRequest) -> Result<RenderResponse, CompileError>;

    async fn fetch_source(&self, job_id: &str) -> Result<String, CompileError>;

    async fn list_templates(&self) -> Result<Vec<String>, CompileError>;

    async fn fetch_artifact(&self, artifact_ref: &str) -> Result<Bytes, CompileError>;

    /// Non-compiling submission, then the per-job intermediate source.
    async fn extract_source(&self, request: &RenderRequest) -> Result<String, CompileError> {
        let response = self.submit(request).await?;
        if !response.success {
            return Err(CompileError::new(
                FailureKind::Rejected,
                response.detail.unwrap_or_else(|| "conversion failed".to_string()),
            ));
        }
        let job_id = response
            .job_id
            .ok_or_else(|| CompileError::new(FailureKind::Protocol, "response carried no job_id"))?;
        self.fetch_source(&job_id).await
    }
}

/// Submits with the optional local deadline applied.
pub async fn submit_with_deadline(
    service: &dyn CompileService,
    request: &RenderRequest,
    deadline: Option<Duration>,
) -> Result<RenderResponse, CompileError> {
    let Some(after) = deadline else {
        return service.submit(request).await;
    };
    match tokio::time::timeout(after, service.submit(request)).await {
        Ok(result) => result,
        Err(_) => Err(CompileError::new(
            FailureKind::DeadlineExceeded { after },
            "render abandoned locally; the backend job may still finish",
        )),
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestCompileService {
    settings: EngineSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestCompileService {
    pub fn new(settings: EngineSettings) -> Result<Self, CompileError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| CompileError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| CompileError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    /// Resolves a backend reference (absolute, or relative like `/build/x/document.pdf`).
    pub fn resolve(&self, reference: &str) -> Result<Url, CompileError> {
        self.base
            .join(reference)
            .map_err(|err| CompileError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn source_path(&self, job_id: &str) -> Result<String, CompileError> {
        let valid = !job_id.is_empty()
            && job_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CompileError::new(
                FailureKind::Protocol,
                format!("unusable job_id {job_id:?}"),
            ));
        }
        Ok(self.settings.source_path_template.replace("{job_id}", job_id))
    }

    async fn get_text(&self, url: Url) -> Result<String, CompileError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        response.text().await.map_err(map_reqwest_error)
    }
}

#[async_trait::async_trait]
impl CompileService for ReqwestCompileService {
    async fn submit(&self, request: &RenderRequest) -> Result<RenderResponse, CompileError> {
        let url = self.resolve(&self.settings.render_path)?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let body = response.text().await.map_err(map_reqwest_error)?;
        serde_json::from_str(&body)
            .map_err(|err| CompileError::new(FailureKind::Protocol, err.to_string()))
    }

    async fn fetch_source(&self, job_id: &str) -> Result<String, CompileError> {
        let url = self.resolve(&self.source_path(job_id)?)?;
        self.get_text(url).await
    }

    async fn list_templates(&self) -> Result<Vec<String>, CompileError> {
        let url = self.resolve(&self.settings.templates_path)?;
        let body = self.get_text(url).await?;
        let list: TemplateList = serde_json::from_str(&body)
            .map_err(|err| CompileError::new(FailureKind::Protocol, err.to_string()))?;
        Ok(list.templates)
    }

    async fn fetch_artifact(&self, artifact_ref: &str) -> Result<Bytes, CompileError> {
        let url = self.resolve(artifact_ref)?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let max_bytes = self.settings.max_artifact_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(CompileError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "artifact too large",
                ));
            }
        }

        let mut bytes = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(CompileError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "artifact too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes.freeze())
    }
}

/// Turns a non-2xx response into an error, preferring the backend's `detail`.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, CompileError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = detail_from_body(&body).unwrap_or_else(|| status.to_string());
    Err(CompileError::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

fn detail_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        serde_json::Value::Null => None,
        // FastAPI-style validation errors carry a structured list.
        other => Some(other.to_string()),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> CompileError {
    if err.is_timeout() {
        return CompileError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return CompileError::new(FailureKind::Protocol, err.to_string());
    }
    CompileError::new(FailureKind::Network, err.to_string())
}
