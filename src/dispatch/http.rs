use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::dispatch::poll::StatusSource;
use crate::dispatch::task::TaskKind;
use crate::error::ProxyError;

const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

/// Per-call ceiling for a single upstream round trip (submit, status, credits).
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const CREDITS_PATH: &str = "/api/v1/generate/credit";

/// Raw answer to a submission, before any interpretation.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

impl UpstreamResponse {
    /// Extract `data.taskId` from a submission response.
    ///
    /// Non-2xx is an [`ProxyError::UpstreamRejection`]; a 2xx without a
    /// `data` object carrying a non-empty string `taskId` is a
    /// [`ProxyError::ProtocolViolation`].
    pub fn into_task_id(self) -> Result<String, ProxyError> {
        if !self.status.is_success() {
            return Err(ProxyError::UpstreamRejection {
                status: self.status.as_u16(),
                body: self.body,
            });
        }

        let parsed: Option<Value> = serde_json::from_str(&self.body).ok();
        let Some(data) = parsed
            .as_ref()
            .and_then(|v| v.get("data"))
            .filter(|d| d.is_object())
        else {
            return Err(ProxyError::ProtocolViolation {
                message: "no valid data envelope received from upstream".to_string(),
                body: self.body,
            });
        };

        match data.get("taskId").and_then(Value::as_str).map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(ProxyError::ProtocolViolation {
                message: "no taskId received from upstream".to_string(),
                body: self.body,
            }),
        }
    }
}

/// Authenticated client for the generation API.
pub struct SunoClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SunoClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(REQUEST_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST a job payload. No retry; the status is handed back as-is.
    pub async fn submit<P: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &P,
    ) -> Result<UpstreamResponse, ProxyError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let bytes = read_capped(response).await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        tracing::debug!(path, status = status.as_u16(), "upstream submission answered");

        Ok(UpstreamResponse { status, body })
    }

    /// Single status lookup for a task.
    pub async fn fetch_status(&self, kind: TaskKind, task_id: &str) -> Result<Value, ProxyError> {
        let response = self
            .client
            .get(self.url(kind.status_path()))
            .bearer_auth(&self.api_key)
            .query(&[("taskId", task_id)])
            .send()
            .await?;

        json_or_rejection(response).await
    }

    /// Remaining credit balance, passed through verbatim.
    pub async fn fetch_credits(&self) -> Result<Value, ProxyError> {
        let response = self
            .client
            .get(self.url(CREDITS_PATH))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        json_or_rejection(response).await
    }
}

impl StatusSource for SunoClient {
    async fn task_status(&self, kind: TaskKind, task_id: &str) -> Result<Value, ProxyError> {
        self.fetch_status(kind, task_id).await
    }
}

/// Read a body, refusing anything over [`MAX_RESPONSE_BYTES`].
async fn read_capped(response: reqwest::Response) -> Result<Vec<u8>, ProxyError> {
    if let Some(len) = response.content_length()
        && len as usize > MAX_RESPONSE_BYTES
    {
        return Err(ProxyError::SchemaParse(format!(
            "response too large: {len} bytes (max {MAX_RESPONSE_BYTES})"
        )));
    }

    let bytes = response.bytes().await?;
    if bytes.len() > MAX_RESPONSE_BYTES {
        return Err(ProxyError::SchemaParse(format!(
            "response too large: {} bytes (max {MAX_RESPONSE_BYTES})",
            bytes.len()
        )));
    }
    Ok(bytes.to_vec())
}

async fn json_or_rejection(response: reqwest::Response) -> Result<Value, ProxyError> {
    let status = response.status();
    let bytes = read_capped(response).await?;

    if !status.is_success() {
        return Err(ProxyError::UpstreamRejection {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| ProxyError::SchemaParse(format!("failed to parse response: {e}")))
}
