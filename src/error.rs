use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// A conditionally required field is missing. Never forwarded upstream.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Upstream answered a submission with a non-2xx status.
    #[error("upstream rejected request with HTTP {status}")]
    UpstreamRejection { status: u16, body: String },

    /// Upstream answered 2xx but the body lacks the envelope we need.
    #[error("{message}")]
    ProtocolViolation { message: String, body: String },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("schema parse error: {0}")]
    SchemaParse(String),

    #[error("task polling cancelled")]
    Cancelled,
}

impl ProxyError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status this error maps to at the proxy's surface.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            // An upstream status outside the valid range still has to go somewhere.
            Self::UpstreamRejection { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::ProtocolViolation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Request(_) | Self::SchemaParse(_) => StatusCode::BAD_GATEWAY,
            Self::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Short machine-readable code included in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UpstreamRejection { .. } => "UPSTREAM_REJECTION",
            Self::ProtocolViolation { .. } => "PROTOCOL_VIOLATION",
            Self::Request(_) => "UPSTREAM_UNREACHABLE",
            Self::SchemaParse(_) => "UPSTREAM_SCHEMA",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Message safe to hand back to clients. Does not leak connection details.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::UpstreamRejection { status, .. } => {
                format!("upstream rejected request with HTTP {status}")
            }
            Self::ProtocolViolation { message, body } => format!("{message}: {body}"),
            Self::Request(_) => "request to upstream failed".to_string(),
            Self::SchemaParse(_) => "failed to parse upstream response".to_string(),
            Self::Cancelled => "server is shutting down; task polling was cancelled".to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            // Pass the upstream body through untouched; re-wrap only if it is not JSON.
            Self::UpstreamRejection { body, .. } => {
                tracing::warn!(status = status.as_u16(), "upstream rejected submission");
                return match serde_json::from_str::<serde_json::Value>(body) {
                    Ok(value) => (status, Json(value)).into_response(),
                    Err(_) => (status, body.clone()).into_response(),
                };
            }
            Self::ProtocolViolation { message, body } => {
                tracing::error!(body = %body, "{message}");
            }
            Self::Request(e) => tracing::error!(error = %e, "upstream request failed"),
            Self::SchemaParse(msg) => tracing::error!(error = %msg, "upstream schema error"),
            Self::Validation(_) | Self::Cancelled => {}
        }

        let body = json!({
            "error": self.user_message(),
            "code": self.code(),
        });

        (status, Json(body)).into_response()
    }
}

/// Startup configuration failures. The process exits before binding.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
