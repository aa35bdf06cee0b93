use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::{Config, ServerConfig};
use crate::dispatch::{PollOutcome, SunoClient, TaskKind, TaskPoller};
use crate::error::{ConfigError, ProxyError};
use crate::payload::UpstreamJob;
use crate::requests::{
    CustomSongRequest, LyricsRequest, MusicExtendRequest, MusicVideoRequest, SongRequest,
    UploadCoverRequest,
};
use crate::response::{ErrorResult, HealthResponse, TimeoutResponse};
use crate::validate::Validate;

/// Shared, cheaply cloneable handler state. Nothing in it is mutable.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<SunoClient>,
    pub poller: TaskPoller,
    pub default_callback: Option<Arc<str>>,
    /// Cancelled on shutdown; every poll loop watches a child of it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: &Config, shutdown: CancellationToken) -> Result<Self, ProxyError> {
        Ok(Self {
            client: Arc::new(SunoClient::new(&config.upstream)?),
            poller: TaskPoller::from_config(&config.polling),
            default_callback: config.upstream.default_callback_url.as_deref().map(Arc::from),
            shutdown,
        })
    }
}

/// Routes only, no middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate-song", post(generate_song))
        .route("/generate-customsong", post(generate_custom_song))
        .route("/extend-music", post(extend_music))
        .route("/upload-cover", post(upload_cover))
        .route("/lyrics", post(generate_lyrics))
        .route("/generate-music-video", post(generate_music_video))
        .route("/credits", get(credits))
        .route("/check-status", get(check_status_without_id))
        .route("/check-status/", get(check_status_without_id))
        .route("/check-status/{task_id}", get(check_status))
        .with_state(state)
}

/// Full application: routes plus panic recovery, request tracing and CORS.
pub fn app(state: AppState, server: &ServerConfig) -> Result<Router, ConfigError> {
    let cors = build_cors_layer(server)?;

    Ok(router(state)
        .layer(CatchPanicLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors))
}

/// `*` anywhere in the list allows any origin (without credentials).
pub fn build_cors_layer(config: &ServerConfig) -> Result<CorsLayer, ConfigError> {
    if config.cors_origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>().map_err(|e| ConfigError::Invalid {
                key: "CORS_ORIGINS",
                message: format!("{o:?}: {e}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn generate_song(
    State(state): State<AppState>,
    Json(req): Json<SongRequest>,
) -> Result<Response, ProxyError> {
    submit_and_poll(&state, &req).await
}

async fn generate_custom_song(
    State(state): State<AppState>,
    Json(req): Json<CustomSongRequest>,
) -> Result<Response, ProxyError> {
    submit_and_poll(&state, &req).await
}

async fn extend_music(
    State(state): State<AppState>,
    Json(req): Json<MusicExtendRequest>,
) -> Result<Response, ProxyError> {
    submit_and_poll(&state, &req).await
}

async fn upload_cover(
    State(state): State<AppState>,
    Json(req): Json<UploadCoverRequest>,
) -> Result<Response, ProxyError> {
    submit_and_poll(&state, &req).await
}

async fn generate_lyrics(
    State(state): State<AppState>,
    Json(req): Json<LyricsRequest>,
) -> Result<Response, ProxyError> {
    submit_and_poll(&state, &req).await
}

async fn generate_music_video(
    State(state): State<AppState>,
    Json(req): Json<MusicVideoRequest>,
) -> Result<Response, ProxyError> {
    submit_and_poll(&state, &req).await
}

async fn credits(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ProxyError> {
    Ok(Json(state.client.fetch_credits().await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub kind: TaskKind,
}

async fn check_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Response, ProxyError> {
    let task_id = task_id.trim();
    if task_id.is_empty() {
        return Ok(Json(ErrorResult::no_task_id()).into_response());
    }
    let body = state.client.fetch_status(query.kind, task_id).await?;
    Ok(Json(body).into_response())
}

async fn check_status_without_id() -> Json<ErrorResult> {
    Json(ErrorResult::no_task_id())
}

/// Validate, build, submit, then poll to completion.
async fn submit_and_poll<J>(state: &AppState, job: &J) -> Result<Response, ProxyError>
where
    J: Validate + UpstreamJob,
{
    job.validate()?;

    let payload = job.build_payload(state.default_callback.as_deref());
    let task_id = state
        .client
        .submit(J::SUBMIT_PATH, &payload)
        .await?
        .into_task_id()?;

    let kind = J::KIND;
    tracing::info!(
        kind = %kind,
        task_id = %task_id,
        path = J::SUBMIT_PATH,
        "task submitted, polling for completion"
    );

    let cancel = state.shutdown.child_token();
    match state
        .poller
        .poll(state.client.as_ref(), kind, &task_id, &cancel)
        .await
    {
        PollOutcome::Completed(body) => Ok(Json(body).into_response()),
        PollOutcome::TimedOut { .. } => Ok(Json(TimeoutResponse::new(task_id)).into_response()),
        PollOutcome::Cancelled => Err(ProxyError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_cors_accepted() {
        assert!(build_cors_layer(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn explicit_cors_origins_parsed() {
        let config = ServerConfig {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..ServerConfig::default()
        };
        assert!(build_cors_layer(&config).is_ok());
    }

    #[test]
    fn invalid_cors_origin_rejected() {
        let config = ServerConfig {
            cors_origins: vec!["http://bad\norigin".to_string()],
            ..ServerConfig::default()
        };
        assert!(matches!(
            build_cors_layer(&config),
            Err(ConfigError::Invalid { key: "CORS_ORIGINS", .. })
        ));
    }
}
