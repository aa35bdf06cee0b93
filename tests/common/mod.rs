//! Shared helpers: a scriptable local upstream and router drivers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use suno_proxy::config::{Config, PollConfig, ServerConfig, UpstreamConfig};
use suno_proxy::server::{self, AppState};

pub const API_KEY: &str = "sk-test-key";

/// One request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

type Responder = dyn Fn(&Recorded) -> (u16, String) + Send + Sync;

#[derive(Clone)]
struct MockState {
    responder: Arc<Responder>,
    log: Arc<Mutex<Vec<Recorded>>>,
}

/// Local HTTP server standing in for the generation API.
pub struct MockUpstream {
    pub base_url: String,
    log: Arc<Mutex<Vec<Recorded>>>,
    handle: JoinHandle<()>,
}

impl MockUpstream {
    /// Bind on an ephemeral port; `responder` maps each request to (status, body).
    pub async fn start(
        responder: impl Fn(&Recorded) -> (u16, String) + Send + Sync + 'static,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let log = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            responder: Arc::new(responder),
            log: Arc::clone(&log),
        };
        let app = Router::new().fallback(record).with_state(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            log,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn record(
    State(mock): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = Recorded {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    let (status, body) = (mock.responder)(&recorded);
    mock.log.lock().unwrap().push(recorded);
    (
        StatusCode::from_u16(status).unwrap(),
        [(CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// Responder that hands out `taskId` on submit and walks `statuses` on
/// every status call, repeating the last entry once exhausted.
pub fn scripted(
    task_id: &'static str,
    status_field: &'static str,
    statuses: Vec<&'static str>,
) -> impl Fn(&Recorded) -> (u16, String) + Send + Sync + 'static {
    let seen = AtomicUsize::new(0);
    move |req| {
        if req.path.ends_with("/record-info") {
            let i = seen.fetch_add(1, Ordering::SeqCst);
            let status = statuses[i.min(statuses.len() - 1)];
            let body = serde_json::json!({
                "code": 200,
                "msg": "success",
                "data": { "taskId": task_id, status_field: status, "attempt": i + 1 }
            });
            (200, body.to_string())
        } else {
            let body = serde_json::json!({
                "code": 200,
                "msg": "success",
                "data": { "taskId": task_id }
            });
            (200, body.to_string())
        }
    }
}

pub fn test_config(base_url: &str, max_attempts: u32) -> Config {
    Config {
        upstream: UpstreamConfig {
            base_url: base_url.to_string(),
            api_key: API_KEY.to_string(),
            default_callback_url: None,
        },
        server: ServerConfig::default(),
        polling: PollConfig {
            interval: Duration::from_millis(5),
            max_attempts,
        },
    }
}

pub fn test_app(base_url: &str, max_attempts: u32) -> Router {
    test_app_with(test_config(base_url, max_attempts), CancellationToken::new())
}

pub fn test_app_with(config: Config, shutdown: CancellationToken) -> Router {
    let state = AppState::new(&config, shutdown).unwrap();
    server::app(state, &config.server).unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
