use serde::Serialize;

pub const TIMEOUT_MESSAGE: &str = "Timeout: Task did not complete in time";
pub const NO_TASK_ID_MESSAGE: &str = "No taskId found. Generate a song first.";

/// Returned with HTTP 200 when the attempt budget runs out.
///
/// Carries the task id so the caller can resume with `/check-status/{taskId}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutResponse {
    pub error: &'static str,
    pub task_id: String,
}

impl TimeoutResponse {
    pub fn new(task_id: String) -> Self {
        Self {
            error: TIMEOUT_MESSAGE,
            task_id,
        }
    }
}

/// Structured client-error result that is not an HTTP error.
#[derive(Debug, Serialize)]
pub struct ErrorResult {
    pub error: &'static str,
}

impl ErrorResult {
    pub fn no_task_id() -> Self {
        Self {
            error: NO_TASK_ID_MESSAGE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
