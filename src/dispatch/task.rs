use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// Which family of upstream task a handle belongs to.
///
/// Each kind has its own record-info endpoint, and video tasks report their
/// state under `successFlag` instead of `status`.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Songs, custom songs, extensions and covers.
    #[default]
    Music,
    Lyrics,
    Video,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Lyrics => "lyrics",
            Self::Video => "video",
        }
    }

    /// Path (relative to the upstream base URL) of the status endpoint.
    pub fn status_path(&self) -> &'static str {
        match self {
            Self::Music => "/api/v1/generate/record-info",
            Self::Lyrics => "/api/v1/lyrics/record-info",
            Self::Video => "/api/v1/mp4/record-info",
        }
    }

    /// Name of the status field inside the `data` envelope.
    pub fn status_field(&self) -> &'static str {
        match self {
            Self::Music | Self::Lyrics => "status",
            Self::Video => "successFlag",
        }
    }

    /// Classify a status response body. `None` means the body carried no
    /// usable status (missing `data` envelope or non-string status field).
    pub fn classify(&self, body: &Value) -> Option<TaskStatus> {
        body.get("data")
            .filter(|d| d.is_object())
            .and_then(|d| d.get(self.status_field()))
            .and_then(Value::as_str)
            .map(TaskStatus::parse)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream task status vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Success,
    GenerateAudioFailed,
    CreateTaskFailed,
    CallbackException,
    SensitiveWordError,
    /// Anything outside the terminal set (PENDING, TEXT_SUCCESS, FIRST_SUCCESS, ...).
    Pending(String),
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "SUCCESS" => Self::Success,
            "GENERATE_AUDIO_FAILED" => Self::GenerateAudioFailed,
            "CREATE_TASK_FAILED" => Self::CreateTaskFailed,
            "CALLBACK_EXCEPTION" => Self::CallbackException,
            "SENSITIVE_WORD_ERROR" => Self::SensitiveWordError,
            other => Self::Pending(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "SUCCESS",
            Self::GenerateAudioFailed => "GENERATE_AUDIO_FAILED",
            Self::CreateTaskFailed => "CREATE_TASK_FAILED",
            Self::CallbackException => "CALLBACK_EXCEPTION",
            Self::SensitiveWordError => "SENSITIVE_WORD_ERROR",
            Self::Pending(raw) => raw,
        }
    }
}
