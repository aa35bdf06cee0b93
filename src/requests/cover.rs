use serde::Deserialize;

use super::{ModelVersion, TuningParams};

/// Body of `POST /upload-cover`: re-style an uploaded track.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCoverRequest {
    #[serde(default)]
    pub upload_url: String,
    #[serde(default)]
    pub custom_mode: bool,
    #[serde(default)]
    pub instrumental: bool,
    pub prompt: Option<String>,
    pub style: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub model: ModelVersion,
    #[serde(flatten)]
    pub tuning: TuningParams,
    pub call_back_url: Option<String>,
}
