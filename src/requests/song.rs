use serde::Deserialize;

use super::{ModelVersion, TuningParams};

/// Body of `POST /generate-song`: a single free-text prompt.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub custom_mode: bool,
    #[serde(default)]
    pub instrumental: bool,
    #[serde(default)]
    pub model: ModelVersion,
    #[serde(flatten)]
    pub tuning: TuningParams,
    pub call_back_url: Option<String>,
}

/// Body of `POST /generate-customsong`.
///
/// `prompt` carries the lyrics and may be empty for instrumentals.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSongRequest {
    pub prompt: Option<String>,
    pub style: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub instrumental: bool,
    #[serde(default)]
    pub model: ModelVersion,
    #[serde(flatten)]
    pub tuning: TuningParams,
    pub call_back_url: Option<String>,
}
