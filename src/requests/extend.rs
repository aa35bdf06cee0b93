use serde::Deserialize;

use super::{ModelVersion, TuningParams};

/// Body of `POST /extend-music`.
///
/// With `defaultParamFlag = false` the upstream reuses the source track's
/// parameters; with `true` the caller supplies prompt, style, title and the
/// offset to continue from.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicExtendRequest {
    #[serde(default)]
    pub audio_id: String,
    #[serde(default)]
    pub default_param_flag: bool,
    pub prompt: Option<String>,
    pub style: Option<String>,
    pub title: Option<String>,
    /// Seconds into the source track.
    pub continue_at: Option<f64>,
    #[serde(default)]
    pub model: ModelVersion,
    #[serde(flatten)]
    pub tuning: TuningParams,
    pub call_back_url: Option<String>,
}
