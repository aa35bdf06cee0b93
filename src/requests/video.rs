use serde::Deserialize;

/// Body of `POST /generate-music-video`. References an already generated track.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicVideoRequest {
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub audio_id: String,
    pub author: Option<String>,
    pub domain_name: Option<String>,
    pub call_back_url: Option<String>,
}
