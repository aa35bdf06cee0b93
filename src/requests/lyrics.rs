use serde::Deserialize;

/// Upper bound on lyrics prompt length, in characters.
pub const MAX_LYRICS_PROMPT_CHARS: usize = 1000;

/// Body of `POST /lyrics`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsRequest {
    #[serde(default)]
    pub prompt: String,
    pub call_back_url: Option<String>,
}
