//! Upstream request bodies. Every optional field is omitted when absent.

use serde::Serialize;

use crate::dispatch::TaskKind;
use crate::requests::{
    CustomSongRequest, LyricsRequest, ModelVersion, MusicExtendRequest, MusicVideoRequest,
    SongRequest, TuningParams, UploadCoverRequest, VocalGender,
};
use crate::validate::non_blank;

/// Binds an inbound request to the upstream job it submits.
pub trait UpstreamJob {
    type Payload: Serialize + Send + Sync;

    /// Status family used to poll the submitted task.
    const KIND: TaskKind;

    /// Submit path relative to the upstream base URL.
    const SUBMIT_PATH: &'static str;

    fn build_payload(&self, default_callback: Option<&str>) -> Self::Payload;
}

/// Caller's callback URL if given, else the configured default, else none.
pub fn resolve_callback(requested: Option<&str>, default: Option<&str>) -> Option<String> {
    non_blank(requested)
        .or_else(|| non_blank(default))
        .map(str::to_string)
}

fn owned(value: Option<&String>) -> Option<String> {
    non_blank(value.map(String::as_str)).map(str::to_string)
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocal_gender: Option<VocalGender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weirdness_constraint: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_weight: Option<f64>,
}

impl From<&TuningParams> for TuningPayload {
    fn from(t: &TuningParams) -> Self {
        Self {
            negative_tags: owned(t.negative_tags.as_ref()),
            vocal_gender: t.vocal_gender,
            style_weight: t.style_weight,
            weirdness_constraint: t.weirdness_constraint,
            audio_weight: t.audio_weight,
        }
    }
}

/// Body for `/api/v1/generate`, shared by simple and custom songs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub custom_mode: bool,
    pub instrumental: bool,
    pub model: ModelVersion,
    #[serde(flatten)]
    pub tuning: TuningPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_back_url: Option<String>,
}

impl UpstreamJob for SongRequest {
    type Payload = GeneratePayload;
    const KIND: TaskKind = TaskKind::Music;
    const SUBMIT_PATH: &'static str = "/api/v1/generate";

    fn build_payload(&self, default_callback: Option<&str>) -> GeneratePayload {
        GeneratePayload {
            prompt: Some(self.prompt.clone()),
            style: None,
            title: None,
            custom_mode: self.custom_mode,
            instrumental: self.instrumental,
            model: self.model,
            tuning: TuningPayload::from(&self.tuning),
            call_back_url: resolve_callback(self.call_back_url.as_deref(), default_callback),
        }
    }
}

impl UpstreamJob for CustomSongRequest {
    type Payload = GeneratePayload;
    const KIND: TaskKind = TaskKind::Music;
    const SUBMIT_PATH: &'static str = "/api/v1/generate";

    fn build_payload(&self, default_callback: Option<&str>) -> GeneratePayload {
        // Instrumentals carry no lyrics.
        let prompt = if self.instrumental {
            None
        } else {
            owned(self.prompt.as_ref())
        };
        GeneratePayload {
            prompt,
            style: owned(self.style.as_ref()),
            title: owned(self.title.as_ref()),
            custom_mode: true,
            instrumental: self.instrumental,
            model: self.model,
            tuning: TuningPayload::from(&self.tuning),
            call_back_url: resolve_callback(self.call_back_url.as_deref(), default_callback),
        }
    }
}

/// Body for `/api/v1/generate/extend`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendPayload {
    pub audio_id: String,
    pub default_param_flag: bool,
    pub model: ModelVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_at: Option<f64>,
    #[serde(flatten)]
    pub tuning: TuningPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_back_url: Option<String>,
}

impl UpstreamJob for MusicExtendRequest {
    type Payload = ExtendPayload;
    const KIND: TaskKind = TaskKind::Music;
    const SUBMIT_PATH: &'static str = "/api/v1/generate/extend";

    fn build_payload(&self, default_callback: Option<&str>) -> ExtendPayload {
        // Without the flag the upstream reuses the source track's parameters.
        let custom = self.default_param_flag;
        ExtendPayload {
            audio_id: self.audio_id.trim().to_string(),
            default_param_flag: custom,
            model: self.model,
            prompt: owned(self.prompt.as_ref()).filter(|_| custom),
            style: owned(self.style.as_ref()).filter(|_| custom),
            title: owned(self.title.as_ref()).filter(|_| custom),
            continue_at: self.continue_at.filter(|_| custom),
            tuning: TuningPayload::from(&self.tuning),
            call_back_url: resolve_callback(self.call_back_url.as_deref(), default_callback),
        }
    }
}

/// Body for `/api/v1/generate/upload-cover`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverPayload {
    pub upload_url: String,
    pub custom_mode: bool,
    pub instrumental: bool,
    pub model: ModelVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub tuning: TuningPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_back_url: Option<String>,
}

impl UpstreamJob for UploadCoverRequest {
    type Payload = CoverPayload;
    const KIND: TaskKind = TaskKind::Music;
    const SUBMIT_PATH: &'static str = "/api/v1/generate/upload-cover";

    fn build_payload(&self, default_callback: Option<&str>) -> CoverPayload {
        let (prompt, style, title) = match (self.custom_mode, self.instrumental) {
            (true, true) => (None, owned(self.style.as_ref()), owned(self.title.as_ref())),
            (true, false) => (
                owned(self.prompt.as_ref()),
                owned(self.style.as_ref()),
                owned(self.title.as_ref()),
            ),
            (false, _) => (owned(self.prompt.as_ref()), None, None),
        };
        CoverPayload {
            upload_url: self.upload_url.trim().to_string(),
            custom_mode: self.custom_mode,
            instrumental: self.instrumental,
            model: self.model,
            prompt,
            style,
            title,
            tuning: TuningPayload::from(&self.tuning),
            call_back_url: resolve_callback(self.call_back_url.as_deref(), default_callback),
        }
    }
}

/// Body for `/api/v1/lyrics`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsPayload {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_back_url: Option<String>,
}

impl UpstreamJob for LyricsRequest {
    type Payload = LyricsPayload;
    const KIND: TaskKind = TaskKind::Lyrics;
    const SUBMIT_PATH: &'static str = "/api/v1/lyrics";

    fn build_payload(&self, default_callback: Option<&str>) -> LyricsPayload {
        LyricsPayload {
            prompt: self.prompt.clone(),
            call_back_url: resolve_callback(self.call_back_url.as_deref(), default_callback),
        }
    }
}

/// Body for `/api/v1/mp4/generate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPayload {
    pub task_id: String,
    pub audio_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_back_url: Option<String>,
}

impl UpstreamJob for MusicVideoRequest {
    type Payload = VideoPayload;
    const KIND: TaskKind = TaskKind::Video;
    const SUBMIT_PATH: &'static str = "/api/v1/mp4/generate";

    fn build_payload(&self, default_callback: Option<&str>) -> VideoPayload {
        VideoPayload {
            task_id: self.task_id.trim().to_string(),
            audio_id: self.audio_id.trim().to_string(),
            author: owned(self.author.as_ref()),
            domain_name: owned(self.domain_name.as_ref()),
            call_back_url: resolve_callback(self.call_back_url.as_deref(), default_callback),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn keys(value: &Value) -> Vec<&str> {
        let mut keys: Vec<&str> = value
            .as_object()
            .expect("payload is an object")
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys
    }

    fn to_json<P: Serialize>(payload: &P) -> Value {
        serde_json::to_value(payload).unwrap()
    }

    #[test]
    fn simple_song_payload_has_only_mandatory_keys() {
        let req: SongRequest = serde_json::from_value(json!({
            "prompt": "a song about rain",
            "customMode": false,
            "instrumental": false,
            "model": "V3_5"
        }))
        .unwrap();

        let payload = to_json(&req.build_payload(None));
        assert_eq!(
            payload,
            json!({
                "prompt": "a song about rain",
                "customMode": false,
                "instrumental": false,
                "model": "V3_5"
            })
        );
    }

    #[test]
    fn present_tuning_fields_are_forwarded() {
        let req: SongRequest = serde_json::from_value(json!({
            "prompt": "x",
            "model": "V4_5",
            "negativeTags": "Metal",
            "vocalGender": "m",
            "styleWeight": 0.6,
            "weirdnessConstraint": 0.0,
            "audioWeight": 1.0
        }))
        .unwrap();

        let payload = to_json(&req.build_payload(None));
        assert_eq!(payload["model"], "V4_5");
        assert_eq!(payload["negativeTags"], "Metal");
        assert_eq!(payload["vocalGender"], "m");
        assert_eq!(payload["styleWeight"], 0.6);
        // Zero is a value, not an absence.
        assert_eq!(payload["weirdnessConstraint"], 0.0);
        assert_eq!(payload["audioWeight"], 1.0);
    }

    #[test]
    fn blank_negative_tags_are_omitted() {
        let req = SongRequest {
            prompt: "x".to_string(),
            tuning: TuningParams {
                negative_tags: Some("  ".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let payload = to_json(&req.build_payload(None));
        assert!(payload.get("negativeTags").is_none());
    }

    #[test]
    fn callback_policy_prefers_caller_then_default() {
        assert_eq!(
            resolve_callback(Some("https://me/cb"), Some("http://localhost:8000/song-callback")),
            Some("https://me/cb".to_string())
        );
        assert_eq!(
            resolve_callback(Some(" "), Some("http://localhost:8000/song-callback")),
            Some("http://localhost:8000/song-callback".to_string())
        );
        assert_eq!(resolve_callback(None, None), None);

        let req = SongRequest {
            prompt: "x".to_string(),
            ..Default::default()
        };
        let payload = to_json(&req.build_payload(Some("http://cb.local/hook")));
        assert_eq!(payload["callBackUrl"], "http://cb.local/hook");
    }

    #[test]
    fn custom_instrumental_drops_prompt_and_forces_custom_mode() {
        let req = CustomSongRequest {
            prompt: Some("these lyrics are ignored".to_string()),
            style: Some("Ambient".to_string()),
            title: Some("Drift".to_string()),
            instrumental: true,
            ..Default::default()
        };
        let payload = to_json(&req.build_payload(None));
        assert_eq!(
            keys(&payload),
            vec!["customMode", "instrumental", "model", "style", "title"]
        );
        assert_eq!(payload["customMode"], true);
    }

    #[test]
    fn custom_vocal_forwards_lyrics() {
        let req = CustomSongRequest {
            prompt: Some("[Verse] hello".to_string()),
            style: Some("Pop".to_string()),
            title: Some("Hi".to_string()),
            ..Default::default()
        };
        let payload = to_json(&req.build_payload(None));
        assert_eq!(payload["prompt"], "[Verse] hello");
        assert_eq!(payload["instrumental"], false);
    }

    #[test]
    fn extend_without_flag_sends_only_source_reference() {
        let req = MusicExtendRequest {
            audio_id: "audio-1".to_string(),
            prompt: Some("ignored".to_string()),
            continue_at: Some(30.0),
            ..Default::default()
        };
        let payload = to_json(&req.build_payload(None));
        assert_eq!(keys(&payload), vec!["audioId", "defaultParamFlag", "model"]);
    }

    #[test]
    fn extend_with_flag_sends_custom_params() {
        let req = MusicExtendRequest {
            audio_id: "audio-1".to_string(),
            default_param_flag: true,
            prompt: Some("more".to_string()),
            style: Some("Rock".to_string()),
            title: Some("Part II".to_string()),
            continue_at: Some(42.5),
            ..Default::default()
        };
        let payload = to_json(&req.build_payload(None));
        assert_eq!(payload["continueAt"], 42.5);
        assert_eq!(payload["title"], "Part II");
        assert_eq!(payload["defaultParamFlag"], true);
    }

    #[test]
    fn cover_payload_follows_mode() {
        let base = UploadCoverRequest {
            upload_url: "https://cdn/a.mp3".to_string(),
            prompt: Some("jazzy".to_string()),
            style: Some("Jazz".to_string()),
            title: Some("Cover".to_string()),
            ..Default::default()
        };

        let non_custom = to_json(&base.build_payload(None));
        assert_eq!(
            keys(&non_custom),
            vec!["customMode", "instrumental", "model", "prompt", "uploadUrl"]
        );

        let custom_inst = UploadCoverRequest {
            custom_mode: true,
            instrumental: true,
            ..base.clone()
        };
        let payload = to_json(&custom_inst.build_payload(None));
        assert!(payload.get("prompt").is_none());
        assert_eq!(payload["style"], "Jazz");

        let custom_vocal = UploadCoverRequest {
            custom_mode: true,
            ..base
        };
        let payload = to_json(&custom_vocal.build_payload(None));
        assert_eq!(payload["prompt"], "jazzy");
        assert_eq!(payload["title"], "Cover");
    }

    #[test]
    fn video_payload_omits_absent_branding() {
        let req = MusicVideoRequest {
            task_id: "t-1".to_string(),
            audio_id: "a-1".to_string(),
            author: Some("DJ Test".to_string()),
            ..Default::default()
        };
        let payload = to_json(&req.build_payload(None));
        assert_eq!(keys(&payload), vec!["audioId", "author", "taskId"]);
    }

    #[test]
    fn lyrics_payload() {
        let req = LyricsRequest {
            prompt: "ocean at night".to_string(),
            call_back_url: None,
        };
        assert_eq!(
            to_json(&req.build_payload(None)),
            json!({"prompt": "ocean at night"})
        );
    }

    #[test]
    fn job_kinds_and_paths() {
        assert_eq!(SongRequest::KIND, TaskKind::Music);
        assert_eq!(LyricsRequest::KIND, TaskKind::Lyrics);
        assert_eq!(MusicVideoRequest::KIND, TaskKind::Video);
        assert_eq!(UploadCoverRequest::SUBMIT_PATH, "/api/v1/generate/upload-cover");
        assert_eq!(MusicExtendRequest::SUBMIT_PATH, "/api/v1/generate/extend");
    }
}
