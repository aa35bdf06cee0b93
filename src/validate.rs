//! Conditional mandatory-field rules, checked before anything is forwarded.

use crate::error::ProxyError;
use crate::requests::lyrics::MAX_LYRICS_PROMPT_CHARS;
use crate::requests::{
    CustomSongRequest, LyricsRequest, MusicExtendRequest, MusicVideoRequest, SongRequest,
    UploadCoverRequest,
};

/// Implemented by every inbound request body.
pub trait Validate {
    fn validate(&self) -> Result<(), ProxyError>;
}

/// Trimmed, non-empty view of an optional string.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_blank(value: Option<&str>) -> bool {
    non_blank(value).is_none()
}

/// Fail with a message naming every missing field, or pass if none are missing.
fn require(fields: &[(&str, bool)], condition: &str) -> Result<(), ProxyError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    let all: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    Err(ProxyError::validation(format!(
        "missing required field(s): {}. {} required {condition}.",
        missing.join(", "),
        all.join(", "),
    )))
}

impl Validate for SongRequest {
    fn validate(&self) -> Result<(), ProxyError> {
        require(&[("prompt", !self.prompt.trim().is_empty())], "for simple song generation")
    }
}

impl Validate for CustomSongRequest {
    fn validate(&self) -> Result<(), ProxyError> {
        let style = ("style", !is_blank(self.style.as_deref()));
        let title = ("title", !is_blank(self.title.as_deref()));
        if self.instrumental {
            require(&[style, title], "when instrumental=true")
        } else {
            let prompt = ("prompt", !is_blank(self.prompt.as_deref()));
            require(&[prompt, style, title], "when instrumental=false")
        }
    }
}

impl Validate for LyricsRequest {
    fn validate(&self) -> Result<(), ProxyError> {
        require(&[("prompt", !self.prompt.trim().is_empty())], "for lyrics generation")?;
        let len = self.prompt.chars().count();
        if len > MAX_LYRICS_PROMPT_CHARS {
            return Err(ProxyError::validation(format!(
                "prompt must be at most {MAX_LYRICS_PROMPT_CHARS} characters, got {len}"
            )));
        }
        Ok(())
    }
}

impl Validate for MusicVideoRequest {
    fn validate(&self) -> Result<(), ProxyError> {
        require(
            &[
                ("taskId", !self.task_id.trim().is_empty()),
                ("audioId", !self.audio_id.trim().is_empty()),
            ],
            "for music video generation",
        )
    }
}

impl Validate for MusicExtendRequest {
    fn validate(&self) -> Result<(), ProxyError> {
        require(&[("audioId", !self.audio_id.trim().is_empty())], "to extend a track")?;
        if self.default_param_flag {
            require(
                &[
                    ("prompt", !is_blank(self.prompt.as_deref())),
                    ("style", !is_blank(self.style.as_deref())),
                    ("title", !is_blank(self.title.as_deref())),
                    ("continueAt", self.continue_at.is_some_and(|c| c > 0.0)),
                ],
                "when defaultParamFlag=true (continueAt must be > 0)",
            )?;
        }
        Ok(())
    }
}

impl Validate for UploadCoverRequest {
    fn validate(&self) -> Result<(), ProxyError> {
        require(&[("uploadUrl", !self.upload_url.trim().is_empty())], "to upload a cover")?;
        let prompt = ("prompt", !is_blank(self.prompt.as_deref()));
        let style = ("style", !is_blank(self.style.as_deref()));
        let title = ("title", !is_blank(self.title.as_deref()));
        match (self.custom_mode, self.instrumental) {
            (true, true) => require(&[style, title], "when customMode=true and instrumental=true"),
            (true, false) => require(
                &[style, title, prompt],
                "when customMode=true and instrumental=false",
            ),
            (false, _) => require(&[prompt], "when customMode=false"),
        }
    }
}
