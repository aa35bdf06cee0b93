//! Inbound request bodies, one type per endpoint.
//!
//! Fields that are only conditionally required are modelled as `Option` (or
//! default to empty) so that a missing value reaches the validators and comes
//! back as a field-naming 400 instead of an extractor rejection.

pub mod cover;
pub mod enums;
pub mod extend;
pub mod lyrics;
pub mod song;
pub mod video;

use serde::Deserialize;

pub use cover::UploadCoverRequest;
pub use enums::{ModelVersion, VocalGender};
pub use extend::MusicExtendRequest;
pub use lyrics::LyricsRequest;
pub use song::{CustomSongRequest, SongRequest};
pub use video::MusicVideoRequest;

/// Optional generation tuning shared by every audio-producing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningParams {
    /// Styles to steer away from, e.g. "Heavy Metal, Upbeat Drums".
    pub negative_tags: Option<String>,
    pub vocal_gender: Option<VocalGender>,
    /// Upstream expects 0.0..=1.0; forwarded as given.
    pub style_weight: Option<f64>,
    /// Upstream expects 0.0..=1.0; forwarded as given.
    pub weirdness_constraint: Option<f64>,
    /// Upstream expects 0.0..=1.0; forwarded as given.
    pub audio_weight: Option<f64>,
}
