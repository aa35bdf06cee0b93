use serde::{Deserialize, Serialize};

/// Upstream model version. Serialized as the exact upstream string.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ModelVersion {
    #[default]
    #[serde(rename = "V3_5")]
    V3_5,
    #[serde(rename = "V4")]
    V4,
    #[serde(rename = "V4_5")]
    V4_5,
}

/// Preferred vocal gender for generated vocals.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum VocalGender {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
}
