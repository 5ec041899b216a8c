use crate::domain::errors::{VisionError, VisionResult};
use crate::domain::image::value_objects::ImageId;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key identifying which images, in which order, a batch carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token format: URL-safe unpadded base64 of the JSON array of ids.
pub struct BatchCodec;

impl BatchCodec {
    /// # Errors
    /// `Encoding` if the id list cannot be serialized.
    pub fn encode(ids: &[ImageId]) -> VisionResult<CorrelationToken> {
        let raw: Vec<&str> = ids.iter().map(ImageId::as_str).collect();
        let json = serde_json::to_vec(&raw)
            .map_err(|e| VisionError::Encoding(format!("correlation token: {}", e)))?;
        Ok(CorrelationToken(URL_SAFE_NO_PAD.encode(json)))
    }

    pub fn decode(token: &CorrelationToken) -> VisionResult<Vec<ImageId>> {
        let json = URL_SAFE_NO_PAD
            .decode(token.as_str())
            .map_err(|e| VisionError::CorruptToken(format!("invalid base64: {}", e)))?;
        let raw: Vec<String> = serde_json::from_slice(&json)
            .map_err(|e| VisionError::CorruptToken(format!("invalid id list: {}", e)))?;

        raw.iter()
            .map(|value| {
                ImageId::parse(value).ok_or_else(|| {
                    VisionError::CorruptToken(format!("'{}' is not an image id", value))
                })
            })
            .collect()
    }
}
