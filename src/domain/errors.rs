use super::image::value_objects::ImageId;
use std::fmt;
use thiserror::Error;

/// The requirement a submission was missing when validation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    ApiKey,
    Features,
    Images,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey => write!(f, "API key cannot be empty"),
            Self::Features => write!(f, "features cannot be empty"),
            Self::Images => write!(f, "images cannot be empty"),
        }
    }
}

/// Every failure the annotation client can report.
///
/// Local misuse (`Precondition`, `UnknownFeature`, `InvalidConfig`,
/// `DuplicateImage`, `Source`) is reported at the call that detects it.
/// Contract violations from the service (`CorruptToken`, `ResponseShape`,
/// `MalformedResponse`, `Api`) are scoped to a single batch and surface when
/// that batch is drained. `Transport` and `Dispatch` abort the whole submission.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Precondition failed: {0}")]
    Precondition(Requirement),

    #[error("Feature '{0}' does not exist")]
    UnknownFeature(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image '{name}' already added (id {id})")]
    DuplicateImage { id: ImageId, name: String },

    #[error("Unable to load image from {origin}: {reason}")]
    Source { origin: String, reason: String },

    #[error("Image encoding failed: {0}")]
    Encoding(String),

    #[error("Corrupt correlation token: {0}")]
    CorruptToken(String),

    #[error("Response carries {actual} results for a batch of {expected} images")]
    ResponseShape { expected: usize, actual: usize },

    #[error("Malformed response body: {0}")]
    MalformedResponse(String),

    #[error("Annotation service error {code}: {message}")]
    Api { code: i32, message: String },

    #[error("Transport error: {0}")]
    Transport(#[source] anyhow::Error),

    #[error("Batch task failed: {0}")]
    Dispatch(String),
}

impl VisionError {
    pub(crate) fn source_error(origin: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Source {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error is confined to one batch, leaving the rest of the
    /// submission drainable.
    pub fn is_batch_scoped(&self) -> bool {
        matches!(
            self,
            Self::CorruptToken(_)
                | Self::ResponseShape { .. }
                | Self::MalformedResponse(_)
                | Self::Api { .. }
        )
    }
}

pub type VisionResult<T> = Result<T, VisionError>;
