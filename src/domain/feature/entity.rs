use crate::domain::errors::{VisionError, VisionResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of analysis the annotation service can run on an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureKind {
    LabelDetection,
    TextDetection,
    FaceDetection,
    LandmarkDetection,
    LogoDetection,
    SafeSearchDetection,
    ImageProperties,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 7] = [
        Self::LabelDetection,
        Self::TextDetection,
        Self::FaceDetection,
        Self::LandmarkDetection,
        Self::LogoDetection,
        Self::SafeSearchDetection,
        Self::ImageProperties,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LabelDetection => "LABEL_DETECTION",
            Self::TextDetection => "TEXT_DETECTION",
            Self::FaceDetection => "FACE_DETECTION",
            Self::LandmarkDetection => "LANDMARK_DETECTION",
            Self::LogoDetection => "LOGO_DETECTION",
            Self::SafeSearchDetection => "SAFE_SEARCH_DETECTION",
            Self::ImageProperties => "IMAGE_PROPERTIES",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureKind {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| VisionError::UnknownFeature(s.to_string()))
    }
}

/// One entry of the `features` list sent with every image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRequest {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub max_results: u32,
}

/// Requested features, keyed by kind, in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureRegistry {
    entries: Vec<FeatureRequest>,
}

impl FeatureRegistry {
    pub const DEFAULT_MAX_RESULTS: u32 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Adding a kind that is already present replaces its cap in place.
    pub fn add(&mut self, kind: FeatureKind, max_results: u32) {
        match self.entries.iter_mut().find(|entry| entry.kind == kind) {
            Some(entry) => entry.max_results = max_results,
            None => self.entries.push(FeatureRequest { kind, max_results }),
        }
    }

    pub fn add_named(&mut self, name: &str, max_results: u32) -> VisionResult<()> {
        let kind = name.parse::<FeatureKind>()?;
        self.add(kind, max_results);
        Ok(())
    }

    pub fn list(&self) -> &[FeatureRequest] {
        &self.entries
    }

    pub fn max_results(&self, kind: FeatureKind) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.max_results)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
