use crate::domain::annotation::entity::{AnnotationResult, Status};
use crate::domain::feature::entity::FeatureRequest;
use serde::{Deserialize, Serialize};

/// Body of `POST {endpoint}/images:annotate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotateRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotateImageRequest {
    pub image: ImageContent,
    pub features: Vec<FeatureRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Base64 encoded image bytes.
    pub content: String,
}

/// Response body; `responses[i]` answers `requests[i]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotateResponse {
    #[serde(default)]
    pub responses: Option<Vec<AnnotationResult>>,
    #[serde(default)]
    pub error: Option<Status>,
}
