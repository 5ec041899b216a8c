use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The structured response the service returned for one image.
///
/// The payload is kept as raw JSON so every requested feature survives,
/// including ones this crate has no typed view for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationResult(Value);

impl AnnotationResult {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    /// `textAnnotations`, empty when text detection was not requested or
    /// nothing was found. Entries that do not match the expected shape are
    /// skipped.
    pub fn text_annotations(&self) -> Vec<EntityAnnotation> {
        self.entities("textAnnotations")
    }

    pub fn label_annotations(&self) -> Vec<EntityAnnotation> {
        self.entities("labelAnnotations")
    }

    /// Per-image failure reported inside an otherwise successful batch.
    pub fn error(&self) -> Option<Status> {
        self.0
            .get("error")
            .and_then(|e| serde_json::from_value(e.clone()).ok())
    }

    fn entities(&self, field: &str) -> Vec<EntityAnnotation> {
        self.0
            .get(field)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAnnotation {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

/// Pixel coordinate. The service omits zero-valued axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

/// Error status in the service's `google.rpc.Status` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}
