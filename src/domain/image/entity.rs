use super::value_objects::ImageId;
use crate::domain::annotation::entity::AnnotationResult;
use crate::domain::errors::{VisionError, VisionResult};
use crate::infrastructure::imaging::{codec, overlay};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use image::DynamicImage;
use reqwest::Url;
use std::path::Path;
use tracing::debug;

/// An image registered for annotation.
///
/// # Lifecycle
/// 1. **Created** from a file, URL or raw bytes; the pixels are decoded
///    eagerly so an unreadable source fails at construction.
/// 2. **Submitted** as part of a batch, re-encoded on demand.
/// 3. **Annotated** once the batch response is routed back to it.
///
/// # Invariants
/// - `id` is derived from the source alone, so re-creating an asset from the
///   same source yields the same id.
/// - The decoded resource is owned exclusively by this asset.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    id: ImageId,
    name: String,
    resource: DynamicImage,
    result: Option<AnnotationResult>,
    annotated_at: Option<DateTime<Utc>>,
}

impl ImageAsset {
    pub fn from_file(path: impl AsRef<Path>) -> VisionResult<Self> {
        let path = path.as_ref();
        let resource = codec::decode_file(path)?;
        Ok(Self::new(
            ImageId::derive(&path.to_string_lossy()),
            codec::basename(path),
            resource,
        ))
    }

    /// Fetch and decode a remote image. The URL is validated before any
    /// request is made.
    pub async fn from_url(http: &reqwest::Client, url: &str) -> VisionResult<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| VisionError::source_error(url, format!("'{}' is not a valid URL: {}", url, e)))?;

        debug!("Fetching remote image {}", parsed);
        let response = http
            .get(parsed.clone())
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| VisionError::source_error(url, e))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| VisionError::source_error(url, e))?;

        let resource = codec::decode_bytes(&bytes, url)?;
        Ok(Self::new(
            ImageId::derive(url),
            codec::url_basename(&parsed),
            resource,
        ))
    }

    /// Raw sources have no path, so the display name doubles as identity.
    pub fn from_raw(bytes: &[u8], name: impl Into<String>) -> VisionResult<Self> {
        let name = name.into();
        let resource = codec::decode_bytes(bytes, &name)?;
        Ok(Self::new(ImageId::derive(&name), name, resource))
    }

    fn new(id: ImageId, name: String, resource: DynamicImage) -> Self {
        Self {
            id,
            name,
            resource,
            result: None,
            annotated_at: None,
        }
    }

    pub fn id(&self) -> &ImageId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource(&self) -> &DynamicImage {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut DynamicImage {
        &mut self.resource
    }

    pub fn result(&self) -> Option<&AnnotationResult> {
        self.result.as_ref()
    }

    pub fn annotated_at(&self) -> Option<DateTime<Utc>> {
        self.annotated_at
    }

    /// JPEG at `quality`, base64 wrapped for the `image.content` field.
    pub fn request_payload(&self, quality: u8) -> VisionResult<String> {
        let jpeg = codec::encode_jpeg(&self.resource, quality)?;
        Ok(STANDARD.encode(jpeg))
    }

    /// Last write wins.
    pub fn attach_result(&mut self, result: AnnotationResult) {
        self.result = Some(result);
        self.annotated_at = Some(Utc::now());
    }

    /// Draw every text annotation onto the image: the description at the
    /// bottom-left vertex and the bounding polygon outline. Returns the
    /// number of annotations drawn.
    pub fn draw_text_annotations(&mut self, style: &overlay::OverlayStyle) -> usize {
        let Some(result) = self.result.as_ref() else {
            return 0;
        };

        let mut drawn = 0;
        for annotation in result.text_annotations() {
            let Some(poly) = annotation.bounding_poly.as_ref() else {
                continue;
            };
            if let Some(anchor) = poly.vertices.get(3) {
                overlay::draw_text(
                    &mut self.resource,
                    &annotation.description,
                    anchor.x,
                    anchor.y,
                    style,
                );
            }
            overlay::draw_polygon(&mut self.resource, &poly.vertices, style);
            drawn += 1;
        }
        drawn
    }
}
