use super::codec::{BatchCodec, CorrelationToken};
use super::dto::{AnnotateImageRequest, AnnotateRequest, ImageContent};
use crate::domain::errors::{VisionError, VisionResult};
use crate::domain::feature::entity::FeatureRequest;
use crate::domain::image::{entity::ImageAsset, value_objects::ImageId};
use tracing::debug;

/// One network call's worth of images.
#[derive(Debug, Clone)]
pub struct Batch {
    pub token: CorrelationToken,
    pub ids: Vec<ImageId>,
    pub request: AnnotateRequest,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn to_json(&self) -> VisionResult<Vec<u8>> {
        serde_json::to_vec(&self.request)
            .map_err(|e| VisionError::Encoding(format!("request serialization failed: {}", e)))
    }
}

pub struct RequestBuilder;

impl RequestBuilder {
    /// Split `images` into consecutive batches of at most `batch_size`.
    ///
    /// Yields `ceil(n / batch_size)` batches lazily; images are only
    /// re-encoded as their batch is pulled.
    ///
    /// # Errors
    /// `InvalidConfig` when `batch_size` is zero.
    pub fn partition<'a, I>(
        images: I,
        features: &'a [FeatureRequest],
        batch_size: usize,
        quality: u8,
    ) -> VisionResult<Batches<'a, I::IntoIter>>
    where
        I: IntoIterator<Item = &'a ImageAsset>,
    {
        if batch_size < 1 {
            return Err(VisionError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(Batches {
            images: images.into_iter(),
            features,
            batch_size,
            quality,
        })
    }
}

pub struct Batches<'a, I> {
    images: I,
    features: &'a [FeatureRequest],
    batch_size: usize,
    quality: u8,
}

impl<'a, I> Batches<'a, I>
where
    I: Iterator<Item = &'a ImageAsset>,
{
    fn build(&self, chunk: Vec<&'a ImageAsset>) -> VisionResult<Batch> {
        let ids: Vec<ImageId> = chunk.iter().map(|asset| asset.id().clone()).collect();
        let requests = chunk
            .iter()
            .map(|asset| {
                Ok(AnnotateImageRequest {
                    image: ImageContent {
                        content: asset.request_payload(self.quality)?,
                    },
                    features: self.features.to_vec(),
                })
            })
            .collect::<VisionResult<Vec<_>>>()?;

        let token = BatchCodec::encode(&ids)?;
        debug!(
            "Built batch of {} images (token {}...)",
            ids.len(),
            &token.as_str()[..token.as_str().len().min(16)]
        );
        Ok(Batch {
            token,
            ids,
            request: AnnotateRequest { requests },
        })
    }
}

impl<'a, I> Iterator for Batches<'a, I>
where
    I: Iterator<Item = &'a ImageAsset>,
{
    type Item = VisionResult<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<&ImageAsset> = self.images.by_ref().take(self.batch_size).collect();
        if chunk.is_empty() {
            return None;
        }
        Some(self.build(chunk))
    }
}
