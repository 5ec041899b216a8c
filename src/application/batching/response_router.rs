use super::codec::{BatchCodec, CorrelationToken};
use super::dto::AnnotateResponse;
use crate::domain::annotation::entity::AnnotationResult;
use crate::domain::errors::{VisionError, VisionResult};
use crate::domain::image::value_objects::ImageId;

pub struct ResponseRouter;

impl ResponseRouter {
    /// Pair every per-image result in `body` with the image that produced it.
    ///
    /// The i-th result belongs to the i-th id in `token`. A body with a
    /// different number of results is a contract violation and is never
    /// truncated or padded.
    pub fn route(
        token: &CorrelationToken,
        body: &[u8],
    ) -> VisionResult<Vec<(ImageId, AnnotationResult)>> {
        let ids = BatchCodec::decode(token)?;
        let response: AnnotateResponse = serde_json::from_slice(body)
            .map_err(|e| VisionError::MalformedResponse(e.to_string()))?;

        if let Some(status) = response.error {
            return Err(VisionError::Api {
                code: status.code,
                message: status.message,
            });
        }

        let results = response.responses.unwrap_or_default();
        if results.len() != ids.len() {
            return Err(VisionError::ResponseShape {
                expected: ids.len(),
                actual: results.len(),
            });
        }

        Ok(ids.into_iter().zip(results).collect())
    }
}
