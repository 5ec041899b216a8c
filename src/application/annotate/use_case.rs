use crate::{
    application::batching::{
        codec::CorrelationToken, request_builder::RequestBuilder,
        response_router::ResponseRouter,
    },
    config::{Config, DEFAULT_API_ENDPOINT},
    domain::{
        annotation::entity::AnnotationResult,
        errors::{Requirement, VisionError, VisionResult},
        feature::entity::{FeatureKind, FeatureRegistry},
        image::{entity::ImageAsset, registry::ImageRegistry, value_objects::ImageId},
    },
    infrastructure::transport::traits::Transport,
};
use bytes::Bytes;
use futures_util::{StreamExt, TryStreamExt, stream::FuturesUnordered};
use http::{HeaderMap, HeaderValue, header};
use reqwest::Url;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Configuring,
    Validated,
    Submitting,
    Draining,
    Done,
}

/// Drives one annotation session: registration, validation, concurrent
/// batch dispatch and merging results back onto the registered images.
///
/// # Lifecycle
/// `Configuring` → `Validated` → `Submitting` → `Draining` → `Done`.
/// Any registration call returns the orchestrator to `Configuring`, so the
/// next submission re-validates.
pub struct AnnotationOrchestrator {
    transport: Arc<dyn Transport>,
    api_key: String,
    api_endpoint: String,
    jpeg_quality: u8,
    features: FeatureRegistry,
    images: ImageRegistry,
    state: OrchestratorState,
}

/// A completed network call awaiting routing.
#[derive(Debug)]
struct BatchResponse {
    token: CorrelationToken,
    body: Bytes,
}

impl AnnotationOrchestrator {
    pub fn new(transport: Arc<dyn Transport>, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            jpeg_quality: 100,
            features: FeatureRegistry::new(),
            images: ImageRegistry::new(),
            state: OrchestratorState::Configuring,
        }
    }

    /// Key, endpoint, quality and the feature list all come from `config`.
    pub fn from_config(transport: Arc<dyn Transport>, config: &Config) -> Self {
        let mut orchestrator = Self::new(transport, config.api_key.clone())
            .with_endpoint(config.api_endpoint.clone())
            .with_jpeg_quality(config.jpeg_quality);
        orchestrator.features = config.feature_registry();
        orchestrator
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn features(&self) -> &FeatureRegistry {
        &self.features
    }

    pub fn images(&self) -> &ImageRegistry {
        &self.images
    }

    pub fn image(&self, id: &ImageId) -> Option<&ImageAsset> {
        self.images.get(id)
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> &mut Self {
        self.api_key = api_key.into();
        self.state = OrchestratorState::Configuring;
        self
    }

    pub fn add_feature(&mut self, kind: FeatureKind, max_results: u32) -> &mut Self {
        self.features.add(kind, max_results);
        self.state = OrchestratorState::Configuring;
        self
    }

    pub fn add_feature_default(&mut self, kind: FeatureKind) -> &mut Self {
        self.add_feature(kind, FeatureRegistry::DEFAULT_MAX_RESULTS)
    }

    /// # Errors
    /// `UnknownFeature` when `name` is not a supported feature kind.
    pub fn add_feature_named(&mut self, name: &str, max_results: u32) -> VisionResult<&mut Self> {
        self.features.add_named(name, max_results)?;
        self.state = OrchestratorState::Configuring;
        Ok(self)
    }

    /// # Errors
    /// `DuplicateImage` when an image from the same source is already
    /// registered; the registry is left unchanged.
    pub fn add_image(&mut self, image: ImageAsset) -> VisionResult<&ImageAsset> {
        let added = self.images.insert(image).inspect_err(|e| warn!("{}", e))?;
        debug!("Registered image '{}' ({})", added.name(), added.id().short());
        self.state = OrchestratorState::Configuring;
        Ok(added)
    }

    pub fn add_image_file(&mut self, path: impl AsRef<Path>) -> VisionResult<&ImageAsset> {
        let image = ImageAsset::from_file(path)?;
        self.add_image(image)
    }

    pub fn add_raw_image(&mut self, bytes: &[u8], name: impl Into<String>) -> VisionResult<&ImageAsset> {
        let image = ImageAsset::from_raw(bytes, name)?;
        self.add_image(image)
    }

    pub async fn add_image_url(&mut self, http: &reqwest::Client, url: &str) -> VisionResult<&ImageAsset> {
        let image = ImageAsset::from_url(http, url).await?;
        self.add_image(image)
    }

    /// Register key, features and images in one go, then validate.
    ///
    /// # Errors
    /// `DuplicateImage` if any image collides with a registered one or with
    /// an earlier entry of `images`; nothing is registered in that case.
    /// Otherwise whatever [`validate`](Self::validate) reports.
    pub fn configure(
        &mut self,
        api_key: impl Into<String>,
        features: FeatureRegistry,
        images: impl IntoIterator<Item = ImageAsset>,
    ) -> VisionResult<()> {
        let mut staged = ImageRegistry::new();
        for image in images {
            if self.images.contains(image.id()) {
                let err = VisionError::DuplicateImage {
                    id: image.id().clone(),
                    name: image.name().to_string(),
                };
                warn!("{}", err);
                return Err(err);
            }
            staged.insert(image).inspect_err(|e| warn!("{}", e))?;
        }

        self.set_api_key(api_key);
        for request in features.list() {
            self.features.add(request.kind, request.max_results);
        }
        for image in staged.into_assets() {
            self.add_image(image)?;
        }
        self.validate()
    }

    /// Check everything a submission needs before any network call is made.
    ///
    /// # Errors
    /// `Precondition` naming the first missing requirement, or
    /// `InvalidConfig` for an unusable endpoint or quality.
    pub fn validate(&mut self) -> VisionResult<()> {
        self.annotate_url()?;
        if self.features.is_empty() {
            return Err(VisionError::Precondition(Requirement::Features));
        }
        if self.images.is_empty() {
            return Err(VisionError::Precondition(Requirement::Images));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(VisionError::InvalidConfig(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        self.state = OrchestratorState::Validated;
        Ok(())
    }

    fn annotate_url(&self) -> VisionResult<Url> {
        if self.api_key.is_empty() {
            return Err(VisionError::Precondition(Requirement::ApiKey));
        }
        let base = self.api_endpoint.trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/images:annotate", base)).map_err(|e| {
            VisionError::InvalidConfig(format!("invalid API endpoint '{}': {}", self.api_endpoint, e))
        })?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Send every registered image to the service, `batch_size` images per
    /// request, and return a [`Submission`] that merges the results.
    ///
    /// All batches are dispatched concurrently and awaited together. The
    /// first failed call aborts the submission with that error; the other
    /// calls run to completion in the background but their results are
    /// dropped.
    ///
    /// # Errors
    /// Validation errors before any network call, `InvalidConfig` for a
    /// zero batch size, `Encoding` if an image cannot be re-encoded, and
    /// `Transport` / `Dispatch` for failed calls.
    #[instrument(skip(self), fields(
        submission_id = %Uuid::now_v7(),
        images = self.images.len(),
        features = self.features.len(),
    ))]
    pub async fn submit(&mut self, batch_size: usize) -> VisionResult<Submission<'_>> {
        if self.state != OrchestratorState::Validated {
            self.validate()?;
        }
        let url = self.annotate_url()?;
        self.state = OrchestratorState::Submitting;

        match self.dispatch(url, batch_size).await {
            Ok(responses) => {
                info!("All {} batches completed", responses.len());
                Ok(Submission {
                    orchestrator: self,
                    responses: responses.into(),
                    routed: VecDeque::new(),
                })
            }
            Err(e) => {
                error!("Submission failed: {}", e);
                self.state = OrchestratorState::Done;
                Err(e)
            }
        }
    }

    async fn dispatch(&mut self, url: Url, batch_size: usize) -> VisionResult<Vec<BatchResponse>> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // JPEG re-encoding is CPU bound, keep it off the runtime threads.
        let snapshot: Vec<ImageAsset> = self.images.iter().cloned().collect();
        let features = self.features.list().to_vec();
        let quality = self.jpeg_quality;
        let prepared = tokio::task::spawn_blocking(move || -> VisionResult<Vec<_>> {
            RequestBuilder::partition(&snapshot, &features, batch_size, quality)?
                .map(|batch| -> VisionResult<_> {
                    let batch = batch?;
                    let body = batch.to_json()?;
                    Ok((batch.token, batch.ids.len(), body))
                })
                .collect()
        })
        .await
        .map_err(|e| VisionError::Dispatch(e.to_string()))??;

        let mut tasks = FuturesUnordered::new();
        for (token, size, body) in prepared {
            let transport = Arc::clone(&self.transport);
            let url = url.clone();
            let headers = headers.clone();

            debug!("Dispatching batch of {} images ({} bytes)", size, body.len());
            tasks.push(tokio::spawn(async move {
                let body = transport
                    .post_json(url, headers, body)
                    .await
                    .map_err(VisionError::Transport)?;
                Ok::<_, VisionError>(BatchResponse { token, body })
            }));
        }

        self.state = OrchestratorState::Draining;
        info!("Dispatched {} batches (batch size {})", tasks.len(), batch_size);

        tasks
            .map(|joined| match joined {
                Ok(result) => result,
                Err(e) => Err(VisionError::Dispatch(e.to_string())),
            })
            .try_collect()
            .await
    }
}

/// Results of one submission, drained lazily.
///
/// Batches are routed in the order their calls completed; pairs within a
/// batch keep registration order. Each yielded asset has its result
/// attached and is moved out of the orchestrator. A batch whose response
/// cannot be routed yields its error once and draining continues with the
/// next batch.
///
/// Dropping the submission early discards undrained results; those images
/// stay registered without a result.
pub struct Submission<'a> {
    orchestrator: &'a mut AnnotationOrchestrator,
    responses: VecDeque<BatchResponse>,
    routed: VecDeque<(ImageId, AnnotationResult)>,
}

impl Submission<'_> {
    /// Batches not yet routed.
    pub fn pending_batches(&self) -> usize {
        self.responses.len()
    }
}

impl Iterator for Submission<'_> {
    type Item = VisionResult<(ImageId, ImageAsset)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((id, result)) = self.routed.pop_front() {
                let Some(mut asset) = self.orchestrator.images.take(&id) else {
                    return Some(Err(VisionError::CorruptToken(format!(
                        "token references unregistered image {}",
                        id
                    ))));
                };
                asset.attach_result(result);
                return Some(Ok((id, asset)));
            }

            let Some(response) = self.responses.pop_front() else {
                self.orchestrator.state = OrchestratorState::Done;
                return None;
            };
            match ResponseRouter::route(&response.token, &response.body) {
                Ok(pairs) => {
                    debug!("Routed {} results", pairs.len());
                    self.routed.extend(pairs);
                }
                Err(e) => {
                    error!("Batch could not be routed: {}", e);
                    return Some(Err(e));
                }
            }
        }
    }
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        let discarded = self.routed.len() + self.responses.len();
        if discarded > 0 {
            warn!(
                "Submission dropped with {} undrained results and {} unrouted batches",
                self.routed.len(),
                self.responses.len()
            );
        }
        self.orchestrator.state = OrchestratorState::Done;
    }
}
