//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required Variables
//! - `VISION_API_KEY`: API key appended to every annotate request
//!
//! ## Optional Variables
//! - `RUST_LOG`: Logging level (default: "info,vision_batch=debug")
//! - `VISION_API_ENDPOINT`: Service base URL (default: "https://vision.googleapis.com/v1")
//! - `VISION_BATCH_SIZE`: Images per annotate request (default: 10)
//! - `VISION_JPEG_QUALITY`: Quality used when re-encoding images, 1-100 (default: 100)
//! - `VISION_REQUEST_TIMEOUT_SECS`: HTTP client timeout (default: 60)
//! - `VISION_FEATURES`: Comma separated feature kinds (default: "TEXT_DETECTION")
//! - `VISION_MAX_RESULTS`: Result cap applied to every configured feature (default: 10)
//! - `VISION_OVERLAY_FONT_PATH`: TrueType font used to draw detected text
//! - `VISION_OVERLAY_FONT_SIZE`: Overlay font size in pixels (default: 14)
//! - `VISION_OVERLAY_OUTPUT_DIR`: Where the example binary writes overlaid images

use crate::domain::feature::entity::{FeatureKind, FeatureRegistry};
use crate::infrastructure::imaging::overlay::OverlayStyle;
use std::path::Path;
use std::time::Duration;
use validator::Validate;

pub const DEFAULT_API_ENDPOINT: &str = "https://vision.googleapis.com/v1";

#[derive(Debug, Clone, Validate)]
pub struct Config {
    /// Static API key; sent as the `key` query parameter
    pub api_key: String,

    /// Base URL the `/images:annotate` path is appended to
    #[validate(url)]
    pub api_endpoint: String,

    /// Maximum number of images per request
    #[validate(range(min = 1))]
    pub batch_size: usize,

    /// JPEG quality for request payloads
    #[validate(range(min = 1, max = 100))]
    pub jpeg_quality: u8,

    pub request_timeout_secs: u64,

    /// Features requested for every image
    #[validate(length(min = 1))]
    pub features: Vec<FeatureKind>,

    pub max_results: u32,

    pub overlay_font_path: Option<String>,

    #[validate(range(min = 1.0))]
    pub overlay_font_size: f32,

    pub overlay_output_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            batch_size: 10,
            jpeg_quality: 100,
            request_timeout_secs: 60,
            features: vec![FeatureKind::TextDetection],
            max_results: 10,
            overlay_font_path: None,
            overlay_font_size: 14.0,
            overlay_output_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `VISION_API_KEY` is missing, a variable cannot be
    /// parsed, or a value is out of range.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let features = match std::env::var("VISION_FEATURES") {
            Ok(raw) => parse_features(&raw)?,
            Err(_) => defaults.features,
        };

        let config = Self {
            api_key: env_required("VISION_API_KEY")?,
            api_endpoint: env_or("VISION_API_ENDPOINT", defaults.api_endpoint)?,
            batch_size: env_or("VISION_BATCH_SIZE", defaults.batch_size)?,
            jpeg_quality: env_or("VISION_JPEG_QUALITY", defaults.jpeg_quality)?,
            request_timeout_secs: env_or(
                "VISION_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            features,
            max_results: env_or("VISION_MAX_RESULTS", defaults.max_results)?,
            overlay_font_path: std::env::var("VISION_OVERLAY_FONT_PATH").ok(),
            overlay_font_size: env_or("VISION_OVERLAY_FONT_SIZE", defaults.overlay_font_size)?,
            overlay_output_dir: std::env::var("VISION_OVERLAY_OUTPUT_DIR").ok(),
        };
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn feature_registry(&self) -> FeatureRegistry {
        let mut registry = FeatureRegistry::new();
        for kind in &self.features {
            registry.add(*kind, self.max_results);
        }
        registry
    }

    /// # Errors
    ///
    /// Returns an error if the configured font cannot be read or parsed.
    pub fn overlay_style(&self) -> anyhow::Result<OverlayStyle> {
        let style = OverlayStyle::default().with_font_size(self.overlay_font_size);
        match &self.overlay_font_path {
            Some(path) => style.with_font_file(Path::new(path)),
            None => Ok(style),
        }
    }
}

fn parse_features(raw: &str) -> anyhow::Result<Vec<FeatureKind>> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| name.parse::<FeatureKind>().map_err(anyhow::Error::from))
        .collect()
}

/// Load a required environment variable.
///
/// # Errors
///
/// Returns an error if the variable is not set.
fn env_required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("Missing required environment variable: {}", key))
}

/// Load an environment variable with a default value.
///
/// # Errors
///
/// Returns an error if the variable is set but cannot be parsed.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
