//! Synchronous txt2img backend (Stable Diffusion WebUI API).

use super::{http_client, status_error, transport_error};
use crate::{ImageConfig, RetryPolicy, with_retry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taleweaver_core::{GeneratedImage, ImageRequest};
use taleweaver_error::{ProviderError, ProviderErrorKind, TaleweaverResult};
use taleweaver_interface::ImageGenerator;
use tracing::{debug, instrument, warn};

#[derive(Debug, Serialize)]
struct Txt2ImgRequest<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    width: u32,
    height: u32,
    steps: u32,
    cfg_scale: f32,
    sampler_name: &'a str,
    seed: i64,
    batch_size: u32,
    n_iter: u32,
}

impl<'a> From<&'a ImageRequest> for Txt2ImgRequest<'a> {
    fn from(req: &'a ImageRequest) -> Self {
        Self {
            prompt: req.prompt(),
            negative_prompt: req.negative_prompt(),
            width: *req.width(),
            height: *req.height(),
            steps: *req.steps(),
            cfg_scale: 7.0,
            sampler_name: "DPM++ 2M Karras",
            seed: -1,
            batch_size: 1,
            n_iter: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
}

/// A checkpoint known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdModel {
    /// Display title
    pub title: String,
    /// Checkpoint name
    pub model_name: String,
}

/// Client for a Stable Diffusion WebUI style `/sdapi/v1` server.
#[derive(Debug, Clone)]
pub struct StableDiffusionClient {
    config: ImageConfig,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl StableDiffusionClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: ImageConfig, retry: RetryPolicy) -> TaleweaverResult<Self> {
        let client = http_client(*config.timeout_ms())?;
        Ok(Self {
            config,
            retry,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url().trim_end_matches('/'), path)
    }

    /// Whether the server answers its options endpoint.
    #[instrument(skip(self), fields(base_url = %self.config.base_url()))]
    pub async fn health(&self) -> bool {
        match self.client.get(self.url("/sdapi/v1/options")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "Image backend health check failed");
                false
            }
        }
    }

    /// Checkpoints the server can load.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or answers with a non-success status.
    #[instrument(skip(self), fields(base_url = %self.config.base_url()))]
    pub async fn models(&self) -> TaleweaverResult<Vec<SdModel>> {
        let timeout_ms = *self.config.timeout_ms();
        let response = self
            .client
            .get(self.url("/sdapi/v1/sd-models"))
            .send()
            .await
            .map_err(|e| transport_error(&e, timeout_ms))?;
        if !response.status().is_success() {
            return Err(status_error(response).await.into());
        }
        let models = response
            .json()
            .await
            .map_err(|e| transport_error(&e, timeout_ms))?;
        Ok(models)
    }

    async fn txt2img(&self, req: &ImageRequest) -> Result<Option<GeneratedImage>, ProviderError> {
        let timeout_ms = *self.config.timeout_ms();
        let response = self
            .client
            .post(self.url("/sdapi/v1/txt2img"))
            .json(&Txt2ImgRequest::from(req))
            .send()
            .await
            .map_err(|e| transport_error(&e, timeout_ms))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: Txt2ImgResponse = response.json().await.map_err(|e| {
            ProviderError::new(ProviderErrorKind::ImageUnavailable(format!(
                "Malformed txt2img response: {}",
                e
            )))
        })?;

        Ok(body.images.into_iter().next().map(GeneratedImage::png))
    }
}

#[async_trait]
impl ImageGenerator for StableDiffusionClient {
    #[instrument(skip(self, req), fields(width = *req.width(), height = *req.height(), steps = *req.steps()))]
    async fn generate_image(&self, req: &ImageRequest) -> TaleweaverResult<Option<GeneratedImage>> {
        let image = with_retry(&self.retry, "txt2img", || self.txt2img(req)).await?;
        if image.is_none() {
            warn!("txt2img returned no images");
        } else {
            debug!("Image generated");
        }
        Ok(image)
    }

    fn backend_name(&self) -> &'static str {
        "stable-diffusion"
    }
}
