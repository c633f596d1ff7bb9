//! Submit, poll, fetch image backend.

use super::{http_client, status_error, transport_error};
use crate::{ImageConfig, RetryPolicy, with_retry};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use taleweaver_core::{GeneratedImage, ImageRequest};
use taleweaver_error::{ProviderError, ProviderErrorKind, RetryableError, TaleweaverResult};
use taleweaver_interface::ImageGenerator;
use tracing::{debug, instrument, warn};

/// Result of one status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    /// Not finished yet
    Pending,
    /// Finished with a value
    Ready(T),
}

/// Check until `check` reports [`PollStatus::Ready`], waiting `interval`
/// before every check.
///
/// The total wait is bounded by `interval * max_attempts`; after that a
/// [`ProviderErrorKind::Timeout`] is returned. Errors from `check` end the
/// loop immediately; a check that should tolerate transient failures reports
/// them as [`PollStatus::Pending`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use taleweaver_error::ProviderError;
/// use taleweaver_models::{PollStatus, poll_until};
///
/// # #[tokio::main]
/// # async fn main() {
/// let ready = poll_until(Duration::from_millis(1), 5, |attempt| async move {
///     Ok::<_, ProviderError>(if attempt < 3 { PollStatus::Pending } else { PollStatus::Ready(attempt) })
/// })
/// .await;
/// assert_eq!(ready.unwrap(), 3);
/// # }
/// ```
pub async fn poll_until<T, F, Fut>(
    interval: Duration,
    max_attempts: u32,
    mut check: F,
) -> Result<T, ProviderError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollStatus<T>, ProviderError>>,
{
    for attempt in 1..=max_attempts {
        tokio::time::sleep(interval).await;
        match check(attempt).await? {
            PollStatus::Ready(value) => {
                debug!(attempt, "Poll finished");
                return Ok(value);
            }
            PollStatus::Pending => {
                debug!(attempt, max_attempts, "Still pending");
            }
        }
    }
    Err(ProviderError::new(ProviderErrorKind::Timeout(format!(
        "still pending after {} polls at {}ms",
        max_attempts,
        interval.as_millis()
    ))))
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    width: u32,
    height: u32,
    steps: u32,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: JobState,
    #[serde(default)]
    error: Option<String>,
}

/// Client for a job-queue image server.
///
/// Protocol:
/// - `POST {base_url}/jobs` with the prompt, answered by `{"id": ...}`
/// - `GET {base_url}/jobs/{id}`, answered by `{"status": "queued|running|succeeded|failed"}`
/// - `GET {base_url}/jobs/{id}/image`, answered by the raw image bytes
#[derive(Debug, Clone)]
pub struct PollingImageClient {
    config: ImageConfig,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl PollingImageClient {
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

    async fn submit(&self, req: &ImageRequest) -> Result<String, ProviderError> {
        let timeout_ms = *self.config.timeout_ms();
        let body = SubmitRequest {
            prompt: req.prompt(),
            negative_prompt: req.negative_prompt(),
            width: *req.width(),
            height: *req.height(),
            steps: *req.steps(),
        };
        let response = self
            .client
            .post(self.url("/jobs"))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e, timeout_ms))?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| transport_error(&e, timeout_ms))?;
        Ok(submitted.id)
    }

    async fn status(&self, id: &str) -> Result<PollStatus<()>, ProviderError> {
        let timeout_ms = *self.config.timeout_ms();
        let response = self
            .client
            .get(self.url(&format!("/jobs/{}", id)))
            .send()
            .await
            .map_err(|e| transport_error(&e, timeout_ms))?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let job: JobStatus = response
            .json()
            .await
            .map_err(|e| transport_error(&e, timeout_ms))?;
        match job.status {
            JobState::Queued | JobState::Running => Ok(PollStatus::Pending),
            JobState::Succeeded => Ok(PollStatus::Ready(())),
            JobState::Failed => Err(ProviderError::new(ProviderErrorKind::ImageUnavailable(
                job.error.unwrap_or_else(|| format!("job {} failed", id)),
            ))),
        }
    }

    /// One status check. Transient failures count as a pending job, so they
    /// use up a poll attempt instead of ending the wait.
    async fn check_status(&self, id: &str, attempt: u32) -> Result<PollStatus<()>, ProviderError> {
        match self.status(id).await {
            Err(e) if e.is_retryable() => {
                warn!(job_id = %id, attempt, error = %e, "Status check failed, polling again");
                Ok(PollStatus::Pending)
            }
            other => other,
        }
    }

    async fn fetch(&self, id: &str) -> Result<GeneratedImage, ProviderError> {
        let timeout_ms = *self.config.timeout_ms();
        let response = self
            .client
            .get(self.url(&format!("/jobs/{}/image", id)))
            .send()
            .await
            .map_err(|e| transport_error(&e, timeout_ms))?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or("image/png")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(&e, timeout_ms))?;
        if bytes.is_empty() {
            return Err(ProviderError::new(ProviderErrorKind::ImageUnavailable(
                format!("job {} produced an empty image", id),
            )));
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Ok(GeneratedImage::new(mime_type, encoded))
    }
}

#[async_trait]
impl ImageGenerator for PollingImageClient {
    #[instrument(skip(self, req), fields(base_url = %self.config.base_url()))]
    async fn generate_image(&self, req: &ImageRequest) -> TaleweaverResult<Option<GeneratedImage>> {
        let id = with_retry(&self.retry, "submit_image_job", || self.submit(req)).await?;
        debug!(job_id = %id, "Image job submitted");

        let interval = Duration::from_millis(*self.config.poll_interval_ms());
        poll_until(interval, *self.config.max_poll_attempts(), |attempt| self.check_status(&id, attempt))
            .await
            .inspect_err(|e| warn!(job_id = %id, error = %e, "Image job did not finish"))?;

        let image = with_retry(&self.retry, "fetch_image", || self.fetch(&id)).await?;
        Ok(Some(image))
    }

    fn backend_name(&self) -> &'static str {
        "polling"
    }
}
