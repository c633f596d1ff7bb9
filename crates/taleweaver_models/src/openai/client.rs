use crate::{ChatCompletionRequest, ChatCompletionResponse, RetryPolicy, TextConfig, with_retry};
use async_trait::async_trait;
use std::time::Duration;
use taleweaver_core::GenerateRequest;
use taleweaver_error::{ProviderError, ProviderErrorKind, TaleweaverResult};
use taleweaver_interface::TextGenerator;
use tracing::{debug, instrument, warn};

/// Client for OpenAI-compatible chat completion endpoints.
///
/// Posts to `{base_url}/chat/completions` with bearer authentication. Works
/// against OpenAI and self-hosted compatible servers alike.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: TextConfig,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// A missing API key is not an error here; it is reported on the first
    /// generation call.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    #[instrument(skip(config), fields(base_url = %config.base_url(), model = %config.model()))]
    pub fn new(config: TextConfig, retry: RetryPolicy) -> TaleweaverResult<Self> {
        debug!("Creating OpenAI-compatible client");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(*config.timeout_ms()))
            .build()
            .map_err(|e| {
                ProviderError::new(ProviderErrorKind::InvalidRequest(format!(
                    "Failed to build HTTP client: {}",
                    e
                )))
            })?;
        Ok(Self {
            config,
            retry,
            client,
        })
    }

    /// The client configuration.
    pub fn config(&self) -> &TextConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url().trim_end_matches('/')
        )
    }

    /// Send one chat completion request without retrying.
    #[instrument(skip(self, request, api_key), fields(model = %request.model))]
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
        api_key: &str,
    ) -> Result<String, ProviderError> {
        let url = self.endpoint();
        debug!(url = %url, messages = request.messages.len(), "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::new(classify_transport_error(&e, self.config.timeout_ms())))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Provider returned error status");
            return Err(ProviderError::new(ProviderErrorKind::Http {
                status_code: status.as_u16(),
                message,
            }));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::new(classify_transport_error(&e, self.config.timeout_ms())))?;

        match serde_json::from_str::<ChatCompletionResponse>(&body) {
            Ok(parsed) => {
                let text = parsed.first_text();
                if text.is_empty() {
                    warn!("Provider returned no completion text");
                }
                Ok(text)
            }
            Err(e) => {
                warn!(error = %e, "Malformed completion response, treating as empty text");
                Ok(String::new())
            }
        }
    }
}

fn classify_transport_error(error: &reqwest::Error, timeout_ms: &u64) -> ProviderErrorKind {
    if error.is_timeout() {
        ProviderErrorKind::Timeout(format!("no response within {}ms", timeout_ms))
    } else if error.is_builder() {
        ProviderErrorKind::InvalidRequest(error.to_string())
    } else if let Some(status) = error.status() {
        ProviderErrorKind::Http {
            status_code: status.as_u16(),
            message: error.to_string(),
        }
    } else {
        ProviderErrorKind::Network(error.to_string())
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    #[instrument(skip(self, req), fields(provider = "openai", model = %self.config.model()))]
    async fn generate(&self, req: &GenerateRequest) -> TaleweaverResult<String> {
        let api_key = self.config.api_key().as_deref().ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::MissingCredential(
                "OPENAI_API_KEY".to_string(),
            ))
        })?;

        let request = ChatCompletionRequest::from_request(
            req,
            self.config.model(),
            *self.config.max_tokens(),
            *self.config.temperature(),
        );

        let text = with_retry(&self.retry, "chat_completion", || {
            self.chat_completion(&request, api_key)
        })
        .await?;

        debug!(chars = text.len(), "Chat completion finished");
        Ok(text)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        self.config.model()
    }
}
