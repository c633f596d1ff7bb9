//! Image generation strategies.

mod disabled;
mod polling;
mod stable_diffusion;

pub use disabled::DisabledImageGenerator;
pub use polling::{PollStatus, PollingImageClient, poll_until};
pub use stable_diffusion::{SdModel, StableDiffusionClient};

use crate::TaleweaverConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taleweaver_error::TaleweaverResult;
use taleweaver_interface::ImageGenerator;
use tracing::info;

/// Which image strategy to wire up at startup.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use taleweaver_models::ImageBackendKind;
///
/// assert_eq!(ImageBackendKind::from_str("poll").unwrap(), ImageBackendKind::Poll);
/// assert_eq!(ImageBackendKind::default().to_string(), "disabled");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageBackendKind {
    /// Never produce images
    #[default]
    Disabled,
    /// Single synchronous txt2img call
    Sync,
    /// Submit a job, poll its status, then fetch the image
    Poll,
}

/// Build the configured image generator.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn image_generator(config: &TaleweaverConfig) -> TaleweaverResult<Arc<dyn ImageGenerator>> {
    let image = config.image();
    info!(backend = %image.backend(), base_url = %image.base_url(), "Configuring image backend");
    let generator: Arc<dyn ImageGenerator> = match image.backend() {
        ImageBackendKind::Disabled => Arc::new(DisabledImageGenerator),
        ImageBackendKind::Sync => Arc::new(StableDiffusionClient::new(
            image.clone(),
            config.image_retry(),
        )?),
        ImageBackendKind::Poll => Arc::new(PollingImageClient::new(
            image.clone(),
            config.image_retry(),
        )?),
    };
    Ok(generator)
}

fn http_client(timeout_ms: u64) -> Result<reqwest::Client, taleweaver_error::ProviderError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| {
            taleweaver_error::ProviderError::new(taleweaver_error::ProviderErrorKind::InvalidRequest(
                format!("Failed to build HTTP client: {}", e),
            ))
        })
}

fn transport_error(error: &reqwest::Error, timeout_ms: u64) -> taleweaver_error::ProviderError {
    use taleweaver_error::{ProviderError, ProviderErrorKind};
    let kind = if error.is_timeout() {
        ProviderErrorKind::Timeout(format!("no response within {}ms", timeout_ms))
    } else {
        ProviderErrorKind::Network(error.to_string())
    };
    ProviderError::new(kind)
}

async fn status_error(response: reqwest::Response) -> taleweaver_error::ProviderError {
    use taleweaver_error::{ProviderError, ProviderErrorKind};
    let status_code = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    ProviderError::new(ProviderErrorKind::Http {
        status_code,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_selects_strategy() {
        let config = TaleweaverConfig::default();
        let generator = image_generator(&config).unwrap();
        assert!(!generator.is_enabled());

        let config = TaleweaverConfig::from_toml_str("[image]\nbackend = \"sync\"").unwrap();
        let generator = image_generator(&config).unwrap();
        assert_eq!(generator.backend_name(), "stable-diffusion");

        let config = TaleweaverConfig::from_toml_str("[image]\nbackend = \"poll\"").unwrap();
        let generator = image_generator(&config).unwrap();
        assert_eq!(generator.backend_name(), "polling");
    }
}
