//! Text and image generation clients for Taleweaver.
//!
//! - [`OpenAiClient`]: OpenAI-compatible chat completions ([`TextGenerator`])
//! - [`DisabledImageGenerator`], [`StableDiffusionClient`], [`PollingImageClient`]:
//!   the three image strategies ([`ImageGenerator`]), chosen at startup by
//!   [`ImageBackendKind`] through [`image_generator`]
//! - [`with_retry`]: bounded linear backoff shared by every client
//! - [`TaleweaverConfig`]: layered configuration
//!
//! [`TextGenerator`]: taleweaver_interface::TextGenerator
//! [`ImageGenerator`]: taleweaver_interface::ImageGenerator

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod image;
mod openai;
mod retry;

pub use config::{
    ImageConfig, LoggingConfig, ServerConfig, TaleweaverConfig, TextConfig, WELL_KNOWN_ENV,
};
pub use image::{
    DisabledImageGenerator, ImageBackendKind, PollStatus, PollingImageClient, SdModel,
    StableDiffusionClient, image_generator, poll_until,
};
pub use openai::{
    ChatCompletionRequest, ChatCompletionResponse, Choice, ChoiceMessage, OpenAiClient,
    WireMessage,
};
pub use retry::{RetryPolicy, with_retry};

use std::sync::Arc;
use taleweaver_error::TaleweaverResult;
use taleweaver_interface::TextGenerator;

/// Build the configured text generator.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn text_generator(config: &TaleweaverConfig) -> TaleweaverResult<Arc<dyn TextGenerator>> {
    let client = OpenAiClient::new(config.text().clone(), config.text_retry())?;
    Ok(Arc::new(client))
}
