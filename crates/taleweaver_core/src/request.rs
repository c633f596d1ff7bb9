//! Request types for text generation.

use crate::ChatMessage;
use serde::{Deserialize, Serialize};

/// A fully assembled text generation call.
///
/// # Examples
///
/// ```
/// use taleweaver_core::{ChatMessage, GenerateRequest};
///
/// let request = GenerateRequest {
///     messages: vec![ChatMessage::user("Hello!")],
///     max_tokens: Some(100),
///     temperature: Some(0.7),
///     model: Some("deepseek-r1-distill-llama-8b".to_string()),
/// };
///
/// assert_eq!(request.messages.len(), 1);
/// assert_eq!(request.max_tokens, Some(100));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenerateRequest {
    /// Ordered conversation sent to the model
    pub messages: Vec<ChatMessage>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Model identifier, provider default when absent
    pub model: Option<String>,
}

/// Per-call overrides layered on top of a client's configured defaults.
///
/// # Examples
///
/// ```
/// use taleweaver_core::GenerationOptions;
///
/// let options = GenerationOptions::builder()
///     .max_tokens(2048u32)
///     .build()
///     .unwrap();
/// assert_eq!(*options.max_tokens(), Some(2048));
/// assert_eq!(*options.temperature(), None);
///
/// let tuned = GenerationOptions::default().with_temperature(Some(0.2));
/// assert_eq!(*tuned.temperature(), Some(0.2));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default, setter(into, strip_option))]
pub struct GenerationOptions {
    /// Output size ceiling
    max_tokens: Option<u32>,
    /// Sampling temperature
    temperature: Option<f32>,
    /// Model override
    model: Option<String>,
}

impl GenerationOptions {
    /// Creates a new options builder.
    pub fn builder() -> GenerationOptionsBuilder {
        GenerationOptionsBuilder::default()
    }

    /// Options that only set the output ceiling.
    pub fn with_limit(max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..Self::default()
        }
    }
}
