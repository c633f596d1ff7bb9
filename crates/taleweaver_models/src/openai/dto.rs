//! Wire types for `/chat/completions`.

use serde::{Deserialize, Serialize};
use taleweaver_core::{ChatMessage, GenerateRequest};

/// OpenAI-compatible chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<WireMessage>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatCompletionRequest {
    /// Convert a generation request, filling gaps from client defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use taleweaver_core::{ChatMessage, GenerateRequest};
    /// use taleweaver_models::ChatCompletionRequest;
    ///
    /// let req = GenerateRequest {
    ///     messages: vec![ChatMessage::system("narrate"), ChatMessage::user("begin")],
    ///     max_tokens: Some(2500),
    ///     ..Default::default()
    /// };
    /// let wire = ChatCompletionRequest::from_request(&req, "llama", 1000, 0.7);
    ///
    /// assert_eq!(wire.model, "llama");
    /// assert_eq!(wire.max_tokens, Some(2500));
    /// assert_eq!(wire.temperature, Some(0.7));
    /// assert_eq!(wire.messages[0].role, "system");
    /// ```
    pub fn from_request(
        req: &GenerateRequest,
        default_model: &str,
        default_max_tokens: u32,
        default_temperature: f32,
    ) -> Self {
        Self {
            model: req
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            messages: req.messages.iter().map(WireMessage::from).collect(),
            max_tokens: Some(req.max_tokens.unwrap_or(default_max_tokens)),
            temperature: Some(req.temperature.unwrap_or(default_temperature)),
        }
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WireMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Message content
    pub content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

/// OpenAI-compatible chat completion response.
///
/// Everything but `choices` is optional, so that minimal compatible servers
/// still parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatCompletionResponse {
    /// Unique identifier for the completion
    #[serde(default)]
    pub id: Option<String>,
    /// Model used for completion
    #[serde(default)]
    pub model: Option<String>,
    /// Generated completions
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, empty when absent.
    pub fn first_text(&self) -> String {
        self.choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
    }
}

/// A completion choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Choice {
    /// The generated message
    pub message: ChoiceMessage,
    /// Reason why generation finished
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message in a choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChoiceMessage {
    /// Role of the message (typically "assistant")
    #[serde(default)]
    pub role: Option<String>,
    /// Generated content
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_response_parses() {
        let body = r#"{"choices":[{"message":{"content":"hello"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_text(), "hello");
    }

    #[test]
    fn test_null_content_is_empty_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_text(), "");
    }

    #[test]
    fn test_no_choices_is_empty_text() {
        let response: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.first_text(), "");
    }
}
