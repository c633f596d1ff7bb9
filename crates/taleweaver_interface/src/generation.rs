//! Text and image generation capabilities.

use async_trait::async_trait;
use taleweaver_core::{
    ChatMessage, GenerateRequest, GeneratedImage, GenerationOptions, ImageRequest,
};
use taleweaver_error::TaleweaverResult;

/// Core trait that every text generation backend implements.
///
/// Implementations own retry and timeout handling. A malformed or empty
/// provider response is returned as `Ok(String::new())`, so callers must
/// handle empty text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a fully assembled request.
    async fn generate(&self, req: &GenerateRequest) -> TaleweaverResult<String>;

    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &'static str;

    /// Default model identifier.
    fn model_name(&self) -> &str;

    /// The dominant call pattern of every story flow: optional system prompt,
    /// then prior history, then one new user message, in a single call.
    async fn generate_with_history(
        &self,
        history: &[ChatMessage],
        user_message: &str,
        system_prompt: Option<&str>,
        options: &GenerationOptions,
    ) -> TaleweaverResult<String> {
        let req = build_request(history, user_message, system_prompt, options);
        self.generate(&req).await
    }

    /// Send a single user message with no history.
    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> TaleweaverResult<String> {
        self.generate_with_history(&[], prompt, None, options).await
    }
}

/// Assemble the message list for [`TextGenerator::generate_with_history`].
///
/// # Examples
///
/// ```
/// use taleweaver_core::{ChatMessage, GenerationOptions, Role};
/// use taleweaver_interface::build_request;
///
/// let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
/// let req = build_request(
///     &history,
///     "go north",
///     Some("You are a narrator"),
///     &GenerationOptions::with_limit(2500),
/// );
///
/// let roles: Vec<Role> = req.messages.iter().map(|m| m.role).collect();
/// assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
/// assert_eq!(req.messages[3].content, "go north");
/// assert_eq!(req.max_tokens, Some(2500));
/// ```
pub fn build_request(
    history: &[ChatMessage],
    user_message: &str,
    system_prompt: Option<&str>,
    options: &GenerationOptions,
) -> GenerateRequest {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(system) = system_prompt {
        messages.push(ChatMessage::system(system));
    }
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(user_message));

    GenerateRequest {
        messages,
        max_tokens: *options.max_tokens(),
        temperature: *options.temperature(),
        model: options.model().clone(),
    }
}

/// Image generation capability.
///
/// `Ok(None)` means image generation is disabled or produced nothing; it is
/// not an error.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Render one image.
    async fn generate_image(&self, req: &ImageRequest) -> TaleweaverResult<Option<GeneratedImage>>;

    /// Backend name (e.g., "stable-diffusion").
    fn backend_name(&self) -> &'static str;

    /// False when the backend never produces images.
    fn is_enabled(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<GenerateRequest>>,
    }

    #[async_trait]
    impl TextGenerator for Recorder {
        async fn generate(&self, req: &GenerateRequest) -> TaleweaverResult<String> {
            self.seen.lock().unwrap().push(req.clone());
            Ok("ok".to_string())
        }

        fn provider_name(&self) -> &'static str {
            "recorder"
        }

        fn model_name(&self) -> &str {
            "test"
        }
    }

    #[tokio::test]
    async fn test_complete_sends_single_user_message() -> anyhow::Result<()> {
        let recorder = Recorder {
            seen: Mutex::new(Vec::new()),
        };
        let text = recorder
            .complete("hello", &GenerationOptions::default())
            .await?;
        assert_eq!(text, "ok");

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].messages.len(), 1);
        assert_eq!(seen[0].messages[0].content, "hello");
        assert_eq!(seen[0].max_tokens, None);
        Ok(())
    }

    #[test]
    fn test_build_request_without_system_prompt() {
        let req = build_request(&[], "", None, &GenerationOptions::default());
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].content, "");
    }
}
