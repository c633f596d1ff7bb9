//! The four story flows and the services they share.

mod begin;
mod continue_story;
mod description;
mod image;

pub use begin::BeginStoryFlow;
pub use continue_story::ContinueStoryFlow;
pub use description::DescriptionFlow;
pub use image::GenImgFlow;

use crate::{DefaultPrompts, NarrativePhase, StoryPrompts, state};
use std::sync::Arc;
use taleweaver_core::{ChatMessage, GenerationOptions};
use taleweaver_error::TaleweaverResult;
use taleweaver_flow::FlowRegistry;
use taleweaver_interface::{ImageGenerator, TextGenerator};
use taleweaver_session::SessionStore;
use tracing::{debug, instrument};

/// Everything a story flow talks to, injected once at start-up.
#[derive(Clone, derive_getters::Getters)]
pub struct StoryServices {
    /// Shared session store
    sessions: Arc<SessionStore>,
    /// Text generation backend
    text: Arc<dyn TextGenerator>,
    /// Image generation strategy
    image: Arc<dyn ImageGenerator>,
    /// Prompt set
    prompts: Arc<dyn StoryPrompts>,
}

impl std::fmt::Debug for StoryServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryServices")
            .field("sessions", &self.sessions.len())
            .field("text", &self.text.provider_name())
            .field("image", &self.image.backend_name())
            .finish()
    }
}

impl StoryServices {
    /// Services using [`DefaultPrompts`].
    pub fn new(
        sessions: Arc<SessionStore>,
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self {
            sessions,
            text,
            image,
            prompts: Arc::new(DefaultPrompts),
        }
    }

    /// Replace the prompt set.
    pub fn with_prompts(mut self, prompts: Arc<dyn StoryPrompts>) -> Self {
        self.prompts = prompts;
        self
    }

    /// Inject the priming system message if the history has none yet.
    fn ensure_preamble(&self, session_id: &str) -> TaleweaverResult<()> {
        let primed = self
            .sessions
            .get(session_id)?
            .is_some_and(|session| session.has_system_message());
        if !primed {
            debug!(session_id, "Priming session with system message");
            self.sessions
                .add_message(session_id, ChatMessage::system(self.prompts.preamble()))?;
        }
        Ok(())
    }

    /// Send `prompt` after the session's history, then record both sides.
    ///
    /// Nothing is appended when generation fails.
    #[instrument(skip(self, prompt), fields(model = self.text.model_name()))]
    async fn converse(
        &self,
        session_id: &str,
        prompt: String,
        max_tokens: u32,
    ) -> TaleweaverResult<String> {
        let history = self.sessions.messages(session_id)?;
        let reply = self
            .text
            .generate_with_history(
                &history,
                &prompt,
                None,
                &GenerationOptions::with_limit(max_tokens),
            )
            .await?;
        self.sessions.add_messages(
            session_id,
            [ChatMessage::user(prompt), ChatMessage::assistant(reply.clone())],
        )?;
        debug!(session_id, chars = reply.len(), "Recorded exchange");
        Ok(reply)
    }

    fn phase(&self, session_id: &str) -> TaleweaverResult<NarrativePhase> {
        Ok(self
            .sessions
            .get_state_as::<NarrativePhase>(session_id, state::PHASE)?
            .unwrap_or_default())
    }

    fn set_phase(&self, session_id: &str, phase: NarrativePhase) -> TaleweaverResult<()> {
        self.sessions.set_state_as(session_id, state::PHASE, &phase)
    }
}

/// Register `descriptionFlow`, `beginStoryFlow`, `continueStoryFlow` and
/// `genImgFlow` on `registry`.
///
/// # Errors
///
/// Returns an error if a generated schema fails to compile.
pub fn register_story_flows(registry: &FlowRegistry, services: StoryServices) -> TaleweaverResult<()> {
    registry.register_typed(DescriptionFlow::new(services.clone()))?;
    registry.register_typed(BeginStoryFlow::new(services.clone()))?;
    registry.register_typed(ContinueStoryFlow::new(services.clone()))?;
    registry.register_typed(GenImgFlow::new(services))?;
    Ok(())
}
