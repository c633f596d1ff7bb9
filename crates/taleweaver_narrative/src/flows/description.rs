use super::StoryServices;
use crate::payload::DescriptionPayload;
use crate::{DescriptionInput, DescriptionOutput, NarrativePhase, parse_json, state};
use async_trait::async_trait;
use taleweaver_error::TaleweaverResult;
use taleweaver_flow::{FlowContext, TypedFlow};
use tracing::{info, instrument, warn};

const MAX_TOKENS: u32 = 2048;

/// Talks the player through a story premise.
///
/// Never fails: any generation or parse error yields
/// [`DescriptionOutput::fallback`].
#[derive(Debug, Clone)]
pub struct DescriptionFlow {
    services: StoryServices,
}

impl DescriptionFlow {
    /// Flow over the given services.
    pub fn new(services: StoryServices) -> Self {
        Self { services }
    }

    async fn describe(
        &self,
        input: &DescriptionInput,
        session_id: &str,
    ) -> TaleweaverResult<DescriptionOutput> {
        let sessions = self.services.sessions();
        if input.clear_session {
            sessions.clear(session_id)?;
            sessions.set_state(session_id, state::INITIALIZED, serde_json::Value::Bool(true))?;
            info!(session_id, "Session reset for a new story");
        }
        self.services.ensure_preamble(session_id)?;

        let prompt = self
            .services
            .prompts()
            .description(input.user_input.as_deref().unwrap_or_default());
        let reply = self.services.converse(session_id, prompt, MAX_TOKENS).await?;

        if self.services.phase(session_id)? < NarrativePhase::Described {
            self.services.set_phase(session_id, NarrativePhase::Described)?;
        }

        let payload: DescriptionPayload = parse_json(&reply)?;
        Ok(DescriptionOutput {
            story_premise: payload.story_premise,
            next_question: payload.next_question,
            premise_options: payload.premise_options,
        })
    }
}

#[async_trait]
impl TypedFlow for DescriptionFlow {
    type Input = DescriptionInput;
    type Output = DescriptionOutput;

    const NAME: &'static str = "descriptionFlow";

    #[instrument(skip_all, fields(flow = Self::NAME, session_id = %ctx.session_id()))]
    async fn run(&self, input: Self::Input, ctx: FlowContext) -> TaleweaverResult<Self::Output> {
        match self.describe(&input, ctx.session_id()).await {
            Ok(output) => Ok(output),
            Err(e) => {
                warn!(error = %e, "Description failed, returning fallback");
                Ok(DescriptionOutput::fallback())
            }
        }
    }
}
