use super::StoryServices;
use crate::payload::{ContinuePayload, EndingPayload, choice_texts};
use crate::{
    ContinueInput, ContinueOutput, NEUTRAL_RATING, NarrativePhase, advance, parse_json, state,
};
use async_trait::async_trait;
use serde_json::Value;
use taleweaver_error::TaleweaverResult;
use taleweaver_flow::{FlowContext, TypedFlow};
use tracing::{debug, info, instrument, warn};

const MAX_TOKENS: u32 = 2500;
const ENDING_MAX_TOKENS: u32 = 1000;

/// Plays one turn and moves the story through its milestones.
///
/// When the last milestone is achieved an ending is generated and appended to
/// the turn's parts. A failed turn leaves the session's narrative state
/// untouched and reports [`ContinueOutput::fallback`].
#[derive(Debug, Clone)]
pub struct ContinueStoryFlow {
    services: StoryServices,
}

impl ContinueStoryFlow {
    /// Flow over the given services.
    pub fn new(services: StoryServices) -> Self {
        Self { services }
    }

    async fn turn(
        &self,
        input: &ContinueInput,
        session_id: &str,
        primary_objective: String,
    ) -> TaleweaverResult<ContinueOutput> {
        let sessions = self.services.sessions();
        let milestones: Vec<String> = sessions
            .get_state_as(session_id, state::MILESTONES)?
            .unwrap_or_default();
        let current: Option<String> = sessions.get_state_as(session_id, state::CURRENT_MILESTONE)?;
        let concluded: bool = sessions
            .get_state_as(session_id, state::CONCLUDED)?
            .unwrap_or(false);

        let prompt = self
            .services
            .prompts()
            .continue_story(&input.user_input, current.as_deref());
        let reply = self.services.converse(session_id, prompt, MAX_TOKENS).await?;
        let payload: ContinuePayload = parse_json(&reply)?;

        let update = advance(
            &milestones,
            current.as_deref(),
            payload.achieved_current_milestone,
            concluded,
        );
        debug!(
            session_id,
            achieved = payload.achieved_current_milestone,
            progress = update.progress,
            "Computed progress"
        );

        let mut story_parts = payload.story_parts;
        if let Some(next) = &update.next_milestone {
            sessions.set_state(session_id, state::CURRENT_MILESTONE, Value::String(next.clone()))?;
            info!(session_id, milestone = %next, "Milestone reached");
        }
        if update.reached_end {
            story_parts.extend(self.ending(session_id).await);
            sessions.set_state(session_id, state::CONCLUDED, Value::Bool(true))?;
            self.services.set_phase(session_id, NarrativePhase::Concluded)?;
            info!(session_id, "Story concluded");
        } else if !concluded {
            self.services.set_phase(session_id, NarrativePhase::InProgress)?;
        }

        Ok(ContinueOutput {
            story_parts,
            options: choice_texts(payload.choices),
            primary_objective,
            progress: update.progress,
            rating: payload
                .rating
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| NEUTRAL_RATING.to_string()),
        })
    }

    /// Ask for the conclusion. Any failure yields no extra parts.
    async fn ending(&self, session_id: &str) -> Vec<String> {
        let prompt = self.services.prompts().ending();
        let parts = match self
            .services
            .converse(session_id, prompt, ENDING_MAX_TOKENS)
            .await
        {
            Ok(reply) => parse_json::<EndingPayload>(&reply).map(EndingPayload::into_parts),
            Err(e) => Err(e),
        };
        parts.unwrap_or_else(|e| {
            warn!(session_id, error = %e, "Ending generation failed");
            Vec::new()
        })
    }
}

#[async_trait]
impl TypedFlow for ContinueStoryFlow {
    type Input = ContinueInput;
    type Output = ContinueOutput;

    const NAME: &'static str = "continueStoryFlow";

    #[instrument(skip_all, fields(flow = Self::NAME, session_id = %ctx.session_id()))]
    async fn run(&self, input: Self::Input, ctx: FlowContext) -> TaleweaverResult<Self::Output> {
        let session_id = ctx.session_id();
        let primary_objective = match self
            .services
            .sessions()
            .get_state_as::<String>(session_id, state::PRIMARY_OBJECTIVE)
        {
            Ok(objective) => objective.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Could not read objective, returning fallback");
                return Ok(ContinueOutput::fallback(""));
            }
        };

        match self.turn(&input, session_id, primary_objective.clone()).await {
            Ok(output) => Ok(output),
            Err(e) => {
                warn!(error = %e, "Turn failed, returning fallback");
                Ok(ContinueOutput::fallback(primary_objective))
            }
        }
    }
}
