use super::StoryServices;
use crate::payload::{BeginPayload, choice_texts};
use crate::{BeginInput, BeginOutput, NarrativePhase, parse_json, state};
use async_trait::async_trait;
use serde_json::Value;
use taleweaver_error::TaleweaverResult;
use taleweaver_flow::{FlowContext, TypedFlow};
use tracing::{info, instrument, warn};

const MAX_TOKENS: u32 = 2500;

/// Opens the story and fixes its objective and milestones.
///
/// On failure the result is empty with `progress` `0`.
#[derive(Debug, Clone)]
pub struct BeginStoryFlow {
    services: StoryServices,
}

impl BeginStoryFlow {
    /// Flow over the given services.
    pub fn new(services: StoryServices) -> Self {
        Self { services }
    }

    async fn begin(&self, input: &BeginInput, session_id: &str) -> TaleweaverResult<BeginOutput> {
        self.services.ensure_preamble(session_id)?;
        let prompt = self.services.prompts().begin_story(&input.user_input);
        let reply = self.services.converse(session_id, prompt, MAX_TOKENS).await?;
        let payload: BeginPayload = parse_json(&reply)?;

        let sessions = self.services.sessions();
        let current = payload
            .milestones
            .first()
            .map(|m| Value::String(m.clone()))
            .unwrap_or(Value::Null);
        sessions.set_state(
            session_id,
            state::PRIMARY_OBJECTIVE,
            Value::String(payload.primary_objective.clone()),
        )?;
        sessions.set_state_as(session_id, state::MILESTONES, &payload.milestones)?;
        sessions.set_state(session_id, state::CURRENT_MILESTONE, current)?;
        sessions.set_state(session_id, state::CONCLUDED, Value::Bool(false))?;
        self.services.set_phase(session_id, NarrativePhase::Begun)?;
        info!(
            session_id,
            milestones = payload.milestones.len(),
            objective = %payload.primary_objective,
            "Story begun"
        );

        Ok(BeginOutput {
            story_parts: payload.story_parts,
            options: choice_texts(payload.choices),
            progress: 0.0,
            primary_objective: payload.primary_objective,
        })
    }
}

#[async_trait]
impl TypedFlow for BeginStoryFlow {
    type Input = BeginInput;
    type Output = BeginOutput;

    const NAME: &'static str = "beginStoryFlow";

    #[instrument(skip_all, fields(flow = Self::NAME, session_id = %ctx.session_id()))]
    async fn run(&self, input: Self::Input, ctx: FlowContext) -> TaleweaverResult<Self::Output> {
        match self.begin(&input, ctx.session_id()).await {
            Ok(output) => Ok(output),
            Err(e) => {
                warn!(error = %e, "Story opening failed, returning empty result");
                Ok(BeginOutput::default())
            }
        }
    }
}
