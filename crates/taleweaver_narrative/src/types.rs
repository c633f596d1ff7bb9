//! Wire types of the story flows.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Rating reported when a turn could not be judged.
pub const NEUTRAL_RATING: &str = "NEUTRAL";

/// Progress reported when a turn failed before computing any.
pub const UNKNOWN_PROGRESS: f64 = -1.0;

/// Input of `descriptionFlow`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionInput {
    /// What the player said, possibly nothing
    #[serde(default)]
    pub user_input: Option<String>,
    /// Session to continue
    #[serde(default)]
    pub session_id: Option<String>,
    /// Start the conversation over
    #[serde(default)]
    pub clear_session: bool,
}

/// Output of `descriptionFlow`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionOutput {
    /// Premise assembled so far
    pub story_premise: String,
    /// Question to narrow the premise down
    pub next_question: String,
    /// Example answers to `next_question`
    pub premise_options: Vec<String>,
}

impl DescriptionOutput {
    /// Neutral answer used whenever the model call or parse fails.
    pub fn fallback() -> Self {
        Self {
            story_premise: String::new(),
            next_question: "Tell me more about the story".to_string(),
            premise_options: Vec::new(),
        }
    }
}

/// Input of `beginStoryFlow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BeginInput {
    /// The agreed premise
    pub user_input: String,
    /// Session to continue
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Output of `beginStoryFlow`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BeginOutput {
    /// Opening passage
    pub story_parts: Vec<String>,
    /// What the player may do next
    pub options: Vec<String>,
    /// Always `0` at the start
    pub progress: f64,
    /// Goal of the story
    pub primary_objective: String,
}

/// Input of `continueStoryFlow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContinueInput {
    /// The player's choice
    pub user_input: String,
    /// Session to continue
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Output of `continueStoryFlow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContinueOutput {
    /// Next passage, followed by the ending once reached
    pub story_parts: Vec<String>,
    /// What the player may do next
    pub options: Vec<String>,
    /// Goal of the story
    pub primary_objective: String,
    /// Position in `[0, 1]`, or `-1` when the turn failed
    pub progress: f64,
    /// How much the choice helped
    pub rating: String,
}

impl ContinueOutput {
    /// Answer used when a turn fails; carries the previous objective.
    pub fn fallback(primary_objective: impl Into<String>) -> Self {
        Self {
            story_parts: Vec::new(),
            options: Vec::new(),
            primary_objective: primary_objective.into(),
            progress: UNKNOWN_PROGRESS,
            rating: NEUTRAL_RATING.to_string(),
        }
    }
}

/// Input of `genImgFlow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    /// Story text to illustrate
    pub story: String,
    /// Session the request belongs to
    #[serde(default)]
    pub session_id: Option<String>,
}
