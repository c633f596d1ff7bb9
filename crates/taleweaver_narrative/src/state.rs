//! Narrative bookkeeping stored in session state.

use serde::{Deserialize, Serialize};

/// Session state key of the story's goal.
pub const PRIMARY_OBJECTIVE: &str = "primaryObjective";
/// Session state key of the ordered milestone list.
pub const MILESTONES: &str = "milestones";
/// Session state key of the milestone currently being pursued.
pub const CURRENT_MILESTONE: &str = "currentMilestone";
/// Session state key set when a description flow reset the session.
pub const INITIALIZED: &str = "initialized";
/// Session state key of the [`NarrativePhase`].
pub const PHASE: &str = "phase";
/// Session state key set once the ending has been written.
pub const CONCLUDED: &str = "concluded";

/// Lifecycle of a story within one session.
///
/// # Examples
///
/// ```
/// use taleweaver_narrative::NarrativePhase;
///
/// assert_eq!(NarrativePhase::default(), NarrativePhase::Uninitialized);
/// assert_eq!(serde_json::to_string(&NarrativePhase::InProgress).unwrap(), "\"inProgress\"");
/// assert!(NarrativePhase::Concluded > NarrativePhase::Begun);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum NarrativePhase {
    /// Nothing has happened yet
    #[default]
    Uninitialized,
    /// A premise has been discussed
    Described,
    /// The opening and milestones exist
    Begun,
    /// At least one continuation has been played
    InProgress,
    /// The ending has been written
    Concluded,
}
