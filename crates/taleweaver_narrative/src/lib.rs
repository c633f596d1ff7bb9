//! Interactive story flows for Taleweaver.
//!
//! This crate holds the story domain layered on the flow engine:
//!
//! - `extraction`: recovering JSON from fenced, truncated or reasoning-laden model output
//! - `progress`: milestone progression
//! - `prompts`: the [`StoryPrompts`] trait and its default text
//! - [`state`]: session state keys and the [`NarrativePhase`] lifecycle
//! - `flows`: `descriptionFlow`, `beginStoryFlow`, `continueStoryFlow` and `genImgFlow`
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use taleweaver_flow::FlowRegistry;
//! use taleweaver_narrative::{StoryServices, register_story_flows};
//! use taleweaver_session::SessionStore;
//! # use taleweaver_interface::{ImageGenerator, TextGenerator};
//! # fn demo(text: Arc<dyn TextGenerator>, image: Arc<dyn ImageGenerator>) -> taleweaver_error::TaleweaverResult<()> {
//!
//! let sessions = Arc::new(SessionStore::new());
//! let registry = FlowRegistry::new(sessions.clone());
//! register_story_flows(&registry, StoryServices::new(sessions, text, image))?;
//! assert_eq!(registry.list().len(), 4);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod extraction;
mod flows;
mod payload;
mod progress;
mod prompts;
pub mod state;
mod types;

pub use extraction::{extract_json, parse_json, strip_reasoning};
pub use flows::{
    BeginStoryFlow, ContinueStoryFlow, DescriptionFlow, GenImgFlow, StoryServices,
    register_story_flows,
};
pub use progress::{ProgressUpdate, advance};
pub use prompts::{DefaultPrompts, StoryPrompts};
pub use state::NarrativePhase;
pub use types::{
    BeginInput, BeginOutput, ContinueInput, ContinueOutput, DescriptionInput, DescriptionOutput,
    ImageInput, NEUTRAL_RATING, UNKNOWN_PROGRESS,
};
