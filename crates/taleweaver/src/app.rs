//! Wiring the configured providers into a flow registry.

use std::sync::Arc;
use taleweaver_error::TaleweaverResult;
use taleweaver_flow::FlowRegistry;
use taleweaver_models::{TaleweaverConfig, image_generator, text_generator};
use taleweaver_narrative::{StoryServices, register_story_flows};
use taleweaver_session::SessionStore;
use tracing::{info, instrument};

/// Construct the session store and generation clients once and register the
/// story flows over them.
///
/// A missing API key is not an error here; the text client reports it on
/// first use.
///
/// # Errors
///
/// Returns an error if an HTTP client cannot be built or a flow schema fails
/// to compile.
#[instrument(skip_all)]
pub fn build_registry(config: &TaleweaverConfig) -> TaleweaverResult<FlowRegistry> {
    let sessions = Arc::new(SessionStore::new());
    let text = text_generator(config)?;
    let image = image_generator(config)?;
    info!(
        provider = text.provider_name(),
        model = text.model_name(),
        image_backend = image.backend_name(),
        "Generation clients ready"
    );

    let registry = FlowRegistry::new(sessions.clone());
    register_story_flows(&registry, StoryServices::new(sessions, text, image))?;
    info!(flows = ?registry.list(), "Flows registered");
    Ok(registry)
}
