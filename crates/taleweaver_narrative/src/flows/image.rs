use super::StoryServices;
use crate::{ImageInput, strip_reasoning};
use async_trait::async_trait;
use taleweaver_core::{GenerationOptions, ImageRequest};
use taleweaver_error::{ProviderError, ProviderErrorKind, TaleweaverResult};
use taleweaver_flow::{FlowContext, TypedFlow};
use tracing::{debug, instrument, warn};

const DESCRIPTION_MAX_TOKENS: u32 = 500;
const IMAGE_SIZE: u32 = 512;
const IMAGE_STEPS: u32 = 20;

/// Illustrates a passage and returns a `data:` URI.
///
/// Returns an empty string when image generation is disabled or anything
/// along the way fails.
#[derive(Debug, Clone)]
pub struct GenImgFlow {
    services: StoryServices,
}

impl GenImgFlow {
    /// Flow over the given services.
    pub fn new(services: StoryServices) -> Self {
        Self { services }
    }

    /// The scene description sees the session's history for context, but the
    /// exchange is not recorded.
    async fn illustrate(&self, story: &str, session_id: &str) -> TaleweaverResult<String> {
        let prompts = self.services.prompts();
        let history = self.services.sessions().messages(session_id)?;
        let raw = self
            .services
            .text()
            .generate_with_history(
                &history,
                &prompts.image_description(story),
                None,
                &GenerationOptions::with_limit(DESCRIPTION_MAX_TOKENS),
            )
            .await?;
        let description = strip_reasoning(&raw);
        if description.is_empty() {
            debug!("Model returned no scene description");
            return Ok(String::new());
        }

        let request = ImageRequest::builder()
            .prompt(prompts.image_prompt(&description))
            .width(IMAGE_SIZE)
            .height(IMAGE_SIZE)
            .steps(IMAGE_STEPS)
            .build()
            .map_err(|e| ProviderError::new(ProviderErrorKind::InvalidRequest(e.to_string())))?;

        let image = self.services.image().generate_image(&request).await?;
        Ok(image.map(|image| image.data_uri()).unwrap_or_default())
    }
}

#[async_trait]
impl TypedFlow for GenImgFlow {
    type Input = ImageInput;
    type Output = String;

    const NAME: &'static str = "genImgFlow";

    #[instrument(skip_all, fields(flow = Self::NAME, session_id = %ctx.session_id()))]
    async fn run(&self, input: Self::Input, ctx: FlowContext) -> TaleweaverResult<Self::Output> {
        if !self.services.image().is_enabled() {
            debug!("Image generation disabled");
            return Ok(String::new());
        }
        match self.illustrate(&input.story, ctx.session_id()).await {
            Ok(uri) => Ok(uri),
            Err(e) => {
                warn!(error = %e, backend = self.services.image().backend_name(), "Illustration failed");
                Ok(String::new())
            }
        }
    }
}
