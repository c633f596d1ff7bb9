use async_trait::async_trait;
use taleweaver_core::{GeneratedImage, ImageRequest};
use taleweaver_error::TaleweaverResult;
use taleweaver_interface::ImageGenerator;
use tracing::debug;

/// Image strategy that never produces an image.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledImageGenerator;

#[async_trait]
impl ImageGenerator for DisabledImageGenerator {
    async fn generate_image(&self, _req: &ImageRequest) -> TaleweaverResult<Option<GeneratedImage>> {
        debug!("Image generation disabled");
        Ok(None)
    }

    fn backend_name(&self) -> &'static str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
