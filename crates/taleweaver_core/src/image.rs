//! Image generation request and payload types.

use serde::{Deserialize, Serialize};

/// Parameters for a single text-to-image call.
///
/// # Examples
///
/// ```
/// use taleweaver_core::ImageRequest;
///
/// let request = ImageRequest::builder()
///     .prompt("A lighthouse at dusk")
///     .build()
///     .unwrap();
/// assert_eq!(*request.width(), 512);
/// assert_eq!(*request.steps(), 20);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct ImageRequest {
    /// What to draw
    prompt: String,
    /// What to avoid
    #[builder(default)]
    negative_prompt: String,
    /// Target width in pixels
    #[builder(default = "512")]
    width: u32,
    /// Target height in pixels
    #[builder(default = "512")]
    height: u32,
    /// Sampling steps
    #[builder(default = "20")]
    steps: u32,
}

impl ImageRequest {
    /// Creates a new image request builder.
    pub fn builder() -> ImageRequestBuilder {
        ImageRequestBuilder::default()
    }
}

/// A finished image, already base64 encoded.
///
/// # Examples
///
/// ```
/// use taleweaver_core::GeneratedImage;
///
/// let image = GeneratedImage::png("iVBORw0KGgo=");
/// assert_eq!(image.data_uri(), "data:image/png;base64,iVBORw0KGgo=");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GeneratedImage {
    /// MIME type of the decoded bytes
    mime_type: String,
    /// Base64 payload
    base64: String,
}

impl GeneratedImage {
    /// Wrap an already encoded payload.
    pub fn new(mime_type: impl Into<String>, base64: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64: base64.into(),
        }
    }

    /// Wrap an encoded PNG.
    pub fn png(base64: impl Into<String>) -> Self {
        Self::new("image/png", base64)
    }

    /// Render as a `data:` URI.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}
