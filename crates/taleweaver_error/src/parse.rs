//! Failure to recover structured data from model output.

/// Maximum number of characters of the offending input kept in a [`ParseError`].
pub const PREVIEW_CHARS: usize = 100;

/// The resilient extractor gave up on a piece of model output.
///
/// Only a bounded preview of the input is retained so that huge model
/// responses never end up in logs or error envelopes verbatim.
///
/// # Examples
///
/// ```
/// use taleweaver_error::ParseError;
///
/// let long = "x".repeat(500);
/// let err = ParseError::new("no JSON value found", &long);
/// assert_eq!(err.preview.chars().count(), 100);
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Parse Error: {} (input: {}...) at line {} in {}", message, preview, line, file)]
pub struct ParseError {
    /// Why parsing failed
    pub message: String,
    /// First characters of the input that could not be parsed
    pub preview: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ParseError {
    /// Create a new ParseError, truncating `input` to a short preview.
    #[track_caller]
    pub fn new(message: impl Into<String>, input: &str) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            preview: input.chars().take(PREVIEW_CHARS).collect(),
            line: location.line(),
            file: location.file(),
        }
    }
}
