//! Flow registry and executor error types.

/// Specific error conditions raised by the flow executor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum FlowErrorKind {
    /// No flow is registered under the name
    #[display("Flow '{}' not found", _0)]
    NotFound(String),
    /// Input did not conform to the flow's input schema
    #[display("Input validation failed for flow '{}': {}", flow, details)]
    InputValidation {
        /// Flow name
        flow: String,
        /// Validator messages, joined
        details: String,
    },
    /// Handler result did not conform to the flow's output schema
    #[display("Output validation failed for flow '{}': {}", flow, details)]
    OutputValidation {
        /// Flow name
        flow: String,
        /// Validator messages, joined
        details: String,
    },
    /// A declared schema is not itself a valid JSON Schema
    #[display("Invalid schema: {}", _0)]
    InvalidSchema(String),
    /// The handler returned an error
    #[display("Flow '{}' failed: {}", flow, message)]
    Handler {
        /// Flow name
        flow: String,
        /// Error reported by the handler
        message: String,
    },
    /// The handler panicked
    #[display("Flow '{}' panicked", _0)]
    Panicked(String),
    /// Typed input or output could not cross the JSON boundary
    #[display("Serialization error: {}", _0)]
    Serialization(String),
}

impl FlowErrorKind {
    /// True for the two schema violation kinds.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FlowErrorKind::InputValidation { .. } | FlowErrorKind::OutputValidation { .. }
        )
    }
}

/// Flow error with location tracking.
///
/// # Examples
///
/// ```
/// use taleweaver_error::{FlowError, FlowErrorKind};
///
/// let err = FlowError::new(FlowErrorKind::InputValidation {
///     flow: "beginStoryFlow".to_string(),
///     details: "\"userInput\" is a required property".to_string(),
/// });
/// assert!(err.kind.is_validation());
/// assert!(format!("{}", err).contains("beginStoryFlow"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Flow Error: {} at line {} in {}", kind, line, file)]
pub struct FlowError {
    /// The specific error condition
    pub kind: FlowErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl FlowError {
    /// Create a new FlowError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: FlowErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
