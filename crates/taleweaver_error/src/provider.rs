//! Generation provider error types and retry classification.

use crate::RetryableError;

/// Specific failure conditions of a text or image generation provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// A required credential is absent from configuration
    #[display("{} is required but not configured", _0)]
    MissingCredential(String),
    /// Provider answered with a non-success status
    #[display("HTTP {} error: {}", status_code, message)]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Response body or reason
        message: String,
    },
    /// Connection could not be established or was dropped
    #[display("Network error: {}", _0)]
    Network(String),
    /// A request or polling budget was exceeded
    #[display("Timed out: {}", _0)]
    Timeout(String),
    /// The request could not be built or was rejected before sending
    #[display("Invalid request: {}", _0)]
    InvalidRequest(String),
    /// The image job finished without producing an image
    #[display("Image unavailable: {}", _0)]
    ImageUnavailable(String),
}

impl ProviderErrorKind {
    /// Transient conditions worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderErrorKind::Http { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            ProviderErrorKind::Network(_) => true,
            ProviderErrorKind::Timeout(_) => true,
            _ => false,
        }
    }

    /// Timeouts back off harder than other transient failures.
    pub fn is_timeout(&self) -> bool {
        match self {
            ProviderErrorKind::Timeout(_) => true,
            ProviderErrorKind::Http { status_code, .. } => *status_code == 408,
            _ => false,
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use taleweaver_error::{ProviderError, ProviderErrorKind, RetryableError};
///
/// let err = ProviderError::new(ProviderErrorKind::Http {
///     status_code: 503,
///     message: "overloaded".to_string(),
/// });
/// assert!(err.is_retryable());
/// assert!(!err.is_timeout());
///
/// let missing = ProviderError::new(ProviderErrorKind::MissingCredential(
///     "OPENAI_API_KEY".to_string(),
/// ));
/// assert!(!missing.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl RetryableError for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn is_timeout(&self) -> bool {
        self.kind.is_timeout()
    }
}
