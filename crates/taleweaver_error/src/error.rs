//! Top-level error wrapper types.

use crate::{
    ConfigError, FlowError, JsonError, ParseError, ProviderError, RetryableError, SessionError,
};

/// Every error condition the workspace can produce.
///
/// # Examples
///
/// ```
/// use taleweaver_error::{ParseError, TaleweaverError};
///
/// let parse = ParseError::new("unbalanced braces", "{\"a\": [");
/// let err: TaleweaverError = parse.into();
/// assert!(format!("{}", err).contains("Parse Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TaleweaverErrorKind {
    /// Flow registry / executor error
    #[from(FlowError)]
    Flow(FlowError),
    /// Generation provider error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Model output could not be parsed
    #[from(ParseError)]
    Parse(ParseError),
    /// Session store error
    #[from(SessionError)]
    Session(SessionError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization error
    #[from(JsonError)]
    Json(JsonError),
}

/// Taleweaver error with kind discrimination.
///
/// # Examples
///
/// ```
/// use taleweaver_error::{ConfigError, TaleweaverErrorKind, TaleweaverResult};
///
/// fn load() -> TaleweaverResult<()> {
///     Err(ConfigError::new("server.port is not a number"))?
/// }
///
/// let err = load().unwrap_err();
/// assert!(matches!(err.kind(), TaleweaverErrorKind::Config(_)));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Taleweaver Error: {}", _0)]
pub struct TaleweaverError(Box<TaleweaverErrorKind>);

impl TaleweaverError {
    /// Create a new error from a kind.
    pub fn new(kind: TaleweaverErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TaleweaverErrorKind {
        &self.0
    }

    /// The flow error, if this is one.
    pub fn as_flow(&self) -> Option<&FlowError> {
        match self.kind() {
            TaleweaverErrorKind::Flow(e) => Some(e),
            _ => None,
        }
    }

    /// The provider error, if this is one.
    pub fn as_provider(&self) -> Option<&ProviderError> {
        match self.kind() {
            TaleweaverErrorKind::Provider(e) => Some(e),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to TaleweaverErrorKind
impl<T> From<T> for TaleweaverError
where
    T: Into<TaleweaverErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

impl RetryableError for TaleweaverError {
    fn is_retryable(&self) -> bool {
        self.as_provider().is_some_and(|e| e.is_retryable())
    }

    fn is_timeout(&self) -> bool {
        self.as_provider().is_some_and(|e| e.is_timeout())
    }
}

/// Result type for Taleweaver operations.
pub type TaleweaverResult<T> = std::result::Result<T, TaleweaverError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FlowErrorKind, ProviderErrorKind, SessionErrorKind};

    #[test]
    fn test_provider_errors_keep_retry_classification() {
        let err: TaleweaverError =
            ProviderError::new(ProviderErrorKind::Timeout("120000ms".to_string())).into();
        assert!(err.is_retryable());
        assert!(err.is_timeout());

        let err: TaleweaverError =
            ProviderError::new(ProviderErrorKind::Http {
                status_code: 401,
                message: "bad key".to_string(),
            })
            .into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_non_provider_errors_are_permanent() {
        let err: TaleweaverError =
            SessionError::new(SessionErrorKind::NotFound("s1".to_string())).into();
        assert!(!err.is_retryable());
        assert!(err.as_provider().is_none());
    }

    #[test]
    fn test_flow_error_accessor() {
        let err: TaleweaverError =
            FlowError::new(FlowErrorKind::NotFound("nope".to_string())).into();
        let flow = err.as_flow().expect("flow error");
        assert_eq!(flow.kind, FlowErrorKind::NotFound("nope".to_string()));
    }

    #[test]
    fn test_location_is_captured() {
        let err = ConfigError::new("boom");
        assert!(err.file.ends_with("error.rs"));
        assert!(err.line > 0);
    }
}
