//! Session store error types.

/// Specific error conditions for session operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SessionErrorKind {
    /// No session is registered under the id
    #[display("Session '{}' not found", _0)]
    NotFound(String),
    /// The session store lock was poisoned by a panicking writer
    #[display("Session store lock poisoned")]
    Poisoned,
}

/// Session error with location tracking.
///
/// # Examples
///
/// ```
/// use taleweaver_error::{SessionError, SessionErrorKind};
///
/// let err = SessionError::new(SessionErrorKind::NotFound("abc".to_string()));
/// assert!(format!("{}", err).contains("'abc' not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Session Error: {} at line {} in {}", kind, line, file)]
pub struct SessionError {
    /// The specific error condition
    pub kind: SessionErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl SessionError {
    /// Create a new SessionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SessionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
