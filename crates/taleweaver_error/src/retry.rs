//! Retry classification shared by every provider error.

/// Errors that know whether another attempt could succeed.
///
/// The retry loop in `taleweaver_models` consults this trait after every
/// failed attempt: permanent errors are surfaced immediately, transient ones
/// are retried, and timeouts wait longer before the next attempt.
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    ///
    /// Timeouts, dropped connections, 429 and 5xx responses are transient.
    /// Missing credentials and other 4xx responses are permanent.
    fn is_retryable(&self) -> bool;

    /// Returns true if the failure was a timeout.
    fn is_timeout(&self) -> bool {
        false
    }
}
