//! Error types for the Taleweaver story engine.
//!
//! Every error in the workspace follows the same shape:
//! - a `*ErrorKind` enum names the specific condition
//! - a `*Error` struct wraps the kind together with the source location
//! - constructors are `#[track_caller]`, so the location is captured automatically
//!
//! The top-level [`TaleweaverError`] boxes a [`TaleweaverErrorKind`] and can be built
//! from any of the concrete errors with `?`.
//!
//! # Examples
//!
//! ```
//! use taleweaver_error::{FlowError, FlowErrorKind, TaleweaverResult};
//!
//! fn lookup(name: &str) -> TaleweaverResult<()> {
//!     Err(FlowError::new(FlowErrorKind::NotFound(name.to_string())))?
//! }
//!
//! let err = lookup("missingFlow").unwrap_err();
//! assert!(err.to_string().contains("missingFlow"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod flow;
mod json;
mod parse;
mod provider;
mod retry;
mod session;

pub use config::ConfigError;
pub use error::{TaleweaverError, TaleweaverErrorKind, TaleweaverResult};
pub use flow::{FlowError, FlowErrorKind};
pub use json::JsonError;
pub use parse::ParseError;
pub use provider::{ProviderError, ProviderErrorKind};
pub use retry::RetryableError;
pub use session::{SessionError, SessionErrorKind};
