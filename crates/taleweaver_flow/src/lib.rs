//! Schema-validated flow registry and executor for Taleweaver.
//!
//! A [`Flow`] is a named asynchronous handler with optional JSON Schemas for
//! its input and output. The [`FlowRegistry`] looks flows up by name,
//! validates input, resolves the session, runs the handler, validates the
//! output and always answers with a [`FlowResponse`] envelope.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use taleweaver_flow::{Flow, FlowRegistry, handler_fn};
//! use taleweaver_session::SessionStore;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let registry = FlowRegistry::new(Arc::new(SessionStore::new()));
//! registry.register(Flow::new(
//!     "echo",
//!     handler_fn(|input, _ctx| async move { Ok(input) }),
//! ));
//!
//! let response = registry.execute("echo", json!({"hello": "world"}), None).await;
//! assert_eq!(response.result, Some(json!({"hello": "world"})));
//! assert!(response.error.is_none());
//! # }
//! ```
//!
//! [`FlowResponse`]: taleweaver_core::FlowResponse

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod flow;
mod registry;
mod schema;

pub use flow::{Flow, TypedFlow, handler_fn};
pub use registry::FlowRegistry;
pub use schema::FlowSchema;
pub use taleweaver_interface::{FlowContext, FlowHandler};
