//! Taleweaver - interactive story generation backend
//!
//! Taleweaver runs named, schema-validated flows that drive a language model
//! and an image model through a branching story, keeping per-session history
//! and narrative progress in memory.
//!
//! # Architecture
//!
//! - `taleweaver_error` - Error types
//! - `taleweaver_core` - Messages, requests, sessions and the response envelope
//! - `taleweaver_interface` - `TextGenerator`, `ImageGenerator` and `FlowHandler` traits
//! - `taleweaver_models` - OpenAI-compatible text client, image strategies, retry and configuration
//! - `taleweaver_session` - In-memory session store
//! - `taleweaver_flow` - Flow registry and executor
//! - `taleweaver_narrative` - JSON recovery, milestones and the story flows
//!
//! This crate re-exports everything and adds the HTTP front end, logging
//! setup and the `taleweaver` binary.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use taleweaver::{TaleweaverConfig, build_registry};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TaleweaverConfig::load(None)?;
//! let registry = build_registry(&config)?;
//!
//! let response = registry
//!     .execute("descriptionFlow", serde_json::json!({"userInput": "a haunted lighthouse"}), None)
//!     .await;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod app;
mod http;
mod observability;

pub use app::build_registry;
pub use http::{HealthResponse, InvokeBody, create_router};
pub use observability::{ObservabilityConfig, init_observability, init_observability_with_config};

pub use taleweaver_core::*;
pub use taleweaver_error::*;
pub use taleweaver_flow::*;
pub use taleweaver_interface::*;
pub use taleweaver_models::*;
pub use taleweaver_narrative::*;
pub use taleweaver_session::*;
