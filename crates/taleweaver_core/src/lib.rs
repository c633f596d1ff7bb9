//! Core data types for the Taleweaver story engine.
//!
//! This crate provides the plain data shared by every other crate in the
//! workspace: chat messages, generation requests, image payloads, sessions and
//! the flow invocation envelope.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod envelope;
mod image;
mod message;
mod request;
mod role;
mod session;

pub use envelope::{FlowRequest, FlowResponse};
pub use image::{GeneratedImage, ImageRequest, ImageRequestBuilder};
pub use message::ChatMessage;
pub use request::{GenerateRequest, GenerationOptions, GenerationOptionsBuilder};
pub use role::Role;
pub use session::Session;
