//! Capability traits for the Taleweaver story engine.
//!
//! Generation backends implement [`TextGenerator`] and [`ImageGenerator`];
//! flows implement [`FlowHandler`]. Everything above this crate depends on the
//! traits only, so tests can substitute scripted fakes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod flow;
mod generation;

pub use flow::{FlowContext, FlowHandler};
pub use generation::{ImageGenerator, TextGenerator, build_request};
