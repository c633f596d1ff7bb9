//! In-memory session store for the Taleweaver story engine.
//!
//! Sessions hold conversation history and keyed narrative state. They live in
//! process memory only and are never expired automatically.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod store;

pub use store::SessionStore;
