//! OpenAI-compatible chat completion client.

mod client;
mod dto;

pub use client::OpenAiClient;
pub use dto::{ChatCompletionRequest, ChatCompletionResponse, Choice, ChoiceMessage, WireMessage};
