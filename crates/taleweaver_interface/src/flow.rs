//! Flow handler capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taleweaver_error::TaleweaverResult;

/// What a handler is told about the invocation.
///
/// Only the resolved session id and free-form metadata are exposed; session
/// contents are reached through the session store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct FlowContext {
    /// Session the flow runs against
    session_id: String,
    /// Free-form caller metadata
    metadata: HashMap<String, serde_json::Value>,
}

impl FlowContext {
    /// Context for the given session with no metadata.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Asynchronous function from `(input, context)` to output.
#[async_trait]
pub trait FlowHandler: Send + Sync {
    /// Run the flow.
    async fn handle(
        &self,
        input: serde_json::Value,
        ctx: FlowContext,
    ) -> TaleweaverResult<serde_json::Value>;
}
