//! Flow registry and executor.

use crate::{Flow, TypedFlow};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use taleweaver_core::{FlowRequest, FlowResponse};
use taleweaver_error::{
    FlowError, FlowErrorKind, JsonError, TaleweaverError, TaleweaverErrorKind, TaleweaverResult,
};
use taleweaver_interface::FlowContext;
use taleweaver_session::SessionStore;
use tracing::{debug, error, info, instrument, warn};

type SessionLocks = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// Named flows plus the session store they run against.
///
/// Executions against the same session id are serialized; executions against
/// different sessions run concurrently.
#[derive(Debug)]
pub struct FlowRegistry {
    flows: RwLock<HashMap<String, Arc<Flow>>>,
    sessions: Arc<SessionStore>,
    session_locks: Mutex<SessionLocks>,
}

impl FlowRegistry {
    /// Create an empty registry over `sessions`.
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self {
            flows: RwLock::new(HashMap::new()),
            sessions,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The session store flows run against.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Add a flow, replacing any flow already registered under its name.
    #[instrument(skip(self, flow), fields(flow = %flow.name()))]
    pub fn register(&self, flow: Flow) {
        let name = flow.name().clone();
        let mut flows = self.flows.write().unwrap_or_else(|p| p.into_inner());
        if flows.insert(name, Arc::new(flow)).is_some() {
            warn!("Replaced previously registered flow");
        } else {
            debug!("Registered flow");
        }
    }

    /// Register a [`TypedFlow`].
    ///
    /// # Errors
    ///
    /// Returns an error if the flow's schemas fail to compile.
    pub fn register_typed<T: TypedFlow>(&self, flow: T) -> TaleweaverResult<()> {
        self.register(Flow::typed(flow)?);
        Ok(())
    }

    /// Look up a flow by name.
    pub fn get(&self, name: &str) -> Option<Arc<Flow>> {
        self.flows
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(name)
            .cloned()
    }

    /// Names of every registered flow, in no particular order.
    pub fn list(&self) -> Vec<String> {
        self.flows
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Run a flow and wrap the outcome in an envelope. Never fails.
    ///
    /// 1. Unknown names fail with `NotFound`.
    /// 2. Input is validated before the handler runs.
    /// 3. The session is reused, created under the given id, or created fresh.
    /// 4. The handler runs; errors and panics are captured.
    /// 5. Output is validated after the handler ran. Session side effects are
    ///    not rolled back when it fails.
    #[instrument(skip(self, input), fields(flow = %name, session_id = ?session_id))]
    pub async fn execute(
        &self,
        name: &str,
        input: serde_json::Value,
        session_id: Option<&str>,
    ) -> FlowResponse {
        let started = Instant::now();
        match self.run(name, input, session_id).await {
            Ok((result, resolved)) => {
                info!(
                    session_id = %resolved,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Flow completed"
                );
                FlowResponse::success(result, resolved)
            }
            Err((err, resolved)) => {
                let message = envelope_message(&err);
                warn!(error = %message, "Flow failed");
                FlowResponse::failure(message, resolved)
            }
        }
    }

    /// [`execute`](Self::execute) for a request arriving at the invocation boundary.
    pub async fn dispatch(&self, request: FlowRequest) -> FlowResponse {
        let FlowRequest {
            flow_name,
            input,
            session_id,
        } = request;
        self.execute(&flow_name, input, session_id.as_deref()).await
    }

    /// Run a flow and deserialize its result, failing on any envelope error.
    ///
    /// # Errors
    ///
    /// Returns the executor or handler error, or a JSON error if the result
    /// does not deserialize as `O`.
    pub async fn call<O: DeserializeOwned>(
        &self,
        name: &str,
        input: serde_json::Value,
        session_id: Option<&str>,
    ) -> TaleweaverResult<O> {
        let (value, _) = self.run(name, input, session_id).await.map_err(|(e, _)| e)?;
        serde_json::from_value(value)
            .map_err(|e| JsonError::new(format!("flow '{}' result: {}", name, e)).into())
    }

    async fn run(
        &self,
        name: &str,
        input: serde_json::Value,
        session_id: Option<&str>,
    ) -> Result<(serde_json::Value, String), (TaleweaverError, String)> {
        let requested = session_id.unwrap_or_default().to_string();

        let flow = self.get(name).ok_or_else(|| {
            (
                TaleweaverError::from(FlowError::new(FlowErrorKind::NotFound(name.to_string()))),
                requested.clone(),
            )
        })?;

        if let Some(schema) = flow.input_schema() {
            schema.validate(&input).map_err(|errors| {
                (
                    TaleweaverError::from(FlowError::new(FlowErrorKind::InputValidation {
                        flow: name.to_string(),
                        details: errors.join("; "),
                    })),
                    requested.clone(),
                )
            })?;
        }

        let resolved = self
            .sessions
            .resolve(session_id)
            .map_err(|e| (e, requested.clone()))?;

        let lock = self.session_lock(&resolved);
        let result = {
            let _guard = lock.lock().await;
            self.invoke(&flow, input, &resolved).await
        };
        drop(lock);
        self.release_session_lock(&resolved);

        let output = result.map_err(|e| (e, resolved.clone()))?;

        if let Some(schema) = flow.output_schema() {
            schema.validate(&output).map_err(|errors| {
                (
                    TaleweaverError::from(FlowError::new(FlowErrorKind::OutputValidation {
                        flow: name.to_string(),
                        details: errors.join("; "),
                    })),
                    resolved.clone(),
                )
            })?;
        }

        Ok((output, resolved))
    }

    async fn invoke(
        &self,
        flow: &Flow,
        input: serde_json::Value,
        session_id: &str,
    ) -> TaleweaverResult<serde_json::Value> {
        let ctx = FlowContext::new(session_id);
        let outcome = AssertUnwindSafe(flow.handler().handle(input, ctx))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                if err.as_flow().is_some() {
                    return Err(err);
                }
                error!(flow = %flow.name(), error = %err, "Flow handler failed");
                Err(FlowError::new(FlowErrorKind::Handler {
                    flow: flow.name().clone(),
                    message: envelope_message(&err),
                })
                .into())
            }
            Err(_) => {
                error!(flow = %flow.name(), "Flow handler panicked");
                Err(FlowError::new(FlowErrorKind::Panicked(flow.name().clone())).into())
            }
        }
    }

    fn session_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.session_locks
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    fn release_session_lock(&self, session_id: &str) {
        let mut locks = self.session_locks.lock().unwrap_or_else(|p| p.into_inner());
        if locks
            .get(session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(session_id);
        }
    }
}

/// Caller-facing text of an error: the bare condition, without source location.
fn envelope_message(err: &TaleweaverError) -> String {
    match err.kind() {
        TaleweaverErrorKind::Flow(e) => e.kind.to_string(),
        TaleweaverErrorKind::Provider(e) => e.kind.to_string(),
        TaleweaverErrorKind::Session(e) => e.kind.to_string(),
        TaleweaverErrorKind::Parse(e) => e.message.clone(),
        TaleweaverErrorKind::Config(e) => e.message.clone(),
        TaleweaverErrorKind::Json(e) => e.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler_fn;
    use serde_json::json;

    fn registry() -> FlowRegistry {
        FlowRegistry::new(Arc::new(SessionStore::new()))
    }

    #[tokio::test]
    async fn test_locks_are_released_after_execution() {
        let registry = registry();
        registry.register(Flow::new("noop", handler_fn(|_, _| async { Ok(json!(null)) })));

        let response = registry.execute("noop", json!({}), Some("s1")).await;
        assert!(response.is_success());
        assert!(registry.session_locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_envelope_message_drops_location() {
        let err: TaleweaverError = FlowError::new(FlowErrorKind::NotFound("x".to_string())).into();
        assert_eq!(envelope_message(&err), "Flow 'x' not found");
    }
}
