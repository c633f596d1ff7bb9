//! HTTP front end: one `POST` route per flow name and a health check.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use taleweaver_core::{FlowRequest, FlowResponse};
use taleweaver_flow::FlowRegistry;
use tracing::{info, instrument, warn};

/// Request body of `POST /{flowName}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeBody {
    /// Flow input
    #[serde(default)]
    pub input: Value,
    /// Session to run against
    #[serde(default)]
    pub session_id: Option<String>,
}

impl InvokeBody {
    /// The engine-level request for `flow_name`.
    pub fn into_request(self, flow_name: impl Into<String>) -> FlowRequest {
        let session_id = self.resolved_session_id();
        FlowRequest {
            flow_name: flow_name.into(),
            input: self.input,
            session_id,
        }
    }

    /// The explicit session id, else a string `input.sessionId`.
    pub fn resolved_session_id(&self) -> Option<String> {
        self.session_id.clone().or_else(|| {
            self.input
                .get("sessionId")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests
    pub status: String,
    /// Registered flow names, sorted
    pub flows: Vec<String>,
    /// RFC 3339 time of the check
    pub timestamp: String,
}

/// Build the router over a shared registry.
pub fn create_router(registry: Arc<FlowRegistry>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/:flow_name", post(invoke_flow))
        .with_state(registry)
}

async fn health_check(State(registry): State<Arc<FlowRegistry>>) -> Json<HealthResponse> {
    let mut flows = registry.list();
    flows.sort();
    Json(HealthResponse {
        status: "healthy".to_string(),
        flows,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Every outcome, including a malformed body, is answered with the envelope.
#[instrument(skip(registry, body))]
async fn invoke_flow(
    State(registry): State<Arc<FlowRegistry>>,
    Path(flow_name): Path<String>,
    body: Result<Json<InvokeBody>, JsonRejection>,
) -> Json<FlowResponse> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected request body");
            return Json(FlowResponse::failure(rejection.body_text(), String::new()));
        }
    };

    let response = registry.dispatch(body.into_request(flow_name)).await;
    info!(
        session_id = %response.session_id,
        ok = response.is_success(),
        "Request served"
    );
    Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_session_id_wins() {
        let body: InvokeBody = serde_json::from_value(json!({
            "input": {"sessionId": "inner"},
            "sessionId": "outer"
        }))
        .unwrap();
        assert_eq!(body.resolved_session_id().as_deref(), Some("outer"));
    }

    #[test]
    fn test_falls_back_to_input_session_id() {
        let body: InvokeBody =
            serde_json::from_value(json!({"input": {"sessionId": "inner"}})).unwrap();
        assert_eq!(body.resolved_session_id().as_deref(), Some("inner"));

        let body: InvokeBody = serde_json::from_value(json!({"input": {"sessionId": 7}})).unwrap();
        assert_eq!(body.resolved_session_id(), None);
    }

    #[test]
    fn test_into_request_carries_resolved_session() {
        let body: InvokeBody =
            serde_json::from_value(json!({"input": {"sessionId": "inner", "story": "x"}})).unwrap();
        let request = body.into_request("genImgFlow");
        assert_eq!(request.flow_name, "genImgFlow");
        assert_eq!(request.session_id.as_deref(), Some("inner"));
        assert_eq!(request.input["story"], "x");
    }

    #[test]
    fn test_missing_input_is_null() {
        let body: InvokeBody = serde_json::from_value(json!({})).unwrap();
        assert_eq!(body.input, Value::Null);
    }
}
