//! Flow invocation envelope.

use serde::{Deserialize, Serialize};

/// An inbound request to run a named flow.
///
/// # Examples
///
/// ```
/// use taleweaver_core::FlowRequest;
///
/// let request: FlowRequest = serde_json::from_str(
///     r#"{"flowName":"beginStoryFlow","input":{"userInput":"a heist"},"sessionId":"s1"}"#,
/// ).unwrap();
/// assert_eq!(request.flow_name, "beginStoryFlow");
/// assert_eq!(request.session_id.as_deref(), Some("s1"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRequest {
    /// Registered flow name
    pub flow_name: String,
    /// Flow input
    #[serde(default)]
    pub input: serde_json::Value,
    /// Session to run against, created when absent or unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Outcome of a flow execution.
///
/// Exactly one of `result` and `error` is meaningful; `error` wins when present.
///
/// # Examples
///
/// ```
/// use taleweaver_core::FlowResponse;
/// use serde_json::json;
///
/// let ok = FlowResponse::success(json!({"progress": 0}), "s1");
/// assert!(ok.is_success());
///
/// let failed = FlowResponse::failure("Flow 'nope' not found", "s1");
/// let wire = serde_json::to_value(&failed).unwrap();
/// assert_eq!(wire, json!({"sessionId": "s1", "error": "Flow 'nope' not found"}));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResponse {
    /// Handler output, absent on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Session the flow ran against
    pub session_id: String,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FlowResponse {
    /// Successful envelope.
    pub fn success(result: serde_json::Value, session_id: impl Into<String>) -> Self {
        Self {
            result: Some(result),
            session_id: session_id.into(),
            error: None,
        }
    }

    /// Failed envelope.
    pub fn failure(error: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            result: None,
            session_id: session_id.into(),
            error: Some(error.into()),
        }
    }

    /// True when no error was recorded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
