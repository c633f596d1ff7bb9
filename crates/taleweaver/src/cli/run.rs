//! One-shot flow execution command handler.

use taleweaver::{FlowRegistry, FlowRequest};
use tracing::info;

/// Execute `flow` once and print the envelope as pretty JSON.
///
/// Returns an error when the input is not JSON or the envelope carries an
/// error, so the process exits non-zero.
pub async fn run_flow(
    registry: &FlowRegistry,
    flow: &str,
    input: &str,
    session: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let input: serde_json::Value = serde_json::from_str(input)
        .map_err(|e| format!("--input is not valid JSON: {}", e))?;

    info!(flow, session = ?session, "Running flow");
    let response = registry
        .dispatch(FlowRequest {
            flow_name: flow.to_string(),
            input,
            session_id: session.map(str::to_string),
        })
        .await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    match response.error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
