use serde_json::{Value, json};
use std::sync::Arc;
use taleweaver::{
    Flow, FlowRegistry, FlowSchema, FlowResponse, HealthResponse, SessionStore, create_router,
    handler_fn,
};
use tokio::net::TcpListener;

async fn spawn_app() -> anyhow::Result<(String, Arc<FlowRegistry>)> {
    let registry = Arc::new(FlowRegistry::new(Arc::new(SessionStore::new())));
    registry.register(Flow::new(
        "echo",
        handler_fn(|input, ctx| async move {
            Ok(json!({"input": input, "sessionId": ctx.session_id()}))
        }),
    ));
    registry.register(
        Flow::new("strict", handler_fn(|input, _ctx| async move { Ok(input) })).with_input_schema(
            FlowSchema::new(json!({
                "type": "object",
                "required": ["story"],
                "properties": {"story": {"type": "string"}}
            }))?,
        ),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = format!("http://{}", listener.local_addr()?);
    let app = create_router(registry.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((address, registry))
}

#[tokio::test]
async fn test_health_lists_flows() -> anyhow::Result<()> {
    let (address, _) = spawn_app().await?;

    let health: HealthResponse = reqwest::get(format!("{address}/health")).await?.json().await?;

    assert_eq!(health.status, "healthy");
    assert_eq!(health.flows, vec!["echo", "strict"]);
    assert!(chrono::DateTime::parse_from_rfc3339(&health.timestamp).is_ok());
    Ok(())
}

#[tokio::test]
async fn test_post_runs_flow_with_body_session() -> anyhow::Result<()> {
    let (address, registry) = spawn_app().await?;

    let response: FlowResponse = reqwest::Client::new()
        .post(format!("{address}/echo"))
        .json(&json!({"input": {"hello": "world"}, "sessionId": "abc"}))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(response.session_id, "abc");
    assert_eq!(
        response.result,
        Some(json!({"input": {"hello": "world"}, "sessionId": "abc"}))
    );
    assert!(registry.sessions().contains("abc")?);
    Ok(())
}

#[tokio::test]
async fn test_input_session_id_is_used_when_body_has_none() -> anyhow::Result<()> {
    let (address, _) = spawn_app().await?;

    let response: FlowResponse = reqwest::Client::new()
        .post(format!("{address}/echo"))
        .json(&json!({"input": {"sessionId": "inner"}}))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(response.session_id, "inner");
    Ok(())
}

#[tokio::test]
async fn test_errors_come_back_in_the_envelope() -> anyhow::Result<()> {
    let (address, _) = spawn_app().await?;
    let client = reqwest::Client::new();

    let unknown = client
        .post(format!("{address}/noSuchFlow"))
        .json(&json!({"input": {}}))
        .send()
        .await?;
    assert_eq!(unknown.status(), reqwest::StatusCode::OK);
    let unknown: FlowResponse = unknown.json().await?;
    assert!(unknown.error.unwrap().contains("noSuchFlow"));

    let invalid: Value = client
        .post(format!("{address}/strict"))
        .json(&json!({"input": {"story": 3}}))
        .send()
        .await?
        .json()
        .await?;
    assert!(invalid.get("result").is_none());
    assert!(invalid["error"].as_str().unwrap().contains("strict"));

    let malformed: FlowResponse = client
        .post(format!("{address}/echo"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?
        .json()
        .await?;
    assert!(malformed.error.is_some());
    Ok(())
}
