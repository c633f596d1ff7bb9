//! OpenAI-compatible client against an in-process mock server.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use taleweaver_core::{ChatMessage, GenerationOptions};
use taleweaver_error::{ProviderErrorKind, TaleweaverErrorKind};
use taleweaver_interface::TextGenerator;
use taleweaver_models::{OpenAiClient, RetryPolicy, TextConfig};

async fn spawn(app: Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}/v1", addr))
}

fn client(base_url: String, api_key: Option<&str>) -> anyhow::Result<OpenAiClient> {
    let config = TextConfig::default()
        .with_base_url(base_url)
        .with_api_key(api_key.map(str::to_string))
        .with_timeout_ms(2000);
    Ok(OpenAiClient::new(config, RetryPolicy::new(3, 1))?)
}

#[derive(Clone, Default)]
struct Recorded {
    calls: Arc<AtomicUsize>,
    last_body: Arc<std::sync::Mutex<Option<Value>>>,
}

#[tokio::test]
async fn test_sends_history_and_returns_first_choice() -> anyhow::Result<()> {
    let recorded = Recorded::default();
    let app = Router::new()
        .route(
            "/v1/chat/completions",
            post(|State(rec): State<Recorded>, Json(body): Json<Value>| async move {
                rec.calls.fetch_add(1, Ordering::SeqCst);
                *rec.last_body.lock().unwrap() = Some(body);
                Json(json!({
                    "id": "cmpl-1",
                    "choices": [{"message": {"role": "assistant", "content": "A storm gathers."}}]
                }))
            }),
        )
        .with_state(recorded.clone());
    let client = client(spawn(app).await?, Some("sk-test"))?;

    let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
    let text = client
        .generate_with_history(
            &history,
            "continue",
            Some("You narrate."),
            &GenerationOptions::with_limit(2500),
        )
        .await?;

    assert_eq!(text, "A storm gathers.");
    assert_eq!(recorded.calls.load(Ordering::SeqCst), 1);
    let body = recorded.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "deepseek-r1-distill-llama-8b");
    assert_eq!(body["max_tokens"], 2500);
    let roles: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    Ok(())
}

#[tokio::test]
async fn test_retries_server_errors() -> anyhow::Result<()> {
    let recorded = Recorded::default();
    let app = Router::new()
        .route(
            "/v1/chat/completions",
            post(|State(rec): State<Recorded>| async move {
                let n = rec.calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err((StatusCode::SERVICE_UNAVAILABLE, "busy"))
                } else {
                    Ok(Json(json!({"choices": [{"message": {"content": "third time"}}]})))
                }
            }),
        )
        .with_state(recorded.clone());
    let client = client(spawn(app).await?, Some("sk-test"))?;

    let text = client.complete("go", &GenerationOptions::default()).await?;

    assert_eq!(text, "third time");
    assert_eq!(recorded.calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn test_client_errors_are_not_retried() -> anyhow::Result<()> {
    let recorded = Recorded::default();
    let app = Router::new()
        .route(
            "/v1/chat/completions",
            post(|State(rec): State<Recorded>| async move {
                rec.calls.fetch_add(1, Ordering::SeqCst);
                (StatusCode::UNAUTHORIZED, "bad key")
            }),
        )
        .with_state(recorded.clone());
    let client = client(spawn(app).await?, Some("sk-wrong"))?;

    let err = client
        .complete("go", &GenerationOptions::default())
        .await
        .unwrap_err();

    assert_eq!(recorded.calls.load(Ordering::SeqCst), 1);
    let provider = err.as_provider().expect("provider error");
    assert!(matches!(
        provider.kind,
        ProviderErrorKind::Http { status_code: 401, .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_empty_text() -> anyhow::Result<()> {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { "this is not json" }),
    );
    let client = client(spawn(app).await?, Some("sk-test"))?;

    let text = client.complete("go", &GenerationOptions::default()).await?;
    assert_eq!(text, "");
    Ok(())
}

#[tokio::test]
async fn test_missing_key_fails_on_first_use() -> anyhow::Result<()> {
    // Nothing listens here; the credential check happens before any request.
    let client = client("http://127.0.0.1:9/v1".to_string(), None)?;

    let err = client
        .complete("go", &GenerationOptions::default())
        .await
        .unwrap_err();

    match err.kind() {
        TaleweaverErrorKind::Provider(e) => assert_eq!(
            e.kind,
            ProviderErrorKind::MissingCredential("OPENAI_API_KEY".to_string())
        ),
        other => panic!("unexpected error: {}", other),
    }
    Ok(())
}
