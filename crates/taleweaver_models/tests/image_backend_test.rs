//! Image strategies against in-process mock servers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use taleweaver_core::ImageRequest;
use taleweaver_error::ProviderErrorKind;
use taleweaver_interface::ImageGenerator;
use taleweaver_models::{
    DisabledImageGenerator, ImageConfig, PollingImageClient, RetryPolicy, StableDiffusionClient,
};

async fn spawn(app: Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}", addr))
}

fn request() -> anyhow::Result<ImageRequest> {
    Ok(ImageRequest::builder().prompt("a quiet harbor").build()?)
}

fn config(base_url: String, max_poll_attempts: u32) -> ImageConfig {
    ImageConfig::default()
        .with_base_url(base_url)
        .with_poll_interval_ms(1)
        .with_max_poll_attempts(max_poll_attempts)
        .with_timeout_ms(2000)
}

#[tokio::test]
async fn test_disabled_returns_nothing() -> anyhow::Result<()> {
    let image = DisabledImageGenerator.generate_image(&request()?).await?;
    assert!(image.is_none());
    Ok(())
}

#[tokio::test]
async fn test_sync_backend_returns_first_image() -> anyhow::Result<()> {
    let app = Router::new()
        .route(
            "/sdapi/v1/txt2img",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["width"], 512);
                Json(json!({"images": ["AAAA", "BBBB"]}))
            }),
        )
        .route("/sdapi/v1/options", get(|| async { Json(json!({})) }))
        .route(
            "/sdapi/v1/sd-models",
            get(|| async { Json(json!([{"title": "v1-5 [abc]", "model_name": "v1-5"}])) }),
        );
    let base = spawn(app).await?;
    let client = StableDiffusionClient::new(config(base, 1), RetryPolicy::new(2, 1))?;

    let image = client.generate_image(&request()?).await?.expect("image");
    assert_eq!(image.data_uri(), "data:image/png;base64,AAAA");
    assert!(client.health().await);
    let models = client.models().await?;
    assert_eq!(models[0].model_name, "v1-5");
    Ok(())
}

#[derive(Clone, Default)]
struct Job {
    polls: Arc<AtomicUsize>,
    ready_after: usize,
    unavailable_on: Option<usize>,
}

fn job_app(job: Job, fail: bool) -> Router {
    Router::new()
        .route("/jobs", post(|| async { Json(json!({"id": "job-7"})) }))
        .route(
            "/jobs/:id",
            get(move |State(job): State<Job>, Path(id): Path<String>| async move {
                assert_eq!(id, "job-7");
                let n = job.polls.fetch_add(1, Ordering::SeqCst) + 1;
                if job.unavailable_on == Some(n) {
                    return (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response();
                }
                let status = if fail {
                    "failed"
                } else if n >= job.ready_after {
                    "succeeded"
                } else {
                    "running"
                };
                Json(json!({"status": status})).into_response()
            }),
        )
        .route(
            "/jobs/:id/image",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![1u8, 2, 3]).into_response() }),
        )
        .with_state(job)
}

#[tokio::test]
async fn test_poll_backend_submits_polls_and_fetches() -> anyhow::Result<()> {
    let job = Job {
        polls: Arc::default(),
        ready_after: 3,
        ..Job::default()
    };
    let base = spawn(job_app(job.clone(), false)).await?;
    let client = PollingImageClient::new(config(base, 10), RetryPolicy::new(2, 1))?;

    let image = client.generate_image(&request()?).await?.expect("image");

    assert_eq!(job.polls.load(Ordering::SeqCst), 3);
    assert_eq!(image.data_uri(), "data:image/png;base64,AQID");
    Ok(())
}

#[tokio::test]
async fn test_poll_backend_times_out() -> anyhow::Result<()> {
    let job = Job {
        polls: Arc::default(),
        ready_after: usize::MAX,
        ..Job::default()
    };
    let base = spawn(job_app(job.clone(), false)).await?;
    let client = PollingImageClient::new(config(base, 4), RetryPolicy::new(2, 1))?;

    let err = client.generate_image(&request()?).await.unwrap_err();

    assert_eq!(job.polls.load(Ordering::SeqCst), 4);
    let provider = err.as_provider().expect("provider error");
    assert!(matches!(provider.kind, ProviderErrorKind::Timeout(_)));
    Ok(())
}

#[tokio::test]
async fn test_failed_job_is_image_unavailable() -> anyhow::Result<()> {
    let base = spawn(job_app(Job::default(), true)).await?;
    let client = PollingImageClient::new(config(base, 4), RetryPolicy::new(2, 1))?;

    let err = client.generate_image(&request()?).await.unwrap_err();

    let provider = err.as_provider().expect("provider error");
    assert!(matches!(provider.kind, ProviderErrorKind::ImageUnavailable(_)));
    Ok(())
}

#[tokio::test]
async fn test_transient_status_error_keeps_polling() -> anyhow::Result<()> {
    let job = Job {
        polls: Arc::default(),
        ready_after: 3,
        unavailable_on: Some(2),
    };
    let base = spawn(job_app(job.clone(), false)).await?;
    let client = PollingImageClient::new(config(base, 10), RetryPolicy::new(2, 1))?;

    let image = client.generate_image(&request()?).await?.expect("image");

    assert_eq!(job.polls.load(Ordering::SeqCst), 3);
    assert_eq!(image.data_uri(), "data:image/png;base64,AQID");
    Ok(())
}

#[tokio::test]
async fn test_transient_status_errors_still_bounded() -> anyhow::Result<()> {
    let job = Job {
        polls: Arc::default(),
        ready_after: usize::MAX,
        unavailable_on: Some(1),
    };
    let base = spawn(job_app(job.clone(), false)).await?;
    let client = PollingImageClient::new(config(base, 3), RetryPolicy::new(2, 1))?;

    let err = client.generate_image(&request()?).await.unwrap_err();

    assert_eq!(job.polls.load(Ordering::SeqCst), 3);
    let provider = err.as_provider().expect("provider error");
    assert!(matches!(provider.kind, ProviderErrorKind::Timeout(_)));
    Ok(())
}
