#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use taleweaver_core::{GenerateRequest, GeneratedImage, ImageRequest};
use taleweaver_error::{ProviderError, ProviderErrorKind, TaleweaverResult};
use taleweaver_flow::FlowRegistry;
use taleweaver_interface::{ImageGenerator, TextGenerator};
use taleweaver_narrative::{StoryServices, register_story_flows};
use taleweaver_session::SessionStore;

/// Replies with queued responses in order; `Err` entries become network errors.
#[derive(Default)]
pub struct ScriptedText {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedText {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, text: impl Into<String>) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn fail(&self, message: impl Into<String>) -> &Self {
        self.replies.lock().unwrap().push_back(Err(message.into()));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> GenerateRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    async fn generate(&self, req: &GenerateRequest) -> TaleweaverResult<String> {
        self.requests.lock().unwrap().push(req.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ProviderError::new(ProviderErrorKind::Network(message)).into()),
            None => Err(ProviderError::new(ProviderErrorKind::Network("script exhausted".into())).into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

/// Returns a fixed image and records prompts.
pub struct FakeImage {
    enabled: bool,
    fail: bool,
    prompts: Mutex<Vec<ImageRequest>>,
    calls: AtomicUsize,
}

impl FakeImage {
    pub fn enabled() -> Arc<Self> {
        Arc::new(Self::with(true, false))
    }

    pub fn disabled() -> Arc<Self> {
        Arc::new(Self::with(false, false))
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self::with(true, true))
    }

    fn with(enabled: bool, fail: bool) -> Self {
        Self {
            enabled,
            fail,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> ImageRequest {
        self.prompts.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl ImageGenerator for FakeImage {
    async fn generate_image(&self, req: &ImageRequest) -> TaleweaverResult<Option<GeneratedImage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(req.clone());
        if self.fail {
            return Err(ProviderError::new(ProviderErrorKind::Timeout("job never finished".into())).into());
        }
        if !self.enabled {
            return Ok(None);
        }
        Ok(Some(GeneratedImage::png("iVBORw0KGgo=")))
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

pub struct Harness {
    pub registry: FlowRegistry,
    pub sessions: Arc<SessionStore>,
    pub text: Arc<ScriptedText>,
    pub image: Arc<FakeImage>,
}

pub fn harness_with(image: Arc<FakeImage>) -> Harness {
    let sessions = Arc::new(SessionStore::new());
    let registry = FlowRegistry::new(sessions.clone());
    let text = ScriptedText::new();
    let services = StoryServices::new(sessions.clone(), text.clone(), image.clone());
    register_story_flows(&registry, services).unwrap();
    Harness {
        registry,
        sessions,
        text,
        image,
    }
}

pub fn harness() -> Harness {
    harness_with(FakeImage::enabled())
}

pub const BEGIN_REPLY: &str = r#"<think>Three milestones feel right.</think>
```json
{
  "storyParts": ["A storm rolls in.", "The lighthouse goes dark.", "Mira climbs the stairs."],
  "primaryObjective": "Relight the lighthouse",
  "milestones": ["a", "b", "c"],
  "choices": [{"choice": "Climb faster", "rating": "GOOD"}, {"choice": "Wait", "rating": "BAD"}, "Call for help"]
}
```"#;

pub fn continue_reply(achieved: bool) -> String {
    format!(
        r#"{{"storyParts": ["Turn part"], "choices": [{{"choice": "Go on", "rating": "GOOD"}}], "rating": "GOOD", "achievedCurrentMilestone": {}}}"#,
        achieved
    )
}
