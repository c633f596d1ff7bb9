//! Layered configuration.

use crate::{ImageBackendKind, RetryPolicy};
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use taleweaver_error::{ConfigError, TaleweaverError, TaleweaverResult};
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../taleweaver.toml");

/// Environment variables honored on top of `TALEWEAVER__*`, with the key each one sets.
pub const WELL_KNOWN_ENV: &[(&str, &str)] = &[
    ("OPENAI_API_KEY", "text.api_key"),
    ("OPENAI_BASE_URL", "text.base_url"),
    ("OPENAI_TIMEOUT", "text.timeout_ms"),
    ("OPENAI_MODEL", "text.model"),
    ("STABLE_DIFFUSION_URL", "image.base_url"),
    ("STABLE_DIFFUSION_TIMEOUT", "image.timeout_ms"),
    ("IMAGE_BACKEND", "image.backend"),
];

/// Text generation settings.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct TextConfig {
    /// Bearer credential, checked on first use
    #[serde(default)]
    api_key: Option<String>,
    /// OpenAI-compatible API root
    #[serde(default = "default_text_base_url")]
    base_url: String,
    /// Default model
    #[serde(default = "default_model")]
    model: String,
    /// Per-request timeout
    #[serde(default = "default_text_timeout_ms")]
    timeout_ms: u64,
    /// Default output ceiling
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    temperature: f32,
    /// Overrides the top-level retry policy
    #[serde(default)]
    retry: Option<RetryPolicy>,
}

fn default_text_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "deepseek-r1-distill-llama-8b".to_string()
}

fn default_text_timeout_ms() -> u64 {
    120_000
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_text_base_url(),
            model: default_model(),
            timeout_ms: default_text_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            retry: None,
        }
    }
}

/// Image generation settings.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct ImageConfig {
    /// Which strategy to use
    #[serde(default)]
    backend: ImageBackendKind,
    /// Backend root URL
    #[serde(default = "default_image_base_url")]
    base_url: String,
    /// Per-request timeout
    #[serde(default = "default_image_timeout_ms")]
    timeout_ms: u64,
    /// Wait between job status polls
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
    /// Polls before giving up
    #[serde(default = "default_max_poll_attempts")]
    max_poll_attempts: u32,
    /// Overrides the top-level retry policy
    #[serde(default)]
    retry: Option<RetryPolicy>,
}

fn default_image_base_url() -> String {
    "http://localhost:7860".to_string()
}

fn default_image_timeout_ms() -> u64 {
    60_000
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_poll_attempts() -> u32 {
    60
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            backend: ImageBackendKind::default(),
            base_url: default_image_base_url(),
            timeout_ms: default_image_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            retry: None,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    host: String,
    /// Bind port
    #[serde(default = "default_port")]
    port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    level: String,
    /// Emit JSON lines
    #[serde(default)]
    json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

/// Complete Taleweaver configuration.
///
/// # Examples
///
/// ```
/// use taleweaver_models::{ImageBackendKind, TaleweaverConfig};
///
/// let config = TaleweaverConfig::from_toml_str(
///     r#"
///     [text]
///     model = "llama-3"
///
///     [image]
///     backend = "poll"
///     "#,
/// ).unwrap();
///
/// assert_eq!(config.text().model(), "llama-3");
/// assert_eq!(*config.image().backend(), ImageBackendKind::Poll);
/// // Untouched values keep their bundled defaults
/// assert_eq!(*config.text().timeout_ms(), 120_000);
/// assert_eq!(*config.server().port(), 3000);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct TaleweaverConfig {
    /// Text generation
    #[serde(default)]
    text: TextConfig,
    /// Image generation
    #[serde(default)]
    image: ImageConfig,
    /// Shared retry policy
    #[serde(default)]
    retry: RetryPolicy,
    /// HTTP listener
    #[serde(default)]
    server: ServerConfig,
    /// Logging
    #[serde(default)]
    logging: LoggingConfig,
}

impl TaleweaverConfig {
    /// Load configuration with precedence (later wins):
    ///
    /// 1. Bundled defaults (taleweaver.toml shipped with the crate)
    /// 2. `~/.config/taleweaver/taleweaver.toml`
    /// 3. `./taleweaver.toml`, or `path` when given
    /// 4. `TALEWEAVER__SECTION__KEY` environment variables
    /// 5. [`WELL_KNOWN_ENV`] variables
    ///
    /// Files are optional, except an explicit `path`, which must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or the merged values do
    /// not deserialize.
    #[instrument]
    pub fn load(path: Option<&Path>) -> TaleweaverResult<Self> {
        debug!("Loading configuration");

        let mut builder = Self::defaults();

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/taleweaver/taleweaver.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("taleweaver").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("TALEWEAVER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder = apply_well_known_env(builder, |name| std::env::var(name).ok())?;

        Self::finish(builder)
    }

    /// Bundled defaults overlaid with one TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if `toml` is malformed or holds values of the wrong type.
    pub fn from_toml_str(toml: &str) -> TaleweaverResult<Self> {
        let builder = Self::defaults().add_source(File::from_str(toml, FileFormat::Toml));
        Self::finish(builder)
    }

    /// Bundled defaults overlaid with variables from `lookup`, resolved the
    /// way [`WELL_KNOWN_ENV`] is resolved from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value of the wrong type.
    pub fn from_env_lookup(lookup: impl Fn(&str) -> Option<String>) -> TaleweaverResult<Self> {
        let builder = apply_well_known_env(Self::defaults(), lookup)?;
        Self::finish(builder)
    }

    /// Retry policy for text generation.
    pub fn text_retry(&self) -> RetryPolicy {
        self.text.retry.unwrap_or(self.retry)
    }

    /// Retry policy for image generation.
    pub fn image_retry(&self) -> RetryPolicy {
        self.image.retry.unwrap_or(self.retry)
    }

    fn defaults() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> TaleweaverResult<Self> {
        builder
            .build()
            .map_err(|e| {
                TaleweaverError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                TaleweaverError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }
}

fn apply_well_known_env(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> TaleweaverResult<ConfigBuilder<DefaultState>> {
    for (var, key) in WELL_KNOWN_ENV {
        let value = lookup(var).filter(|v| !v.trim().is_empty());
        if value.is_some() {
            debug!(var, key, "Applying environment override");
        }
        builder = builder.set_override_option(*key, value).map_err(|e| {
            TaleweaverError::from(ConfigError::new(format!(
                "Invalid value for {}: {}",
                var, e
            )))
        })?;
    }
    Ok(builder)
}
