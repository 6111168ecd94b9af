//! Server configuration loading.
//!
//! Reads a TOML file with serde defaults, then applies `VOXSIGN_*`
//! environment overrides.

use serde::Deserialize;
use std::fmt;
use std::net::IpAddr;
use voxsign_types::Locale;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upstream realtime provider settings.
    #[serde(default)]
    pub realtime: UpstreamConfig,
}

/// Network binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "voxsign_server=trace").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// The upstream realtime endpoint the session proxy forwards offers to.
#[derive(Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Bearer key for the upstream. Sessions are refused while unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Realtime endpoint that accepts an SDP offer and returns the answer.
    #[serde(default = "default_upstream_url")]
    pub url: String,

    /// Realtime model, sent as the `model` query parameter.
    #[serde(default = "default_model")]
    pub model: String,

    /// Voice for English sessions.
    #[serde(default = "default_voice_en")]
    pub voice_en: String,

    /// Voice for Arabic sessions.
    #[serde(default = "default_voice_ar")]
    pub voice_ar: String,

    /// Upstream request timeout in seconds. Default: 15.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            url: default_upstream_url(),
            model: default_model(),
            voice_en: default_voice_en(),
            voice_ar: default_voice_ar(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("url", &self.url)
            .field("model", &self.model)
            .field("voice_en", &self.voice_en)
            .field("voice_ar", &self.voice_ar)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl UpstreamConfig {
    /// Voice used for sessions in `locale`.
    pub fn voice_for(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.voice_en,
            Locale::Ar => &self.voice_ar,
        }
    }

    /// The configured key, treating a blank value as unset.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_upstream_url() -> String {
    "https://api.openai.com/v1/realtime".to_string()
}

fn default_model() -> String {
    "gpt-4o-realtime-preview".to_string()
}

fn default_voice_en() -> String {
    "alloy".to_string()
}

fn default_voice_ar() -> String {
    "shimmer".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults if not found.
///
/// Environment variables override file values:
/// - `VOXSIGN_HOST`, `VOXSIGN_PORT`
/// - `VOXSIGN_LOG_LEVEL`, `VOXSIGN_LOG_JSON`
/// - `VOXSIGN_REALTIME_API_KEY`, `VOXSIGN_REALTIME_URL`, `VOXSIGN_REALTIME_MODEL`
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = read_config_file(path)?;
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn read_config_file(path: Option<&str>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Ok(Config::default())
            }
            Err(e) => Err(ConfigError::FileRead(e)),
        },
        None => Ok(Config::default()),
    }
}

/// Applies overrides looked up through `var`. Unparseable values are ignored.
pub fn apply_overrides<F>(config: &mut Config, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = var("VOXSIGN_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("VOXSIGN_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(level) = var("VOXSIGN_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("VOXSIGN_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(key) = var("VOXSIGN_REALTIME_API_KEY") {
        config.realtime.api_key = Some(key);
    }
    if let Some(url) = var("VOXSIGN_REALTIME_URL") {
        config.realtime.url = url;
    }
    if let Some(model) = var("VOXSIGN_REALTIME_MODEL") {
        config.realtime.model = model;
    }
}
