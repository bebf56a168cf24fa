use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub gemini: GeminiSettings,
    #[serde(default)]
    pub venues: VenueSettings,
    #[serde(default)]
    pub notification: NotificationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_fallback_area")]
    pub fallback_area: String,
    #[serde(default = "default_memory_cap")]
    pub memory_cap: usize,
    #[serde(default = "default_check_interval")]
    pub check_interval_minutes: u64,
    #[serde(default = "default_lookahead_hours")]
    pub lookahead_hours: u32,
    #[serde(default = "default_processed_events_file")]
    pub processed_events_file: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            fallback_area: default_fallback_area(),
            memory_cap: default_memory_cap(),
            check_interval_minutes: default_check_interval(),
            lookahead_hours: default_lookahead_hours(),
            processed_events_file: default_processed_events_file(),
        }
    }
}

fn default_fallback_area() -> String { "San Francisco".to_string() }
fn default_memory_cap() -> usize { crate::core::DEFAULT_MEMORY_CAP }
fn default_check_interval() -> u64 { 30 }
fn default_lookahead_hours() -> u32 { 24 }
fn default_processed_events_file() -> String { "processed_events.json".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            endpoint: default_gemini_endpoint(),
            model: default_gemini_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

fn default_gemini_endpoint() -> String { "https://generativelanguage.googleapis.com/v1beta".to_string() }
fn default_gemini_model() -> String { "gemini-2.5-flash".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_temperature() -> f32 { 0.2 }

#[derive(Debug, Clone, Deserialize)]
pub struct VenueSettings {
    #[serde(default = "default_search_radius_km")]
    pub search_radius_km: f64,
    /// JSON venue dataset; the built-in San Francisco set is used when unset
    #[serde(default)]
    pub dataset_path: Option<String>,
}

impl Default for VenueSettings {
    fn default() -> Self {
        Self {
            search_radius_km: default_search_radius_km(),
            dataset_path: None,
        }
    }
}

fn default_search_radius_km() -> f64 { 1.5 }

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_recipient")]
    pub recipient: String,
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            recipient: default_recipient(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_recipient() -> String { "user@example.com".to_string() }
fn default_preview_chars() -> usize { 200 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml, then config/local.toml)
    /// 3. Environment variables (prefixed with LUNZA__)
    /// 4. Well-known variables such as GEMINI_API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., LUNZA__AGENT__MEMORY_CAP -> agent.memory_cap
            .add_source(
                Environment::with_prefix("LUNZA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("LUNZA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }
}

/// Apply the unprefixed environment variables the agent has always honored
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

    let api_key = non_empty("GEMINI_API_KEY").or_else(|| non_empty("GOOGLE_API_KEY"));
    let recipient = non_empty("NOTIFICATION_EMAIL");
    let interval = non_empty("CHECK_INTERVAL_MINUTES");

    let mut builder = Config::builder().add_source(settings);

    if let Some(key) = api_key {
        builder = builder.set_override("gemini.api_key", key)?;
    }
    if let Some(email) = recipient {
        builder = builder.set_override("notification.recipient", email)?;
    }
    if let Some(minutes) = interval {
        let minutes: u64 = minutes.trim().parse().map_err(|_| {
            ConfigError::Message(format!("CHECK_INTERVAL_MINUTES is not a number: {}", minutes))
        })?;
        builder = builder.set_override("agent.check_interval_minutes", minutes)?;
    }

    builder.build()
}
