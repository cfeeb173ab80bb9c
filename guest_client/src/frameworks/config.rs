use std::path::PathBuf;
use std::{env, fmt, time::Duration};

// Runtime settings read from the environment (after `.env`).

pub fn api_url() -> String {
    env::var("GUEST_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

// Slug (or id) of the event this client is built for.
pub fn event_id() -> String {
    env::var("EVENT_ID").unwrap_or_else(|_| "demo-event".to_string())
}

pub fn demo_mode() -> bool {
    env::var("DEMO_MODE")
        .ok()
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

// Unset uses the default file; an empty value keeps everything in memory.
pub fn store_path() -> Option<PathBuf> {
    match env::var("GUEST_STORE_PATH") {
        Ok(value) if value.trim().is_empty() => None,
        Ok(value) => Some(PathBuf::from(value)),
        Err(_) => Some(PathBuf::from(DEFAULT_STORE_FILE)),
    }
}

pub fn api_timeout() -> Duration {
    let millis = env::var("API_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(10_000);
    Duration::from_millis(millis)
}

pub fn config_cache_ttl_seconds() -> u64 {
    env::var("CONFIG_CACHE_TTL_SECS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_CONFIG_TTL_SECS)
}

pub fn push_token() -> Option<String> {
    env::var("PUSH_TOKEN").ok().filter(|v| !v.trim().is_empty())
}

pub const DEFAULT_STORE_FILE: &str = ".guest_client/store.json";
pub const DEFAULT_CONFIG_TTL_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub event_id: String,
    pub demo_mode: bool,
    pub store_path: Option<PathBuf>,
    pub api_timeout: Duration,
    pub config_cache_ttl_seconds: u64,
    pub push_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    InvalidApiUrl(String),
    MissingEventId,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::InvalidApiUrl(url) => {
                write!(f, "GUEST_API_URL must start with http:// or https:// (got {url:?})")
            }
            SettingsError::MissingEventId => write!(f, "EVENT_ID must not be empty"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            api_url: api_url(),
            event_id: event_id(),
            demo_mode: demo_mode(),
            store_path: store_path(),
            api_timeout: api_timeout(),
            config_cache_ttl_seconds: config_cache_ttl_seconds(),
            push_token: push_token(),
        }
    }

    pub fn validated(mut self) -> Result<Self, SettingsError> {
        self.event_id = self.event_id.trim().to_string();
        if self.event_id.is_empty() {
            return Err(SettingsError::MissingEventId);
        }
        let url = self.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingsError::InvalidApiUrl(self.api_url));
        }
        self.api_url = url.trim_end_matches('/').to_string();
        Ok(self)
    }
}
