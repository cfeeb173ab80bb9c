use std::fmt;
use std::sync::Arc;

use crate::domain::errors::ApiError;
use crate::domain::guest::RestoreOutcome;
use crate::frameworks::config::Settings;
use crate::interface_adapters::clients::EventApiClient;
use crate::interface_adapters::device::{StaticTokenProvider, SystemClock};
use crate::interface_adapters::state::{AppServices, SharedStore};
use crate::interface_adapters::storage::{FileStore, MemoryStore};
use crate::use_cases::config_cache::{ConfigCache, bundled_demo};
use crate::use_cases::engagement::EngagementService;
use crate::use_cases::guest_session::GuestSession;
use crate::use_cases::notifications::PushNotifications;

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    // Logs go to stderr so command output on stdout stays clean.
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

#[derive(Debug)]
pub enum BootError {
    Client(ApiError),
    BundledConfig(serde_json::Error),
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::Client(err) => write!(f, "could not build http client: {err}"),
            BootError::BundledConfig(err) => write!(f, "bundled demo config is invalid: {err}"),
        }
    }
}

impl std::error::Error for BootError {}

// Startup order: config first (cache, then network; `refresh` skips the cache),
// then the saved guest code is checked against the backend using the event id
// from the config.
pub async fn boot(settings: &Settings, refresh: bool) -> Result<AppServices, BootError> {
    let store: SharedStore = match &settings.store_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "file store configured");
            Arc::new(FileStore::new(path))
        }
        None => Arc::new(MemoryStore::new()),
    };

    let client =
        EventApiClient::new(&settings.api_url, settings.api_timeout).map_err(BootError::Client)?;
    tracing::debug!(api_url = %client.base_url, "event api client configured");

    let cache = ConfigCache {
        source: client.clone(),
        store: store.clone(),
        clock: SystemClock,
        ttl_seconds: settings.config_cache_ttl_seconds,
        demo_mode: settings.demo_mode,
        demo: bundled_demo().map_err(BootError::BundledConfig)?,
    };
    let loaded = if refresh {
        cache.reload(&settings.event_id).await
    } else {
        cache.load(&settings.event_id).await
    };
    tracing::info!(
        origin = loaded.origin.as_str(),
        title = %loaded.config.event.title,
        "event config loaded"
    );

    let event_id = if loaded.config.event_id.trim().is_empty() {
        settings.event_id.clone()
    } else {
        loaded.config.event_id.clone()
    };

    let session = GuestSession::new(client.clone(), store.clone(), event_id.clone());
    match session.restore().await {
        Ok(RestoreOutcome::Restored(guest)) => {
            tracing::info!(guest = %guest.greeting_name(), "welcome back");
        }
        Ok(RestoreOutcome::Rejected) => {
            tracing::warn!("saved personal code is no longer valid");
        }
        Ok(RestoreOutcome::Unavailable) => {
            tracing::warn!("backend unreachable; guest session not restored");
        }
        Ok(RestoreOutcome::NoSavedCode) => {}
        Err(err) => tracing::warn!(error = %err, "guest session restore failed"),
    }

    let engagement = EngagementService::new(client.clone(), event_id.clone(), &loaded.config);
    let push = PushNotifications {
        registry: client,
        tokens: StaticTokenProvider::new(settings.push_token.clone()),
        store,
    };

    Ok(AppServices {
        event_slug: settings.event_id.clone(),
        event_id,
        loaded,
        session,
        engagement,
        push,
    })
}
