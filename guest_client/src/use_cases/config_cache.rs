use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::config::EventConfig;
use crate::domain::keys;
use crate::domain::ports::{Clock, ConfigSource, KeyValueStore};

const BUNDLED_DEMO: &str = include_str!("../../assets/demo-event.json");

// Demo document shipped inside the binary.
pub fn bundled_demo() -> Result<EventConfig, serde_json::Error> {
    serde_json::from_str(BUNDLED_DEMO)
}

// Where a loaded config came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    Demo,
    Cache,
    Remote,
    StaleCache,
    Bundled,
}

impl ConfigOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigOrigin::Demo => "demo",
            ConfigOrigin::Cache => "cache",
            ConfigOrigin::Remote => "remote",
            ConfigOrigin::StaleCache => "stale_cache",
            ConfigOrigin::Bundled => "bundled",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: EventConfig,
    pub origin: ConfigOrigin,
}

// Value and timestamp live in one entry so they are always written together.
#[derive(Debug, Serialize, Deserialize)]
struct CachedConfig {
    event_id: String,
    fetched_at: u64,
    config: EventConfig,
}

// Config loader with TTL cache and stale/bundled fallback.
pub struct ConfigCache<F, S, C> {
    pub source: F,
    pub store: S,
    pub clock: C,
    pub ttl_seconds: u64,
    pub demo_mode: bool,
    pub demo: EventConfig,
}

impl<F, S, C> ConfigCache<F, S, C>
where
    F: ConfigSource,
    S: KeyValueStore,
    C: Clock,
{
    // Never fails; the worst case is the bundled demo document.
    #[tracing::instrument(name = "load_config", skip(self))]
    pub async fn load(&self, event_id: &str) -> LoadedConfig {
        if self.demo_mode {
            return self.load_demo(event_id).await;
        }

        let cached = self.read_cache(event_id).await;
        if let Some(entry) = &cached {
            if self.is_fresh(entry) {
                return LoadedConfig {
                    config: entry.config.clone(),
                    origin: ConfigOrigin::Cache,
                };
            }
        }

        self.fetch_or_fallback(event_id, cached).await
    }

    // Skips the freshness check; fallbacks still apply.
    #[tracing::instrument(name = "reload_config", skip(self))]
    pub async fn reload(&self, event_id: &str) -> LoadedConfig {
        if self.demo_mode {
            return self.load_demo(event_id).await;
        }

        let cached = self.read_cache(event_id).await;
        self.fetch_or_fallback(event_id, cached).await
    }

    async fn load_demo(&self, event_id: &str) -> LoadedConfig {
        self.write_cache(event_id, &self.demo).await;
        LoadedConfig {
            config: self.demo.clone(),
            origin: ConfigOrigin::Demo,
        }
    }

    async fn fetch_or_fallback(
        &self,
        event_id: &str,
        cached: Option<CachedConfig>,
    ) -> LoadedConfig {
        match self.source.fetch_config(event_id).await {
            Ok(config) => {
                self.write_cache(event_id, &config).await;
                info!(version = %config.version, "event config fetched");
                LoadedConfig {
                    config,
                    origin: ConfigOrigin::Remote,
                }
            }
            Err(err) => {
                warn!(error = %err, "event config fetch failed");
                match cached {
                    Some(entry) => LoadedConfig {
                        config: entry.config,
                        origin: ConfigOrigin::StaleCache,
                    },
                    None => LoadedConfig {
                        config: self.demo.clone(),
                        origin: ConfigOrigin::Bundled,
                    },
                }
            }
        }
    }

    // A future timestamp means the clock moved; treat the entry as stale.
    fn is_fresh(&self, entry: &CachedConfig) -> bool {
        let now = self.clock.now_epoch_seconds();
        now >= entry.fetched_at && now - entry.fetched_at < self.ttl_seconds
    }

    async fn read_cache(&self, event_id: &str) -> Option<CachedConfig> {
        let raw = match self.store.get(keys::EVENT_CONFIG).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, "config cache read failed");
                return None;
            }
        };

        let entry: CachedConfig = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "config cache entry is unreadable");
                return None;
            }
        };

        (entry.event_id == event_id).then_some(entry)
    }

    async fn write_cache(&self, event_id: &str, config: &EventConfig) {
        let entry = CachedConfig {
            event_id: event_id.to_string(),
            fetched_at: self.clock.now_epoch_seconds(),
            config: config.clone(),
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "config cache entry could not be encoded");
                return;
            }
        };
        if let Err(err) = self.store.set(keys::EVENT_CONFIG, raw).await {
            warn!(error = %err, "config cache write failed");
        }
    }
}
