use std::sync::Arc;

use crate::domain::modules::Navigation;
use crate::domain::ports::KeyValueStore;
use crate::interface_adapters::clients::EventApiClient;
use crate::interface_adapters::device::StaticTokenProvider;
use crate::use_cases::config_cache::LoadedConfig;
use crate::use_cases::engagement::EngagementService;
use crate::use_cases::guest_session::GuestSession;
use crate::use_cases::notifications::PushNotifications;

// Store picked at startup (file or memory), shared by every use case.
pub type SharedStore = Arc<dyn KeyValueStore>;

// Everything a front end needs once the client has booted.
pub struct AppServices {
    // Slug the config was requested with.
    pub event_slug: String,
    // Backend id used by the guest and engagement endpoints.
    pub event_id: String,
    pub loaded: LoadedConfig,
    pub session: GuestSession<EventApiClient, SharedStore>,
    pub engagement: EngagementService<EventApiClient>,
    pub push: PushNotifications<EventApiClient, StaticTokenProvider, SharedStore>,
}

impl AppServices {
    pub async fn navigation(&self) -> Navigation {
        Navigation::derive(&self.loaded.config, self.session.is_identified().await)
    }
}
