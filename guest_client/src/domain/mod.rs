pub mod config;
pub mod countdown;
pub mod engagement;
pub mod errors;
pub mod forms;
pub mod guest;
pub mod listings;
pub mod modules;
pub mod ports;

// Keys persisted on the device.
pub mod keys {
    pub const EVENT_CONFIG: &str = "event_config";
    pub const PERSONAL_CODE: &str = "personal_code";
    pub const GUEST_NAME: &str = "guest_name";
    pub const GUEST_FIRST_NAME: &str = "guest_first_name";
    pub const PUSH_TOKEN: &str = "push_token";
    pub const EVENT_SUBSCRIPTION: &str = "event_subscription";

    // Everything logout must forget.
    pub const SESSION: [&str; 3] = [PERSONAL_CODE, GUEST_NAME, GUEST_FIRST_NAME];
}

// Re-export the domain boundary types and ports.
pub use config::EventConfig;
pub use errors::{ApiError, SessionError, SubmitError, ValidationError};
pub use guest::{
    Guest, GuestStatus, IdentifyOutcome, IdentifyQuery, PersonalizedProgram, RestoreOutcome,
};
pub use ports::{
    Clock, ConfigSource, EngagementApi, GuestDirectory, KeyValueStore, PushRegistry,
    PushTokenProvider,
};
