use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::config::EventConfig;
use crate::domain::engagement::{
    Acknowledgement, DonationStats, GuestbookEntry, Page, PaymentIntent, Photo, PhotoUpload,
    PlaylistSuggestion, SeatingSearchResult,
};
use crate::domain::errors::ApiError;
use crate::domain::forms::{
    DonationForm, GuestbookForm, RsvpPayload, SongSuggestionForm, SubEventRsvpPayload,
};
use crate::domain::guest::{Guest, PersonalizedProgram};

// Use cases depend on these traits, not on the concrete HTTP client.

// Source of the event configuration document.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch_config(&self, event_slug: &str) -> Result<EventConfig, ApiError>;
}

// Raw answer of the identify endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifyMatch {
    pub found: bool,
    pub personal_code: Option<String>,
    pub guest_name: Option<String>,
    pub multiple_matches: bool,
    pub message: String,
}

#[async_trait]
pub trait GuestDirectory: Send + Sync {
    async fn identify(
        &self,
        event_id: &str,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<IdentifyMatch, ApiError>;
    async fn guest_by_code(&self, event_id: &str, code: &str) -> Result<Guest, ApiError>;
    async fn personalized_program(
        &self,
        event_id: &str,
        code: &str,
    ) -> Result<PersonalizedProgram, ApiError>;
    async fn submit_sub_event_rsvp(
        &self,
        event_id: &str,
        code: &str,
        payload: &SubEventRsvpPayload,
    ) -> Result<Acknowledgement, ApiError>;
}

#[async_trait]
pub trait EngagementApi: Send + Sync {
    async fn submit_rsvp(&self, event_id: &str, payload: &RsvpPayload) -> Result<Guest, ApiError>;
    async fn list_photos(&self, event_id: &str, page: Page) -> Result<Vec<Photo>, ApiError>;
    async fn upload_photo(&self, event_id: &str, upload: PhotoUpload) -> Result<Photo, ApiError>;
    async fn list_guestbook(
        &self,
        event_id: &str,
        page: Page,
    ) -> Result<Vec<GuestbookEntry>, ApiError>;
    async fn post_guestbook(
        &self,
        event_id: &str,
        form: &GuestbookForm,
    ) -> Result<GuestbookEntry, ApiError>;
    async fn create_donation(
        &self,
        event_id: &str,
        form: &DonationForm,
    ) -> Result<PaymentIntent, ApiError>;
    async fn donation_stats(&self, event_id: &str) -> Result<DonationStats, ApiError>;
    async fn suggest_song(
        &self,
        event_id: &str,
        form: &SongSuggestionForm,
    ) -> Result<PlaylistSuggestion, ApiError>;
    async fn list_playlist(&self, event_id: &str) -> Result<Vec<PlaylistSuggestion>, ApiError>;
    async fn search_seating(
        &self,
        event_id: &str,
        name: &str,
    ) -> Result<SeatingSearchResult, ApiError>;
}

// Server side of push notifications: topic subscription per event.
#[async_trait]
pub trait PushRegistry: Send + Sync {
    async fn subscribe(&self, event_id: &str, token: &str, platform: &str) -> Result<(), ApiError>;
    async fn unsubscribe(&self, event_id: &str, token: &str) -> Result<(), ApiError>;
}

// Device side of push notifications; backed by the platform SDK.
#[async_trait]
pub trait PushTokenProvider: Send + Sync {
    // None when the device cannot receive pushes or permission was refused.
    async fn device_token(&self) -> Option<String>;
    fn platform(&self) -> &str;
}

// Port for device-local key/value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, String>;
    async fn set(&self, key: &str, value: String) -> Result<(), String>;
    // Removes every key in one write.
    async fn remove_many(&self, keys: &[&str]) -> Result<(), String>;
}

// Lets one store picked at startup back several use cases.
#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), String> {
        (**self).set(key, value).await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), String> {
        (**self).remove_many(keys).await
    }
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}
