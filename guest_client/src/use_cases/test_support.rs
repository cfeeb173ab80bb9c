use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use crate::domain::config::EventConfig;
use crate::domain::engagement::{
    Acknowledgement, DonationStats, GuestbookEntry, Page, PaymentIntent, Photo, PhotoUpload,
    PlaylistSuggestion, SeatingSearchResult,
};
use crate::domain::errors::ApiError;
use crate::domain::forms::{
    DonationForm, GuestbookForm, RsvpPayload, SongSuggestionForm, SubEventRsvpPayload,
};
use crate::domain::guest::{Guest, GuestStatus, PersonalizedProgram, RsvpStatus, SubEvent};
use crate::domain::ports::{
    Clock, ConfigSource, EngagementApi, GuestDirectory, IdentifyMatch, KeyValueStore,
    PushRegistry, PushTokenProvider,
};

// Shared clock whose time tests can move forward.
#[derive(Clone)]
pub(crate) struct FixedClock(pub(crate) Arc<AtomicU64>);

impl FixedClock {
    pub(crate) fn at(now: u64) -> Self {
        Self(Arc::new(AtomicU64::new(now)))
    }

    pub(crate) fn advance(&self, seconds: u64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub get: bool,
    pub set: bool,
    pub remove: bool,
}

#[derive(Clone)]
pub(crate) struct RecordingStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    failures: FailureFlags,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(HashMap::new())),
            failures: FailureFlags::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn insert_test_value(&self, key: &str, value: &str) {
        let mut guard = self.values.lock().expect("store mutex poisoned");
        guard.insert(key.to_string(), value.to_string());
    }

    pub(crate) fn get_test_value(&self, key: &str) -> Option<String> {
        let guard = self.values.lock().expect("store mutex poisoned");
        guard.get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        if self.failures.get {
            return Err("get failed".to_string());
        }
        let guard = self.values.lock().expect("store mutex poisoned");
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), String> {
        if self.failures.set {
            return Err("set failed".to_string());
        }
        let mut guard = self.values.lock().expect("store mutex poisoned");
        guard.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), String> {
        if self.failures.remove {
            return Err("remove failed".to_string());
        }
        let mut guard = self.values.lock().expect("store mutex poisoned");
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}

pub(crate) fn sample_config(title: &str) -> EventConfig {
    serde_json::from_value(json!({
        "version": "1.0",
        "event_id": "5f1c7a2e-0000-4000-8000-000000000001",
        "event": { "type": "wedding", "title": title, "date": "2026-06-14T15:00:00Z" },
        "modules": {
            "rsvp": { "enabled": true, "max_plus_ones": 2 },
            "gallery": { "enabled": true, "allow_upload": true },
            "donation": { "enabled": true, "min_amount": 10 }
        }
    }))
    .expect("sample config should decode")
}

// Config source that replays one scripted result and counts calls.
#[derive(Clone)]
pub(crate) struct ScriptedSource {
    result: Arc<Mutex<Result<EventConfig, ApiError>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub(crate) fn returning(config: EventConfig) -> Self {
        Self {
            result: Arc::new(Mutex::new(Ok(config))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            result: Arc::new(Mutex::new(Err(ApiError::Network(
                "connection refused".to_string(),
            )))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn set_result(&self, result: Result<EventConfig, ApiError>) {
        *self.result.lock().expect("source mutex poisoned") = result;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigSource for ScriptedSource {
    async fn fetch_config(&self, _event_slug: &str) -> Result<EventConfig, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.lock().expect("source mutex poisoned").clone()
    }
}

pub(crate) fn guest(code: &str, name: &str) -> Guest {
    Guest {
        id: format!("guest-{code}"),
        name: name.to_string(),
        first_name: name.split_whitespace().next().map(str::to_string),
        personal_code: Some(code.to_string()),
        email: None,
        status: GuestStatus::Pending,
        invitation_group_id: None,
    }
}

pub(crate) fn program_for(guest: &Guest) -> PersonalizedProgram {
    PersonalizedProgram {
        guest_id: guest.id.clone(),
        guest_name: guest.name.clone(),
        first_name: guest.first_name.clone(),
        group_name: "Famille".to_string(),
        sub_events: vec![SubEvent {
            slug: "houppa".to_string(),
            name: "Houppa".to_string(),
            date: Some("2026-06-14".to_string()),
            start_time: Some("16:30".to_string()),
            end_time: None,
            location_name: None,
            location_address: None,
            latitude: None,
            longitude: None,
            dress_code: None,
            notes: None,
            rsvp_status: RsvpStatus::Pending,
            attendees_count: 1,
        }],
        rsvp_deadline: None,
        global_rsvp_status: "pending".to_string(),
    }
}

// Guest directory backed by an in-memory guest list.
#[derive(Clone)]
pub(crate) struct ScriptedDirectory {
    guests: Arc<Mutex<Vec<Guest>>>,
    pub(crate) offline: Arc<Mutex<bool>>,
    pub(crate) program_fails: bool,
    // When set, identify() parks until notified.
    pub(crate) identify_gate: Option<Arc<Notify>>,
    pub(crate) identify_calls: Arc<AtomicUsize>,
    pub(crate) rsvp_calls: Arc<AtomicUsize>,
}

impl ScriptedDirectory {
    pub(crate) fn with_guests(guests: Vec<Guest>) -> Self {
        Self {
            guests: Arc::new(Mutex::new(guests)),
            offline: Arc::new(Mutex::new(false)),
            program_fails: false,
            identify_gate: None,
            identify_calls: Arc::new(AtomicUsize::new(0)),
            rsvp_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        *self.offline.lock().expect("offline mutex poisoned") = offline;
    }

    pub(crate) fn remove_all_guests(&self) {
        self.guests.lock().expect("guests mutex poisoned").clear();
    }

    fn check_online(&self) -> Result<(), ApiError> {
        if *self.offline.lock().expect("offline mutex poisoned") {
            return Err(ApiError::Network("offline".to_string()));
        }
        Ok(())
    }

    fn find_by_code(&self, code: &str) -> Option<Guest> {
        let guests = self.guests.lock().expect("guests mutex poisoned");
        guests
            .iter()
            .find(|g| g.personal_code.as_deref() == Some(code))
            .cloned()
    }
}

#[async_trait]
impl GuestDirectory for ScriptedDirectory {
    async fn identify(
        &self,
        _event_id: &str,
        name: Option<&str>,
        email: Option<&str>,
        _phone: Option<&str>,
    ) -> Result<IdentifyMatch, ApiError> {
        self.identify_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.identify_gate {
            gate.notified().await;
        }
        self.check_online()?;

        let matches: Vec<Guest> = {
            let guests = self.guests.lock().expect("guests mutex poisoned");
            guests
                .iter()
                .filter(|g| {
                    name.is_none_or(|n| g.name.to_lowercase().contains(&n.to_lowercase()))
                        && email.is_none_or(|e| g.email.as_deref() == Some(e))
                })
                .cloned()
                .collect()
        };

        Ok(match matches.len() {
            0 => IdentifyMatch {
                found: false,
                personal_code: None,
                guest_name: None,
                multiple_matches: false,
                message: "not on the list".to_string(),
            },
            1 => IdentifyMatch {
                found: true,
                personal_code: matches[0].personal_code.clone(),
                guest_name: Some(matches[0].name.clone()),
                multiple_matches: false,
                message: "welcome".to_string(),
            },
            n => IdentifyMatch {
                found: false,
                personal_code: None,
                guest_name: None,
                multiple_matches: true,
                message: format!("{n} guests match"),
            },
        })
    }

    async fn guest_by_code(&self, _event_id: &str, code: &str) -> Result<Guest, ApiError> {
        self.check_online()?;
        self.find_by_code(code).ok_or(ApiError::NotFound)
    }

    async fn personalized_program(
        &self,
        _event_id: &str,
        code: &str,
    ) -> Result<PersonalizedProgram, ApiError> {
        self.check_online()?;
        if self.program_fails {
            return Err(ApiError::Upstream {
                status: 500,
                message: None,
            });
        }
        let guest = self.find_by_code(code).ok_or(ApiError::NotFound)?;
        Ok(program_for(&guest))
    }

    async fn submit_sub_event_rsvp(
        &self,
        _event_id: &str,
        _code: &str,
        _payload: &SubEventRsvpPayload,
    ) -> Result<Acknowledgement, ApiError> {
        self.rsvp_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(Acknowledgement {
            success: true,
            message: "saved".to_string(),
        })
    }
}

// Engagement API that records which endpoints were hit.
#[derive(Clone, Default)]
pub(crate) struct RecordingEngagement {
    pub(crate) calls: Arc<Mutex<Vec<&'static str>>>,
    // When set, write calls park until notified.
    pub(crate) write_gate: Option<Arc<Notify>>,
}

impl RecordingEngagement {
    fn record(&self, call: &'static str) {
        self.calls.lock().expect("calls mutex poisoned").push(call);
    }

    pub(crate) fn recorded(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    async fn park(&self) {
        if let Some(gate) = &self.write_gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl EngagementApi for RecordingEngagement {
    async fn submit_rsvp(&self, _event_id: &str, payload: &RsvpPayload) -> Result<Guest, ApiError> {
        self.record("submit_rsvp");
        self.park().await;
        Ok(guest("RSVP01", &payload.name))
    }

    async fn list_photos(&self, _event_id: &str, _page: Page) -> Result<Vec<Photo>, ApiError> {
        self.record("list_photos");
        Ok(Vec::new())
    }

    async fn upload_photo(&self, _event_id: &str, upload: PhotoUpload) -> Result<Photo, ApiError> {
        self.record("upload_photo");
        Ok(Photo {
            id: "photo-1".to_string(),
            url: format!("https://cdn.test/{}", upload.file_name),
            thumbnail_url: None,
            uploaded_by: upload.uploaded_by,
            caption: upload.caption,
            created_at: String::new(),
        })
    }

    async fn list_guestbook(
        &self,
        _event_id: &str,
        _page: Page,
    ) -> Result<Vec<GuestbookEntry>, ApiError> {
        self.record("list_guestbook");
        Ok(Vec::new())
    }

    async fn post_guestbook(
        &self,
        _event_id: &str,
        form: &GuestbookForm,
    ) -> Result<GuestbookEntry, ApiError> {
        self.record("post_guestbook");
        self.park().await;
        Ok(GuestbookEntry {
            id: "entry-1".to_string(),
            author_name: form.author_name.clone(),
            message: form.message.clone(),
            photo_url: form.photo_url.clone(),
            created_at: String::new(),
        })
    }

    async fn create_donation(
        &self,
        _event_id: &str,
        _form: &DonationForm,
    ) -> Result<PaymentIntent, ApiError> {
        self.record("create_donation");
        Ok(PaymentIntent {
            client_secret: "secret".to_string(),
            payment_intent_id: "pi_1".to_string(),
        })
    }

    async fn donation_stats(&self, _event_id: &str) -> Result<DonationStats, ApiError> {
        self.record("donation_stats");
        Ok(DonationStats {
            total_amount: 0.0,
            total_count: 0,
            currency: "EUR".to_string(),
        })
    }

    async fn suggest_song(
        &self,
        _event_id: &str,
        form: &SongSuggestionForm,
    ) -> Result<PlaylistSuggestion, ApiError> {
        self.record("suggest_song");
        Ok(PlaylistSuggestion {
            id: "song-1".to_string(),
            guest_name: form.guest_name.clone(),
            song_title: form.song_title.clone(),
            artist: Some(form.artist.clone()),
            spotify_url: form.spotify_url.clone(),
            created_at: String::new(),
            votes: 0,
        })
    }

    async fn list_playlist(&self, _event_id: &str) -> Result<Vec<PlaylistSuggestion>, ApiError> {
        self.record("list_playlist");
        Ok(Vec::new())
    }

    async fn search_seating(
        &self,
        _event_id: &str,
        name: &str,
    ) -> Result<SeatingSearchResult, ApiError> {
        self.record("search_seating");
        Ok(SeatingSearchResult {
            found: false,
            table_name: None,
            guest_name: Some(name.to_string()),
            message: "not seated yet".to_string(),
        })
    }
}

// Push registry that records subscriptions.
#[derive(Clone, Default)]
pub(crate) struct RecordingRegistry {
    pub(crate) subscriptions: Arc<Mutex<Vec<(String, String, String)>>>,
    pub(crate) unsubscriptions: Arc<Mutex<Vec<(String, String)>>>,
    pub(crate) fail: bool,
}

#[async_trait]
impl PushRegistry for RecordingRegistry {
    async fn subscribe(&self, event_id: &str, token: &str, platform: &str) -> Result<(), ApiError> {
        if self.fail {
            return Err(ApiError::Upstream {
                status: 500,
                message: Some("Failed to subscribe".to_string()),
            });
        }
        self.subscriptions
            .lock()
            .expect("subscriptions mutex poisoned")
            .push((event_id.to_string(), token.to_string(), platform.to_string()));
        Ok(())
    }

    async fn unsubscribe(&self, event_id: &str, token: &str) -> Result<(), ApiError> {
        if self.fail {
            return Err(ApiError::Network("offline".to_string()));
        }
        self.unsubscriptions
            .lock()
            .expect("unsubscriptions mutex poisoned")
            .push((event_id.to_string(), token.to_string()));
        Ok(())
    }
}

// Token provider standing in for the platform push SDK.
#[derive(Clone)]
pub(crate) struct FixedTokenProvider(pub(crate) Option<String>);

#[async_trait]
impl PushTokenProvider for FixedTokenProvider {
    async fn device_token(&self) -> Option<String> {
        self.0.clone()
    }

    fn platform(&self) -> &str {
        "ios"
    }
}
