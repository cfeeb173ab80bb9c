use std::collections::BTreeMap;

use tokio::sync::Mutex;
use tracing::info;

use crate::domain::config::{EventConfig, ModuleSettings};
use crate::domain::engagement::{
    DonationStats, GuestbookEntry, Page, PaymentIntent, Photo, PhotoUpload, PlaylistSuggestion,
    SeatingSearchResult,
};
use crate::domain::errors::{ApiError, SubmitError, ValidationError};
use crate::domain::forms::{DonationForm, GuestbookForm, RsvpForm, SongSuggestionForm, required};
use crate::domain::guest::Guest;
use crate::domain::listings::PlaylistBoard;
use crate::domain::modules;
use crate::domain::ports::EngagementApi;

// Request/response services behind the RSVP, gallery, guestbook, donation,
// playlist and seating screens. Limits come from the module options of the
// loaded config.
pub struct EngagementService<A> {
    api: A,
    event_id: String,
    modules: BTreeMap<String, ModuleSettings>,
    submit_gate: Mutex<()>,
}

impl<A> EngagementService<A>
where
    A: EngagementApi,
{
    pub fn new(api: A, event_id: impl Into<String>, config: &EventConfig) -> Self {
        Self {
            api,
            event_id: event_id.into(),
            modules: config.modules.clone(),
            submit_gate: Mutex::new(()),
        }
    }

    fn module(&self, name: &str) -> Option<&ModuleSettings> {
        self.modules.get(name)
    }

    #[tracing::instrument(name = "submit_rsvp", skip_all, fields(event_id = %self.event_id))]
    pub async fn submit_rsvp(&self, form: RsvpForm) -> Result<Guest, SubmitError> {
        let max_plus_ones = self
            .module(modules::RSVP)
            .and_then(|m| m.option_u64("max_plus_ones"))
            .map(|max| u32::try_from(max).unwrap_or(u32::MAX));
        let payload = form.into_payload(max_plus_ones)?;
        let _gate = self.submit_gate.try_lock().map_err(|_| SubmitError::Busy)?;

        let guest = self.api.submit_rsvp(&self.event_id, &payload).await?;
        info!(attending = payload.attending, plus_ones = payload.plus_ones, "rsvp sent");
        Ok(guest)
    }

    pub async fn photos(&self, page: Page) -> Result<Vec<Photo>, ApiError> {
        self.api.list_photos(&self.event_id, page).await
    }

    // Uploads are allowed unless the gallery module turns them off.
    pub fn uploads_allowed(&self) -> bool {
        self.module(modules::GALLERY)
            .and_then(|m| m.option_bool("allow_upload"))
            .unwrap_or(true)
    }

    #[tracing::instrument(name = "upload_photo", skip_all, fields(event_id = %self.event_id))]
    pub async fn upload_photo(&self, upload: PhotoUpload) -> Result<Photo, SubmitError> {
        if !self.uploads_allowed() {
            return Err(ValidationError::UploadsDisabled.into());
        }
        if upload.bytes.is_empty() {
            return Err(ValidationError::EmptyFile.into());
        }
        let _gate = self.submit_gate.try_lock().map_err(|_| SubmitError::Busy)?;

        let size = upload.bytes.len();
        let photo = self.api.upload_photo(&self.event_id, upload).await?;
        info!(photo_id = %photo.id, size, "photo uploaded");
        Ok(photo)
    }

    pub async fn guestbook(&self, page: Page) -> Result<Vec<GuestbookEntry>, ApiError> {
        self.api.list_guestbook(&self.event_id, page).await
    }

    #[tracing::instrument(name = "sign_guestbook", skip_all, fields(event_id = %self.event_id))]
    pub async fn sign_guestbook(&self, form: GuestbookForm) -> Result<GuestbookEntry, SubmitError> {
        let form = form.validated()?;
        let _gate = self.submit_gate.try_lock().map_err(|_| SubmitError::Busy)?;

        Ok(self.api.post_guestbook(&self.event_id, &form).await?)
    }

    #[tracing::instrument(name = "create_donation", skip_all, fields(event_id = %self.event_id))]
    pub async fn donate(&self, form: DonationForm) -> Result<PaymentIntent, SubmitError> {
        let min_amount = self
            .module(modules::DONATION)
            .and_then(|m| m.option_f64("min_amount"));
        let form = form.validated(min_amount)?;
        let _gate = self.submit_gate.try_lock().map_err(|_| SubmitError::Busy)?;

        let intent = self.api.create_donation(&self.event_id, &form).await?;
        info!(payment_intent_id = %intent.payment_intent_id, "donation intent created");
        Ok(intent)
    }

    pub async fn donation_stats(&self) -> Result<DonationStats, ApiError> {
        self.api.donation_stats(&self.event_id).await
    }

    // Currency shown on the donation screen; defaults to EUR.
    pub fn donation_currency(&self) -> String {
        self.module(modules::DONATION)
            .and_then(|m| m.option_as::<String>("currency"))
            .unwrap_or_else(|| "EUR".to_string())
    }

    pub async fn playlist(&self) -> Result<PlaylistBoard, ApiError> {
        let suggestions = self.api.list_playlist(&self.event_id).await?;
        Ok(PlaylistBoard::new(suggestions))
    }

    #[tracing::instrument(name = "suggest_song", skip_all, fields(event_id = %self.event_id))]
    pub async fn suggest_song(
        &self,
        form: SongSuggestionForm,
    ) -> Result<PlaylistSuggestion, SubmitError> {
        let form = form.validated()?;
        let _gate = self.submit_gate.try_lock().map_err(|_| SubmitError::Busy)?;

        Ok(self.api.suggest_song(&self.event_id, &form).await?)
    }

    pub async fn find_seat(&self, name: &str) -> Result<SeatingSearchResult, SubmitError> {
        let name = required(name, "name")?;
        Ok(self.api.search_seating(&self.event_id, &name).await?)
    }
}
