use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

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
use crate::domain::ports::{
    ConfigSource, EngagementApi, GuestDirectory, IdentifyMatch, PushRegistry,
};
use crate::interface_adapters::protocol::{
    ErrorResponse, IdentifyRequest, IdentifyResponse, SubscribeRequest,
};

// Thin wrapper around reqwest for the event backend. One client serves every
// remote port.
#[derive(Clone)]
pub struct EventApiClient {
    http: Client,
    pub base_url: String,
}

impl EventApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn url_with_query(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        Url::parse_with_params(&self.url(path), query)
            .map_err(|err| ApiError::Network(format!("invalid url: {err}")))
    }

    // Send, keep upstream status/detail on failure, decode the body on success.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let res = req.send().await.map_err(transport_error)?;
        let status = res.status();

        if !status.is_success() {
            return Err(upstream_error(res).await);
        }

        res.json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    // Same as send() for endpoints whose success body is irrelevant.
    async fn send_discarding(&self, req: RequestBuilder) -> Result<(), ApiError> {
        let res = req.send().await.map_err(transport_error)?;
        if !res.status().is_success() {
            return Err(upstream_error(res).await);
        }
        Ok(())
    }

    fn page_query(page: Page) -> [(&'static str, String); 3] {
        [
            ("skip", page.skip.to_string()),
            ("limit", page.limit.to_string()),
            ("approved_only", "true".to_string()),
        ]
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Network(format!("request timed out: {err}"))
    } else {
        ApiError::Network(err.to_string())
    }
}

async fn upstream_error(res: reqwest::Response) -> ApiError {
    let status = res.status();
    if status == StatusCode::NOT_FOUND {
        return ApiError::NotFound;
    }
    let message = res
        .json::<ErrorResponse>()
        .await
        .ok()
        .map(|payload| payload.message());
    ApiError::Upstream {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ConfigSource for EventApiClient {
    async fn fetch_config(&self, event_slug: &str) -> Result<EventConfig, ApiError> {
        let url = self.url(&format!("/api/events/slug/{event_slug}/config"));
        self.send(self.http.get(url)).await
    }
}

#[async_trait]
impl GuestDirectory for EventApiClient {
    async fn identify(
        &self,
        event_id: &str,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<IdentifyMatch, ApiError> {
        let url = self.url(&format!("/api/events/{event_id}/guests/identify"));
        let body = IdentifyRequest {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        };
        let res: IdentifyResponse = self.send(self.http.post(url).json(&body)).await?;
        Ok(res.into())
    }

    async fn guest_by_code(&self, event_id: &str, code: &str) -> Result<Guest, ApiError> {
        let url = self.url(&format!("/api/events/{event_id}/guests/code/{code}"));
        self.send(self.http.get(url)).await
    }

    async fn personalized_program(
        &self,
        event_id: &str,
        code: &str,
    ) -> Result<PersonalizedProgram, ApiError> {
        let url = self.url(&format!("/api/events/{event_id}/guests/{code}/program"));
        self.send(self.http.get(url)).await
    }

    async fn submit_sub_event_rsvp(
        &self,
        event_id: &str,
        code: &str,
        payload: &SubEventRsvpPayload,
    ) -> Result<Acknowledgement, ApiError> {
        let url = self.url(&format!("/api/events/{event_id}/guests/{code}/rsvp"));
        self.send(self.http.post(url).json(payload)).await
    }
}

#[async_trait]
impl EngagementApi for EventApiClient {
    async fn submit_rsvp(&self, event_id: &str, payload: &RsvpPayload) -> Result<Guest, ApiError> {
        let url = self.url(&format!("/api/events/{event_id}/rsvp"));
        self.send(self.http.post(url).json(payload)).await
    }

    async fn list_photos(&self, event_id: &str, page: Page) -> Result<Vec<Photo>, ApiError> {
        let url = self.url_with_query(
            &format!("/api/events/{event_id}/photos"),
            &Self::page_query(page),
        )?;
        self.send(self.http.get(url)).await
    }

    async fn upload_photo(&self, event_id: &str, upload: PhotoUpload) -> Result<Photo, ApiError> {
        let url = self.url(&format!("/api/events/{event_id}/photos"));
        let file = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.mime_type)
            .map_err(|err| ApiError::Network(format!("invalid mime type: {err}")))?;

        let mut form = Form::new().part("file", file);
        if let Some(uploaded_by) = upload.uploaded_by {
            form = form.text("uploaded_by", uploaded_by);
        }
        if let Some(caption) = upload.caption {
            form = form.text("caption", caption);
        }

        self.send(self.http.post(url).multipart(form)).await
    }

    async fn list_guestbook(
        &self,
        event_id: &str,
        page: Page,
    ) -> Result<Vec<GuestbookEntry>, ApiError> {
        let url = self.url_with_query(
            &format!("/api/events/{event_id}/guestbook"),
            &Self::page_query(page),
        )?;
        self.send(self.http.get(url)).await
    }

    async fn post_guestbook(
        &self,
        event_id: &str,
        form: &GuestbookForm,
    ) -> Result<GuestbookEntry, ApiError> {
        let url = self.url(&format!("/api/events/{event_id}/guestbook"));
        self.send(self.http.post(url).json(form)).await
    }

    async fn create_donation(
        &self,
        event_id: &str,
        form: &DonationForm,
    ) -> Result<PaymentIntent, ApiError> {
        let url = self.url(&format!("/api/events/{event_id}/donations"));
        self.send(self.http.post(url).json(form)).await
    }

    async fn donation_stats(&self, event_id: &str) -> Result<DonationStats, ApiError> {
        let url = self.url(&format!("/api/events/{event_id}/donations/stats"));
        self.send(self.http.get(url)).await
    }

    async fn suggest_song(
        &self,
        event_id: &str,
        form: &SongSuggestionForm,
    ) -> Result<PlaylistSuggestion, ApiError> {
        let url = self.url(&format!("/api/events/{event_id}/playlist"));
        self.send(self.http.post(url).json(form)).await
    }

    async fn list_playlist(&self, event_id: &str) -> Result<Vec<PlaylistSuggestion>, ApiError> {
        let url = self.url(&format!("/api/events/{event_id}/playlist"));
        self.send(self.http.get(url)).await
    }

    async fn search_seating(
        &self,
        event_id: &str,
        name: &str,
    ) -> Result<SeatingSearchResult, ApiError> {
        let url = self.url_with_query(
            &format!("/api/events/{event_id}/seating"),
            &[("name", name.to_string())],
        )?;
        self.send(self.http.get(url)).await
    }
}

#[async_trait]
impl PushRegistry for EventApiClient {
    async fn subscribe(&self, event_id: &str, token: &str, platform: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/events/subscribe/{event_id}"));
        let body = SubscribeRequest {
            token: token.to_string(),
            platform: Some(platform.to_string()),
        };
        self.send_discarding(self.http.post(url).json(&body)).await
    }

    async fn unsubscribe(&self, event_id: &str, token: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/events/unsubscribe/{event_id}"));
        let body = SubscribeRequest {
            token: token.to_string(),
            platform: None,
        };
        self.send_discarding(self.http.post(url).json(&body)).await
    }
}
