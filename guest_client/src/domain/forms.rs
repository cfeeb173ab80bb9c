use crate::domain::errors::ValidationError;
use crate::domain::guest::RsvpStatus;
use serde::Serialize;
use serde_json::{Map, Value};

// Form payloads sent to the engagement endpoints. Each form validates itself
// before it is serialized; a failed validation blocks the request.

#[derive(Debug, Clone, PartialEq)]
pub struct RsvpForm {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    // None until the guest picks an answer.
    pub attending: Option<bool>,
    pub plus_one_names: Vec<String>,
    pub dietary: Option<String>,
    pub allergies: Option<String>,
    pub menu_choice: Option<String>,
    pub custom_answers: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct RsvpPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub attending: bool,
    pub plus_ones: u32,
    pub plus_one_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_choice: Option<String>,
    pub custom_answers: Map<String, Value>,
}

impl RsvpForm {
    pub fn into_payload(self, max_plus_ones: Option<u32>) -> Result<RsvpPayload, ValidationError> {
        let name = required(&self.name, "name")?;
        let attending = self.attending.ok_or(ValidationError::AttendanceUndecided)?;

        // Declining guests bring nobody.
        let plus_one_names: Vec<String> = if attending {
            self.plus_one_names
                .iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect()
        } else {
            Vec::new()
        };
        let plus_ones = plus_one_names.len() as u32;
        if let Some(max) = max_plus_ones {
            if plus_ones > max {
                return Err(ValidationError::TooManyPlusOnes { max });
            }
        }

        Ok(RsvpPayload {
            name,
            email: optional(self.email),
            phone: optional(self.phone),
            attending,
            plus_ones,
            plus_one_names,
            dietary: optional(self.dietary),
            allergies: optional(self.allergies),
            menu_choice: optional(self.menu_choice),
            custom_answers: self.custom_answers,
        })
    }
}

// One answer per sub-event on the personalized RSVP screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SubEventAnswer {
    pub slug: String,
    pub status: RsvpStatus,
    pub attendees_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubEventRsvpForm {
    pub answers: Vec<SubEventAnswer>,
    pub dietary: Option<String>,
    pub allergies: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubEventRsvpItem {
    pub sub_event_id: String,
    pub status: RsvpStatus,
    pub attendees_count: u32,
}

#[derive(Debug, Serialize)]
pub struct SubEventRsvpPayload {
    pub sub_event_rsvps: Vec<SubEventRsvpItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubEventRsvpForm {
    // Every sub-event needs an explicit answer; pending is never sent.
    pub fn into_payload(self) -> Result<SubEventRsvpPayload, ValidationError> {
        if self.answers.is_empty() {
            return Err(ValidationError::NoSubEvents);
        }

        let mut items = Vec::with_capacity(self.answers.len());
        for answer in self.answers {
            if answer.status == RsvpStatus::Pending {
                return Err(ValidationError::SubEventUndecided(answer.slug));
            }
            if answer.status == RsvpStatus::Confirmed && answer.attendees_count == 0 {
                return Err(ValidationError::InvalidAttendees(answer.slug));
            }
            items.push(SubEventRsvpItem {
                sub_event_id: answer.slug,
                status: answer.status,
                attendees_count: answer.attendees_count,
            });
        }

        Ok(SubEventRsvpPayload {
            sub_event_rsvps: items,
            dietary: optional(self.dietary),
            allergies: optional(self.allergies),
            message: optional(self.message),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestbookForm {
    pub author_name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl GuestbookForm {
    pub fn validated(self) -> Result<GuestbookForm, ValidationError> {
        Ok(GuestbookForm {
            author_name: required(&self.author_name, "author_name")?,
            message: required(&self.message, "message")?,
            photo_url: optional(self.photo_url),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationForm {
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub anonymous: bool,
    pub currency: String,
}

impl DonationForm {
    pub fn validated(self, min_amount: Option<f64>) -> Result<DonationForm, ValidationError> {
        let min = min_amount.unwrap_or(1.0).max(1.0);
        if !self.amount.is_finite() || self.amount < min {
            return Err(ValidationError::AmountTooLow { min });
        }

        let donor_name = optional(self.donor_name);
        if !self.anonymous && donor_name.is_none() {
            return Err(ValidationError::MissingField("donor_name"));
        }

        Ok(DonationForm {
            amount: self.amount,
            donor_name,
            message: optional(self.message),
            anonymous: self.anonymous,
            currency: self.currency,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongSuggestionForm {
    pub guest_name: String,
    pub song_title: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotify_url: Option<String>,
}

impl SongSuggestionForm {
    pub fn validated(self) -> Result<SongSuggestionForm, ValidationError> {
        Ok(SongSuggestionForm {
            guest_name: required(&self.guest_name, "guest_name")?,
            song_title: required(&self.song_title, "song_title")?,
            artist: required(&self.artist, "artist")?,
            spotify_url: optional(self.spotify_url),
        })
    }
}

pub fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
