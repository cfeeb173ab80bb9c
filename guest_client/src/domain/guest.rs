use serde::{Deserialize, Serialize};

// Guest record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    // Missing until the backend assigns one on first identification.
    #[serde(default)]
    pub personal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub status: GuestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_group_id: Option<String>,
}

impl Guest {
    // Name shown in greetings: first name when known, full name otherwise.
    pub fn greeting_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    #[default]
    Pending,
    Confirmed,
    Declined,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Pending => "pending",
            RsvpStatus::Confirmed => "confirmed",
            RsvpStatus::Declined => "declined",
        }
    }
}

// Overall answer of a guest. `Partial` means some sub-events were accepted and
// others declined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestStatus {
    #[default]
    Pending,
    Confirmed,
    Declined,
    Partial,
    #[serde(other)]
    Unknown,
}

impl GuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestStatus::Pending => "pending",
            GuestStatus::Confirmed => "confirmed",
            GuestStatus::Declined => "declined",
            GuestStatus::Partial => "partial",
            GuestStatus::Unknown => "unknown",
        }
    }
}

// Program of the sub-events a guest is invited to, in backend order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedProgram {
    pub guest_id: String,
    pub guest_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub sub_events: Vec<SubEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsvp_deadline: Option<String>,
    // pending, confirmed, declined or partial.
    #[serde(default = "default_global_status")]
    pub global_rsvp_status: String,
}

fn default_global_status() -> String {
    "pending".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubEvent {
    pub slug: String,
    pub name: String,
    // Day as "YYYY-MM-DD".
    #[serde(default)]
    pub date: Option<String>,
    // Wall-clock "HH:MM".
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub location_address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub dress_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rsvp_status: RsvpStatus,
    #[serde(default = "default_attendees")]
    pub attendees_count: u32,
}

fn default_attendees() -> u32 {
    1
}

// How a guest tries to identify themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifyQuery {
    Details {
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    },
    Code(String),
}

impl IdentifyQuery {
    pub fn by_name(name: impl Into<String>) -> Self {
        IdentifyQuery::Details {
            name: Some(name.into()),
            email: None,
            phone: None,
        }
    }

    pub fn by_code(code: impl Into<String>) -> Self {
        IdentifyQuery::Code(code.into())
    }

    // Blank fields are dropped; an all-blank query yields None.
    pub fn normalized(&self) -> Option<IdentifyQuery> {
        match self {
            IdentifyQuery::Details { name, email, phone } => {
                let name = non_blank(name.as_deref());
                let email = non_blank(email.as_deref());
                let phone = non_blank(phone.as_deref());
                if name.is_none() && email.is_none() && phone.is_none() {
                    return None;
                }
                Some(IdentifyQuery::Details { name, email, phone })
            }
            IdentifyQuery::Code(code) => {
                let code = normalize_code(code);
                (!code.is_empty()).then_some(IdentifyQuery::Code(code))
            }
        }
    }
}

// Personal codes are case-insensitive on the backend.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

// Result of an identification attempt. Only `Identified` creates a session.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentifyOutcome {
    Identified(Guest),
    NotFound { message: String },
    // More than one guest matched; the caller must narrow with email or phone.
    Ambiguous { message: String },
}

// Result of validating a previously saved code at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    NoSavedCode,
    Restored(Guest),
    // Backend no longer knows the code; local session data was cleared.
    Rejected,
    // Backend unreachable; the saved code is kept for the next attempt.
    Unavailable,
}

// Locally persisted identity, readable without network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedIdentity {
    pub personal_code: String,
    pub guest_name: String,
}
