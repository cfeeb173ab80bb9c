use serde::{Deserialize, Deserializer, Serialize};

// Records returned by the engagement endpoints (gallery, guestbook, donations,
// playlist, seating).

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestbookEntry {
    pub id: String,
    pub author_name: String,
    pub message: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSuggestion {
    pub id: String,
    pub guest_name: String,
    pub song_title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub spotify_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub votes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationStats {
    #[serde(deserialize_with = "decimal_amount")]
    pub total_amount: f64,
    pub total_count: u64,
    pub currency: String,
}

// Decimal amounts arrive as JSON strings ("150.00"); plain numbers are accepted too.
fn decimal_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    let amount = match Amount::deserialize(deserializer)? {
        Amount::Number(value) => value,
        Amount::Text(text) => text.trim().parse::<f64>().map_err(serde::de::Error::custom)?,
    };
    if !amount.is_finite() {
        return Err(serde::de::Error::custom("amount must be a finite number"));
    }
    Ok(amount)
}

// Payment intent created for a donation; the payment itself happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub client_secret: String,
    pub payment_intent_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatingSearchResult {
    pub found: bool,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub guest_name: Option<String>,
    pub message: String,
}

// Generic acknowledgement body used by write endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 50 }
    }
}

// Image bytes picked by the guest, ready for multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub uploaded_by: Option<String>,
    pub caption: Option<String>,
}
