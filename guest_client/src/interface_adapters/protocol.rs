use serde::{Deserialize, Serialize};

use crate::domain::ports::IdentifyMatch;

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentifyRequest {
    // Blank fields are omitted rather than sent empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentifyResponse {
    pub found: bool,
    #[serde(default)]
    pub personal_code: Option<String>,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub multiple_matches: bool,
    #[serde(default)]
    pub message: String,
}

impl From<IdentifyResponse> for IdentifyMatch {
    fn from(res: IdentifyResponse) -> Self {
        IdentifyMatch {
            found: res.found,
            personal_code: res.personal_code,
            guest_name: res.guest_name,
            multiple_matches: res.multiple_matches,
            message: res.message,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

// FastAPI error body. `detail` is a string for HTTPException and a list of
// field errors for request validation failures.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: serde_json::Value,
}

impl ErrorResponse {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}
