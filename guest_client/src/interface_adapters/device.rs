use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::domain::ports::{Clock, PushTokenProvider};

// Wall clock; a clock set before the epoch reads as zero.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

// Stand-in for the platform push SDK: the token is provisioned out of band
// (PUSH_TOKEN) and handed back verbatim.
#[derive(Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl PushTokenProvider for StaticTokenProvider {
    async fn device_token(&self) -> Option<String> {
        self.token.clone()
    }

    fn platform(&self) -> &str {
        std::env::consts::OS
    }
}
