use tracing::{info, warn};

use crate::domain::keys;
use crate::domain::ports::{KeyValueStore, PushRegistry, PushTokenProvider};

// Push subscription glue. The token comes from the device SDK; the backend maps
// tokens to per-event topics.
pub struct PushNotifications<R, T, S> {
    pub registry: R,
    pub tokens: T,
    pub store: S,
}

impl<R, T, S> PushNotifications<R, T, S>
where
    R: PushRegistry,
    T: PushTokenProvider,
    S: KeyValueStore,
{
    // Obtains a device token and persists it. None when push is unavailable.
    pub async fn register(&self) -> Option<String> {
        let Some(token) = self.tokens.device_token().await else {
            info!("push notifications unavailable on this device");
            return None;
        };
        if let Err(err) = self.store.set(keys::PUSH_TOKEN, token.clone()).await {
            warn!(error = %err, "could not persist push token");
        }
        Some(token)
    }

    pub async fn stored_token(&self) -> Option<String> {
        self.read(keys::PUSH_TOKEN).await
    }

    #[tracing::instrument(name = "push_subscribe", skip(self))]
    pub async fn subscribe(&self, event_id: &str) -> bool {
        let Some(token) = self.stored_token().await else {
            info!("no push token stored; cannot subscribe");
            return false;
        };

        if let Err(err) = self
            .registry
            .subscribe(event_id, &token, self.tokens.platform())
            .await
        {
            warn!(error = %err, "push subscription failed");
            return false;
        }

        if let Err(err) = self
            .store
            .set(keys::EVENT_SUBSCRIPTION, event_id.to_string())
            .await
        {
            warn!(error = %err, "could not persist push subscription");
        }
        info!("subscribed to event notifications");
        true
    }

    #[tracing::instrument(name = "push_unsubscribe", skip(self))]
    pub async fn unsubscribe(&self, event_id: &str) -> bool {
        let Some(token) = self.stored_token().await else {
            return false;
        };

        if let Err(err) = self.registry.unsubscribe(event_id, &token).await {
            warn!(error = %err, "push unsubscription failed");
            return false;
        }

        if let Err(err) = self.store.remove_many(&[keys::EVENT_SUBSCRIPTION]).await {
            warn!(error = %err, "could not clear push subscription");
        }
        info!("unsubscribed from event notifications");
        true
    }

    pub async fn subscribed_event_id(&self) -> Option<String> {
        self.read(keys::EVENT_SUBSCRIPTION).await
    }

    // Register then subscribe in one step.
    pub async fn initialize(&self, event_id: &str) -> bool {
        if self.register().await.is_none() {
            return false;
        }
        self.subscribe(event_id).await
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, key, "push state read failed");
                None
            }
        }
    }
}
