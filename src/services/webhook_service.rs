use std::sync::Arc;

use crate::{
    error::Result,
    models::{WebhookEvent, WebhookPayload},
    services::notification_service::NotificationService,
};

const WELCOME_TITLE: &str = "Welcome to Cardcast";
const WELCOME_BODY: &str = "Send a greeting card to a friend onchain.";
const ENABLED_TITLE: &str = "Notifications enabled";
const ENABLED_BODY: &str = "We'll let you know when a card arrives.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAction {
    TokenStored,
    TokenRemoved,
}

fn event_name(event: &WebhookEvent) -> &'static str {
    match event {
        WebhookEvent::MiniappAdded { .. } => "miniapp_added",
        WebhookEvent::MiniappRemoved => "miniapp_removed",
        WebhookEvent::NotificationsEnabled { .. } => "notifications_enabled",
        WebhookEvent::NotificationsDisabled => "notifications_disabled",
    }
}

/// Webhook Service - applies mini-app lifecycle events to the token store
pub struct WebhookService {
    notifications: Arc<NotificationService>,
}

impl WebhookService {
    pub fn new(notifications: Arc<NotificationService>) -> Self {
        Self { notifications }
    }

    pub async fn handle(&self, payload: WebhookPayload) -> Result<WebhookAction> {
        let fid = payload.fid;
        tracing::info!("Webhook event {} for fid {}", event_name(&payload.event), fid);
        let store = self.notifications.store();

        match payload.event {
            WebhookEvent::MiniappAdded {
                notification_details: Some(details),
            } => {
                store.set(fid, &details).await?;
                self.greet(fid, &details, WELCOME_TITLE, WELCOME_BODY).await;
                Ok(WebhookAction::TokenStored)
            }
            WebhookEvent::NotificationsEnabled {
                notification_details: details,
            } => {
                store.set(fid, &details).await?;
                self.greet(fid, &details, ENABLED_TITLE, ENABLED_BODY).await;
                Ok(WebhookAction::TokenStored)
            }
            WebhookEvent::MiniappAdded {
                notification_details: None,
            }
            | WebhookEvent::MiniappRemoved
            | WebhookEvent::NotificationsDisabled => {
                store.delete(fid).await?;
                Ok(WebhookAction::TokenRemoved)
            }
        }
    }

    // Delivery failure must not fail the webhook; the token is already stored.
    async fn greet(
        &self,
        fid: u64,
        details: &crate::models::NotificationDetails,
        title: &str,
        body: &str,
    ) {
        if let Err(err) = self
            .notifications
            .send_with_details(fid, details, title, body)
            .await
        {
            tracing::warn!("welcome notification failed fid={}: {}", fid, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationDetails;
    use crate::services::notification_store::{MemoryNotificationStore, NotificationTokenStore};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload(json: serde_json::Value) -> WebhookPayload {
        serde_json::from_value(json).unwrap()
    }

    fn service(store: Arc<MemoryNotificationStore>) -> WebhookService {
        WebhookService::new(Arc::new(NotificationService::new(
            store,
            "https://app.example".into(),
        )))
    }

    #[tokio::test]
    async fn added_with_details_stores_token_and_greets() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"successfulTokens": ["tok"]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryNotificationStore::default());
        let action = service(store.clone())
            .handle(payload(serde_json::json!({
                "fid": 11,
                "event": "miniapp_added",
                "notificationDetails": {"url": format!("{}/notify", server.uri()), "token": "tok"}
            })))
            .await
            .unwrap();

        assert_eq!(action, WebhookAction::TokenStored);
        assert_eq!(store.get(11).await.unwrap().unwrap().token, "tok");
    }

    #[tokio::test]
    async fn greeting_failure_still_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryNotificationStore::default());
        let action = service(store.clone())
            .handle(payload(serde_json::json!({
                "fid": 12,
                "event": "notifications_enabled",
                "notificationDetails": {"url": server.uri(), "token": "tok"}
            })))
            .await
            .unwrap();

        assert_eq!(action, WebhookAction::TokenStored);
        assert!(store.get(12).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn removal_events_delete_token() {
        for event in ["miniapp_removed", "notifications_disabled", "miniapp_added"] {
            let store = Arc::new(MemoryNotificationStore::default());
            store
                .set(
                    3,
                    &NotificationDetails {
                        url: "https://n.example".into(),
                        token: "old".into(),
                    },
                )
                .await
                .unwrap();

            let action = service(store.clone())
                .handle(payload(serde_json::json!({"fid": 3, "event": event})))
                .await
                .unwrap();

            assert_eq!(action, WebhookAction::TokenRemoved, "event {event}");
            assert!(store.get(3).await.unwrap().is_none());
        }
    }
}
