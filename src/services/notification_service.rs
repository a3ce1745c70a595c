use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    constants::{NOTIFICATION_BODY_MAX_CHARS, NOTIFICATION_TITLE_MAX_CHARS},
    error::{AppError, Result},
    models::NotificationDetails,
    services::notification_store::NotificationTokenStore,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendNotificationRequest<'a> {
    notification_id: String,
    title: &'a str,
    body: &'a str,
    target_url: &'a str,
    tokens: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendNotificationResponse {
    result: SendNotificationResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendNotificationResult {
    #[serde(default)]
    successful_tokens: Vec<String>,
    #[serde(default)]
    invalid_tokens: Vec<String>,
    #[serde(default)]
    rate_limited_tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    NoToken,
    RateLimited,
    InvalidToken,
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn notification_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Delivers mini-app notifications to the host client's notification URL.
pub struct NotificationService {
    store: Arc<dyn NotificationTokenStore>,
    client: reqwest::Client,
    app_url: String,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationTokenStore>, app_url: String) -> Self {
        Self {
            store,
            client: reqwest::Client::new(),
            app_url,
        }
    }

    pub fn store(&self) -> &Arc<dyn NotificationTokenStore> {
        &self.store
    }

    /// Looks up the stored token for `fid` and sends through it.
    pub async fn notify_fid(&self, fid: u64, title: &str, body: &str) -> Result<SendOutcome> {
        let Some(details) = self.store.get(fid).await? else {
            return Ok(SendOutcome::NoToken);
        };
        self.send_with_details(fid, &details, title, body).await
    }

    pub async fn send_with_details(
        &self,
        fid: u64,
        details: &NotificationDetails,
        title: &str,
        body: &str,
    ) -> Result<SendOutcome> {
        let request = SendNotificationRequest {
            notification_id: notification_id(),
            title: truncate_chars(title, NOTIFICATION_TITLE_MAX_CHARS),
            body: truncate_chars(body, NOTIFICATION_BODY_MAX_CHARS),
            target_url: &self.app_url,
            tokens: vec![details.token.as_str()],
        };

        let resp = self
            .client
            .post(&details.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Notification delivery failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(AppError::ExternalAPI(format!(
                "Notification endpoint returned {}",
                resp.status()
            )));
        }

        let parsed: SendNotificationResponse = resp
            .json()
            .await
            .map_err(|e| AppError::SchemaMismatch(format!("Notification response: {}", e)))?;
        let result = parsed.result;

        if result.invalid_tokens.iter().any(|t| t == &details.token) {
            tracing::info!("notification token invalid, removing fid={}", fid);
            self.store.delete(fid).await?;
            return Ok(SendOutcome::InvalidToken);
        }
        if result.rate_limited_tokens.iter().any(|t| t == &details.token) {
            tracing::warn!("notification rate limited fid={}", fid);
            return Ok(SendOutcome::RateLimited);
        }
        if !result.successful_tokens.iter().any(|t| t == &details.token) {
            tracing::warn!("notification token not acknowledged fid={}", fid);
        }

        tracing::info!("Notification sent to fid {}: {}", fid, title);
        Ok(SendOutcome::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notification_store::MemoryNotificationStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn service_with_token(server: &MockServer, fid: u64) -> NotificationService {
        let store = Arc::new(MemoryNotificationStore::default());
        store
            .set(
                fid,
                &NotificationDetails {
                    url: format!("{}/notify", server.uri()),
                    token: "tok".into(),
                },
            )
            .await
            .unwrap();
        NotificationService::new(store, "https://app.example".into())
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[tokio::test]
    async fn missing_token_is_reported() {
        let store = Arc::new(MemoryNotificationStore::default());
        let service = NotificationService::new(store, "https://app.example".into());
        assert_eq!(
            service.notify_fid(9, "t", "b").await.unwrap(),
            SendOutcome::NoToken
        );
    }

    #[tokio::test]
    async fn successful_delivery() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"successfulTokens": ["tok"], "invalidTokens": [], "rateLimitedTokens": []}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = service_with_token(&server, 5).await;
        assert_eq!(
            service.notify_fid(5, "You got a card", "Open it").await.unwrap(),
            SendOutcome::Sent
        );
    }

    #[tokio::test]
    async fn invalid_token_is_removed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"successfulTokens": [], "invalidTokens": ["tok"], "rateLimitedTokens": []}
            })))
            .mount(&server)
            .await;

        let service = service_with_token(&server, 5).await;
        assert_eq!(
            service.notify_fid(5, "t", "b").await.unwrap(),
            SendOutcome::InvalidToken
        );
        assert_eq!(service.store().get(5).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rate_limited_token_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"successfulTokens": [], "invalidTokens": [], "rateLimitedTokens": ["tok"]}
            })))
            .mount(&server)
            .await;

        let service = service_with_token(&server, 5).await;
        assert_eq!(
            service.notify_fid(5, "t", "b").await.unwrap(),
            SendOutcome::RateLimited
        );
        assert!(service.store().get(5).await.unwrap().is_some());
    }
}
