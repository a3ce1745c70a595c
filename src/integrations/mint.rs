use reqwest::Client;
use serde_json::Value;
use tokio::time::Duration;

use crate::{
    constants::MINT_REQUEST_TIMEOUT_SECS,
    error::{AppError, Result},
    models::{MintReceipt, MintRequest},
};

const UPSTREAM_ERROR_SNIPPET_CHARS: usize = 200;

/// Client for the backend minting service.
#[derive(Clone, Debug)]
pub struct MintClient {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

fn scalar_as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse-or-reject for the mint service response body.
pub fn parse_mint_receipt(body: &Value) -> Result<MintReceipt> {
    let Some(object) = body.as_object() else {
        return Err(AppError::SchemaMismatch(
            "Mint API response is not a JSON object".to_string(),
        ));
    };
    let transaction_hash = match object.get("transactionHash") {
        Some(Value::String(hash)) if !hash.trim().is_empty() => hash.clone(),
        _ => {
            return Err(AppError::MalformedResponse(
                "Mint API response missing transactionHash".to_string(),
            ))
        }
    };
    Ok(MintReceipt {
        transaction_hash,
        token_id: scalar_as_string(object.get("tokenId")),
        mint_price: scalar_as_string(object.get("mintPrice")),
    })
}

// Error bodies are not guaranteed to be JSON; gateways answer with HTML.
fn upstream_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "unknown error".to_string();
    }
    trimmed.chars().take(UPSTREAM_ERROR_SNIPPET_CHARS).collect()
}

impl MintClient {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(MINT_REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            endpoint,
            api_key,
            client,
        }
    }

    pub async fn mint(&self, request: &MintRequest) -> Result<MintReceipt> {
        let mut req = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::ExternalAPI(format!(
                    "Mint request timed out after {}s",
                    MINT_REQUEST_TIMEOUT_SECS
                ))
            } else {
                AppError::ExternalAPI(format!("Mint request failed: {}", e))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = upstream_error_message(&text);
            tracing::warn!("mint_failed status={} error={}", status, message);
            return Err(AppError::ExternalAPI(format!(
                "Mint API returned {}: {}",
                status, message
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| AppError::SchemaMismatch(format!("Mint API returned non-JSON: {}", e)))?;

        let receipt = parse_mint_receipt(&body)?;
        tracing::info!(
            "card_minted recipient={} tx_hash={} token_id={:?}",
            request.recipient,
            receipt.transaction_hash,
            receipt.token_id
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> MintRequest {
        MintRequest {
            token_uri: "ipfs://card".into(),
            recipient: "0x00000000000000000000000000000000000000a1".into(),
            contract_address: "0x0000000000000000000000000000000000001001".into(),
        }
    }

    #[test]
    fn receipt_accepts_numeric_token_id() {
        let receipt = parse_mint_receipt(&serde_json::json!({
            "transactionHash": "0xabc",
            "tokenId": 12,
            "mintPrice": "0.0001"
        }))
        .unwrap();
        assert_eq!(receipt.token_id.as_deref(), Some("12"));
        assert_eq!(receipt.mint_price.as_deref(), Some("0.0001"));
    }

    #[test]
    fn receipt_without_hash_is_malformed() {
        let err = parse_mint_receipt(&serde_json::json!({"tokenId": "1"})).unwrap_err();
        assert_eq!(err.to_string(), "Mint API response missing transactionHash");
    }

    #[test]
    fn receipt_must_be_object() {
        let err = parse_mint_receipt(&serde_json::json!("0xabc")).unwrap_err();
        assert!(matches!(err, AppError::SchemaMismatch(_)));
    }

    #[tokio::test]
    async fn mint_posts_expected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/mint"))
            .and(header("authorization", "Bearer k"))
            .and(body_json(serde_json::json!({
                "tokenURI": "ipfs://card",
                "recipient": "0x00000000000000000000000000000000000000a1",
                "contractAddress": "0x0000000000000000000000000000000000001001"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transactionHash": "0xfeed",
                "tokenId": "4"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MintClient::new(format!("{}/api/mint", server.uri()), Some("k".into()));
        let receipt = client.mint(&request()).await.unwrap();
        assert_eq!(receipt.transaction_hash, "0xfeed");
        assert_eq!(receipt.token_id.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn mint_reports_missing_transaction_hash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"tokenId": "4"})),
            )
            .mount(&server)
            .await;

        let client = MintClient::new(server.uri(), None);
        let err = client.mint(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
        assert_eq!(err.to_string(), "Mint API response missing transactionHash");
    }

    #[tokio::test]
    async fn mint_surfaces_upstream_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"error": "insufficient funds"})),
            )
            .mount(&server)
            .await;

        let client = MintClient::new(server.uri(), None);
        let err = client.mint(&request()).await.unwrap_err();
        assert!(err.to_string().contains("insufficient funds"));
    }

    #[tokio::test]
    async fn mint_non_json_error_page_is_external_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(502)
                    .set_body_string("<html><body>Bad Gateway</body></html>"),
            )
            .mount(&server)
            .await;

        let client = MintClient::new(server.uri(), None);
        let err = client.mint(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalAPI(_)), "got {err:?}");
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn upstream_error_message_prefers_json_error_field() {
        assert_eq!(upstream_error_message(r#"{"error":"nonce too low"}"#), "nonce too low");
        assert_eq!(upstream_error_message("   "), "unknown error");
        assert_eq!(upstream_error_message("plain failure"), "plain failure");
    }
}
