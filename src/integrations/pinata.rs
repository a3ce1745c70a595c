use reqwest::{multipart, Client};
use serde::Deserialize;

use crate::{
    constants::{MAX_CARD_UPLOAD_BYTES, PNG_SIGNATURE},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PinFileResponse {
    ipfs_hash: String,
}

/// Pins rendered card PNGs to IPFS through Pinata.
#[derive(Clone, Debug)]
pub struct PinataClient {
    api_url: String,
    gateway_url: String,
    jwt: Option<String>,
    client: Client,
}

pub fn validate_png(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(AppError::BadRequest("No file provided".to_string()));
    }
    if bytes.len() > MAX_CARD_UPLOAD_BYTES {
        return Err(AppError::BadRequest(format!(
            "File exceeds {} bytes",
            MAX_CARD_UPLOAD_BYTES
        )));
    }
    if !bytes.starts_with(&PNG_SIGNATURE) {
        return Err(AppError::BadRequest("Only PNG images are accepted".to_string()));
    }
    Ok(())
}

impl PinataClient {
    pub fn new(api_url: String, gateway_url: String, jwt: Option<String>) -> Self {
        Self {
            api_url,
            gateway_url,
            jwt,
            client: Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.jwt.as_deref().map(|j| !j.trim().is_empty()).unwrap_or(false)
    }

    /// Uploads one PNG and returns its gateway URL.
    pub async fn upload_png(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let Some(jwt) = self.jwt.as_deref().filter(|_| self.is_configured()) else {
            return Err(AppError::ExternalAPI("Pinata is not configured".to_string()));
        };
        validate_png(&bytes)?;

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("image/png")
            .map_err(|e| AppError::Internal(format!("Invalid mime type: {}", e)))?;
        let form = multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(format!(
                "{}/pinning/pinFileToIPFS",
                self.api_url.trim_end_matches('/')
            ))
            .bearer_auth(jwt)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("IPFS upload failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(AppError::ExternalAPI(format!(
                "IPFS upload returned {}",
                resp.status()
            )));
        }

        let pinned: PinFileResponse = resp
            .json()
            .await
            .map_err(|e| AppError::SchemaMismatch(format!("pinFileToIPFS: {}", e)))?;
        let url = format!(
            "{}/ipfs/{}",
            self.gateway_url.trim_end_matches('/'),
            pinned.ipfs_hash
        );
        tracing::info!("card_image_pinned cid={} file={}", pinned.ipfs_hash, file_name);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png() -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        bytes
    }

    #[test]
    fn validate_png_checks_signature() {
        assert!(validate_png(&png()).is_ok());
        assert!(validate_png(b"GIF89a").is_err());
        assert!(validate_png(&[]).is_err());
    }

    #[tokio::test]
    async fn upload_returns_gateway_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pinning/pinFileToIPFS"))
            .and(header("authorization", "Bearer jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "IpfsHash": "bafycard",
                "PinSize": 24,
                "Timestamp": "2024-01-01T00:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PinataClient::new(
            server.uri(),
            "https://gw.example/".into(),
            Some("jwt".into()),
        );
        let url = client.upload_png("card.png", png()).await.unwrap();
        assert_eq!(url, "https://gw.example/ipfs/bafycard");
    }

    #[tokio::test]
    async fn upload_requires_configuration() {
        let client = PinataClient::new("http://unused".into(), "http://gw".into(), None);
        assert!(!client.is_configured());
        assert!(client.upload_png("card.png", png()).await.is_err());
    }
}
