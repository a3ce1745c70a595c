use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use tokio::time::Duration;

use crate::{
    constants::METADATA_FETCH_TIMEOUT_SECS, error::ProviderError, models::CardMetadata,
};

const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];
const TAG_TRAITS: [&str; 4] = ["tag", "tags", "category", "occasion"];
const JSON_DATA_PREFIX: &str = "data:application/json;base64,";

/// Fetches ERC-721 metadata behind a token URI.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<CardMetadata, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct Erc721Metadata {
    name: Option<String>,
    image: Option<String>,
    #[serde(default)]
    attributes: Vec<MetadataAttribute>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MetadataAttribute {
    trait_type: Option<String>,
    value: serde_json::Value,
}

/// Rewrites `ipfs://` URIs onto an HTTP gateway; other URIs pass through.
pub fn ipfs_to_gateway(uri: &str, gateway: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(rest) => {
            let rest = rest.strip_prefix("ipfs/").unwrap_or(rest);
            format!("{}/ipfs/{}", gateway.trim_end_matches('/'), rest)
        }
        None => uri.to_string(),
    }
}

/// True when the URI already points at an image rather than a JSON document.
pub fn looks_like_image(uri: &str) -> bool {
    let lower = uri.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or("");
    lower.starts_with("data:image/") || IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

pub fn parse_metadata(body: &[u8]) -> Result<CardMetadata, ProviderError> {
    let raw: Erc721Metadata =
        serde_json::from_slice(body).map_err(|e| ProviderError::Schema(e.to_string()))?;

    let mut tags = raw.tags;
    for attribute in raw.attributes {
        let is_tag = attribute
            .trait_type
            .as_deref()
            .map(|t| TAG_TRAITS.contains(&t.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !is_tag {
            continue;
        }
        match attribute.value {
            serde_json::Value::String(s) => tags.push(s),
            serde_json::Value::Array(values) => tags.extend(
                values
                    .into_iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string())),
            ),
            _ => {}
        }
    }
    tags.retain(|t| !t.trim().is_empty());
    tags.dedup();

    Ok(CardMetadata {
        title: raw.name.filter(|n| !n.trim().is_empty()),
        image: raw.image.filter(|i| !i.trim().is_empty()),
        tags,
    })
}

pub struct HttpMetadataSource {
    client: reqwest::Client,
    gateway: String,
}

impl HttpMetadataSource {
    pub fn new(gateway: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(METADATA_FETCH_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client, gateway }
    }
}

#[async_trait]
impl MetadataSource for HttpMetadataSource {
    async fn fetch(&self, uri: &str) -> Result<CardMetadata, ProviderError> {
        if let Some(encoded) = uri.strip_prefix(JSON_DATA_PREFIX) {
            let body = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| ProviderError::Schema(format!("invalid base64 metadata: {e}")))?;
            return parse_metadata(&body);
        }

        let url = ipfs_to_gateway(uri, &self.gateway);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }
        let body = response.bytes().await?;
        parse_metadata(&body)
    }
}
