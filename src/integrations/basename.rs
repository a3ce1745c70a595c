use async_trait::async_trait;
use ethers::types::Address;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    error::ProviderError,
    services::{
        identifier::{basename_label, parse_address},
        recipient_resolver::BasenameLookup,
    },
};

#[derive(Debug, Serialize)]
struct ResolveBasenameRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolveBasenameResponse {
    success: bool,
    address: Option<String>,
    #[serde(default)]
    resolved_from: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Fallback basename resolution through an HTTP resolver service
/// (`POST /api/resolve-basename`).
#[derive(Clone, Debug)]
pub struct BasenameApiClient {
    base_url: String,
    client: Client,
}

impl BasenameApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl BasenameLookup for BasenameApiClient {
    fn source(&self) -> &'static str {
        "basename_api"
    }

    async fn resolve_basename(&self, name: &str) -> Result<Option<Address>, ProviderError> {
        let label = basename_label(name);
        let resp = self
            .client
            .post(format!(
                "{}/api/resolve-basename",
                self.base_url.trim_end_matches('/')
            ))
            .json(&ResolveBasenameRequest { name: label })
            .send()
            .await?;

        // Misses come back as 404 / 422 with a JSON body; parse those too.
        let status = resp.status();
        let body = resp.bytes().await?;
        let parsed: ResolveBasenameResponse = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => return Err(ProviderError::Status(status.as_u16())),
            Err(e) => return Err(ProviderError::Schema(format!("resolve-basename: {e}"))),
        };

        if !parsed.success {
            tracing::debug!(
                "basename api miss name={} error={:?}",
                name,
                parsed.error
            );
            return Ok(None);
        }
        let Some(raw) = parsed.address else {
            return Err(ProviderError::Schema(
                "resolve-basename: success without address".to_string(),
            ));
        };
        let address = parse_address(&raw).ok_or_else(|| {
            ProviderError::Schema(format!("resolve-basename: invalid address {raw}"))
        })?;
        tracing::debug!(
            "basename api resolved name={} via={:?}",
            name,
            parsed.resolved_from
        );
        Ok(Some(address))
    }
}
