use async_trait::async_trait;
use ethers::types::Address;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    error::ProviderError,
    services::{identifier::parse_address, recipient_resolver::FarcasterLookup},
};

#[derive(Debug, Deserialize)]
struct UsernameResponse {
    result: UsernameResult,
}

#[derive(Debug, Deserialize)]
struct UsernameResult {
    user: FarcasterUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FarcasterUser {
    pub fid: u64,
    pub custody_address: String,
    #[serde(default)]
    pub verified_addresses: VerifiedAddresses,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifiedAddresses {
    #[serde(default)]
    pub eth_addresses: Vec<String>,
}

impl FarcasterUser {
    /// First verified Ethereum address, else the custody address.
    pub fn preferred_address(&self) -> Option<Address> {
        self.verified_addresses
            .eth_addresses
            .iter()
            .find_map(|a| parse_address(a))
            .or_else(|| parse_address(&self.custody_address))
    }
}

/// Username lookup against a Neynar-compatible API.
#[derive(Clone, Debug)]
pub struct FarcasterClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl FarcasterClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            base_url,
            api_key,
            client: Client::new(),
        }
    }

    pub async fn user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<FarcasterUser>, ProviderError> {
        let url = url::Url::parse_with_params(
            &format!(
                "{}/v1/farcaster/user-by-username",
                self.base_url.trim_end_matches('/')
            ),
            &[("username", username)],
        )
        .map_err(|e| ProviderError::Transport(format!("invalid username API URL: {e}")))?;
        let mut req = self.client.get(url);
        if let Some(key) = &self.api_key {
            req = req.header("api_key", key);
        }

        let resp = req.send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(ProviderError::Status(resp.status().as_u16()));
        }

        let body = resp.bytes().await?;
        let parsed: UsernameResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::Schema(format!("user-by-username: {e}")))?;
        Ok(Some(parsed.result.user))
    }
}

#[async_trait]
impl FarcasterLookup for FarcasterClient {
    async fn address_for_username(
        &self,
        username: &str,
    ) -> Result<Option<Address>, ProviderError> {
        let Some(user) = self.user_by_username(username).await? else {
            return Ok(None);
        };
        let address = user.preferred_address();
        if address.is_none() {
            tracing::debug!("farcaster user fid={} has no usable address", user.fid);
        }
        Ok(address)
    }
}
