use serde::Deserialize;
use std::env;

use crate::constants::{
    DEFAULT_BASENAME_L2_RESOLVER, DEFAULT_FARCASTER_API_URL, DEFAULT_IPFS_GATEWAY_URL,
    DEFAULT_PINATA_API_URL, RESOLVER_CACHE_MAX_ENTRIES, RESOLVER_CACHE_TTL_SECS,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub app_url: String,

    // Redis
    pub redis_url: String,

    // Chains
    pub base_rpc_url: String,
    pub ethereum_rpc_url: String,

    // Contract Addresses
    pub card_contract_address: String,
    pub basename_l2_resolver_address: String,

    // External APIs
    pub basename_api_url: Option<String>,
    pub farcaster_api_url: String,
    pub neynar_api_key: Option<String>,
    pub mint_api_url: String,
    pub mint_api_key: Option<String>,
    pub pinata_api_url: String,
    pub pinata_jwt: Option<String>,
    pub ipfs_gateway_url: String,

    // Resolver cache
    pub resolver_cache_ttl_secs: u64,
    pub resolver_cache_max_entries: usize,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),

            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),

            base_rpc_url: env::var("BASE_RPC_URL")
                .unwrap_or_else(|_| "https://mainnet.base.org".to_string()),
            ethereum_rpc_url: env::var("ETHEREUM_RPC_URL")?,

            card_contract_address: env::var("CARD_CONTRACT_ADDRESS")?,
            basename_l2_resolver_address: env::var("BASENAME_L2_RESOLVER_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BASENAME_L2_RESOLVER.to_string()),

            basename_api_url: env::var("BASENAME_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            farcaster_api_url: env::var("FARCASTER_API_URL")
                .unwrap_or_else(|_| DEFAULT_FARCASTER_API_URL.to_string()),
            neynar_api_key: env::var("NEYNAR_API_KEY").ok(),
            mint_api_url: env::var("MINT_API_URL")?,
            mint_api_key: env::var("MINT_API_KEY").ok(),
            pinata_api_url: env::var("PINATA_API_URL")
                .unwrap_or_else(|_| DEFAULT_PINATA_API_URL.to_string()),
            pinata_jwt: env::var("PINATA_JWT").ok(),
            ipfs_gateway_url: env::var("IPFS_GATEWAY_URL")
                .unwrap_or_else(|_| DEFAULT_IPFS_GATEWAY_URL.to_string()),

            resolver_cache_ttl_secs: env::var("RESOLVER_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(RESOLVER_CACHE_TTL_SECS),
            resolver_cache_max_entries: env::var("RESOLVER_CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(RESOLVER_CACHE_MAX_ENTRIES),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("BASE_RPC_URL", &self.base_rpc_url),
            ("ETHEREUM_RPC_URL", &self.ethereum_rpc_url),
            ("MINT_API_URL", &self.mint_api_url),
            ("FARCASTER_API_URL", &self.farcaster_api_url),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} is empty", name);
            }
            url::Url::parse(value).map_err(|e| anyhow::anyhow!("{} is not a URL: {}", name, e))?;
        }

        if crate::services::identifier::parse_address(&self.card_contract_address).is_none() {
            anyhow::bail!("CARD_CONTRACT_ADDRESS is not a valid address");
        }
        if crate::services::identifier::parse_address(&self.basename_l2_resolver_address).is_none() {
            anyhow::bail!("BASENAME_L2_RESOLVER_ADDRESS is not a valid address");
        }

        if self.neynar_api_key.is_none() {
            tracing::warn!("NEYNAR_API_KEY not set; Farcaster lookups may be rate limited");
        }
        if self.pinata_jwt.is_none() {
            tracing::warn!("PINATA_JWT not set; card uploads are disabled");
        }
        if self.resolver_cache_ttl_secs == 0 {
            tracing::warn!("RESOLVER_CACHE_TTL_SECS is 0; every resolution will hit the network");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        environment: "development".to_string(),
        app_url: "http://localhost:3000".to_string(),
        redis_url: "redis://localhost:6379".to_string(),
        base_rpc_url: "http://localhost:8545".to_string(),
        ethereum_rpc_url: "http://localhost:8546".to_string(),
        card_contract_address: "0x0000000000000000000000000000000000001001".to_string(),
        basename_l2_resolver_address: DEFAULT_BASENAME_L2_RESOLVER.to_string(),
        basename_api_url: None,
        farcaster_api_url: DEFAULT_FARCASTER_API_URL.to_string(),
        neynar_api_key: None,
        mint_api_url: "http://localhost:4000/api/mint".to_string(),
        mint_api_key: None,
        pinata_api_url: DEFAULT_PINATA_API_URL.to_string(),
        pinata_jwt: None,
        ipfs_gateway_url: DEFAULT_IPFS_GATEWAY_URL.to_string(),
        resolver_cache_ttl_secs: RESOLVER_CACHE_TTL_SECS,
        resolver_cache_max_entries: RESOLVER_CACHE_MAX_ENTRIES,
        cors_allowed_origins: "*".to_string(),
    }
}
